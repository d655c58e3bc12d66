//! Fuzz target for raw transaction decoding.
//!
//! Arbitrary bytes fed to the factory. We're looking for:
//! - Panics (unwraps, out-of-bounds, arithmetic overflow)
//! - Excessive memory allocation on hostile length prefixes

#![no_main]

use libfuzzer_sys::fuzz_target;

use alloy_primitives::U256;
use evolve_tx_eth::{TransactionFactory, TxOptions, TypedTransaction};

fuzz_target!(|data: &[u8]| {
    // Errors are fine, panics are not
    let factory = TransactionFactory::permissive();
    if let Ok(tx) = factory.from_serialized(data, TxOptions::default()) {
        // If decode succeeds, all accessors must not panic
        let _ = tx.hash();
        let _ = tx.sender_address();
        let _ = tx.signing_hash();
        let _ = tx.data_fee();
        let _ = tx.intrinsic_gas();
        let _ = tx.upfront_cost(U256::from(7));
        let _ = tx.effective_priority_fee(U256::from(7));
        let _ = tx.validation_errors();
        let _ = tx.to_json();
        if let Some(priority) = tx.as_priority() {
            let _ = priority.sender_and_priority_public_keys();
        }
    }
});
