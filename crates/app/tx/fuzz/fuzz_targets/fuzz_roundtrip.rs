//! Fuzz target for decode/re-encode consistency.
//!
//! If we can decode a transaction, its serialized form must be the input
//! and decoding that again must produce identical results.

#![no_main]

use libfuzzer_sys::fuzz_target;

use evolve_tx_eth::{TransactionFactory, TxData, TxOptions, TypedTransaction};

fuzz_target!(|data: &[u8]| {
    let factory = TransactionFactory::permissive();
    let Ok(tx1) = factory.from_serialized(data, TxOptions::default()) else {
        return;
    };

    // Canonical decoding means the encoding is unique
    let encoded = tx1.serialize();
    assert_eq!(encoded, data, "re-encoding differs from input");

    let Ok(tx2) = factory.from_serialized(&encoded, TxOptions::default()) else {
        panic!("Failed to decode re-encoded transaction");
    };
    assert_eq!(tx1.raw_values(), tx2.raw_values(), "raw values mismatch");
    assert_eq!(tx1.hash().ok(), tx2.hash().ok(), "hash mismatch");

    // The JSON projection parses back to the same field data
    let json = tx1.to_json();
    let parsed = TxData::try_from(&json).expect("json projection must parse");
    assert_eq!(parsed, tx1.to_tx_data(), "json mismatch");
});
