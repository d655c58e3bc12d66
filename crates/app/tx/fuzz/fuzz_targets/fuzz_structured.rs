//! Structured fuzzing with arbitrary transaction field data.
//!
//! Builds transactions from generated fields and runs the full pipeline:
//! construction, signing, encoding, decoding and recovery.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use alloy_primitives::{Address, Bytes, U256};
use evolve_tx_eth::{TransactionFactory, TxData, TxOptions, TxType, TypedTransaction};

#[derive(Debug, Arbitrary)]
struct FuzzTx {
    kind: u8,
    nonce: u64,
    gas_price: u64,
    gas_limit: u64,
    max_fee_per_gas: u64,
    max_priority_fee_per_gas: u64,
    to: Option<[u8; 20]>,
    value: [u8; 32],
    input: Vec<u8>,
    chain_id: Option<u64>,
}

/// Keys are not guaranteed valid; invalid ones must fail cleanly.
#[derive(Debug, Arbitrary)]
struct FuzzKeys {
    primary: [u8; 32],
    secondary: [u8; 32],
}

#[derive(Debug, Arbitrary)]
enum FuzzInput {
    Signed(FuzzTx, FuzzKeys),
    Unsigned(FuzzTx),
    Raw(Vec<u8>),
}

impl FuzzTx {
    fn to_tx_data(&self) -> TxData {
        let ty = TxType::ALL[usize::from(self.kind) % TxType::ALL.len()];
        TxData {
            tx_type: Some(ty),
            chain_id: self.chain_id.map(U256::from),
            nonce: Some(U256::from(self.nonce)),
            gas_price: Some(U256::from(self.gas_price)),
            max_fee_per_gas: Some(U256::from(self.max_fee_per_gas)),
            max_priority_fee_per_gas: Some(U256::from(self.max_priority_fee_per_gas)),
            gas_limit: Some(U256::from(self.gas_limit)),
            to: self.to.map(Address::from),
            value: Some(U256::from_be_bytes(self.value)),
            data: Some(Bytes::from(self.input.clone())),
            ..TxData::default()
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let factory = TransactionFactory::permissive();
    match input {
        FuzzInput::Signed(fields, keys) => {
            let Ok(tx) = factory.from_tx_data(fields.to_tx_data(), TxOptions::default()) else {
                return;
            };
            let Ok(signed) = tx.sign(&keys.primary, Some(&keys.secondary[..])) else {
                return;
            };
            assert!(signed.is_signed());
            let decoded = factory
                .from_serialized(&signed.serialize(), TxOptions::default())
                .expect("signed transaction must decode");
            assert_eq!(decoded.raw_values(), signed.raw_values());
            assert_eq!(
                decoded.sender_address().ok(),
                signed.sender_address().ok(),
                "sender mismatch"
            );
        }
        FuzzInput::Unsigned(fields) => {
            let Ok(tx) = factory.from_tx_data(fields.to_tx_data(), TxOptions::default()) else {
                return;
            };
            assert!(!tx.is_signed());
            assert!(tx.hash().is_err());
            let _ = tx.message_to_sign(false);
            let _ = tx.upfront_cost(U256::ZERO);
        }
        FuzzInput::Raw(bytes) => {
            let _ = factory.from_serialized(&bytes, TxOptions::default());
        }
    }
});
