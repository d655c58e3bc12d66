//! Ethereum-compatible typed transaction codec, validation and signing.
//!
//! This crate converts transactions between structured field data, raw RLP
//! values and signed wire bytes, enforcing the numeric, structural and
//! upgrade-activation rules of the chain configuration they are bound to.
//!
//! # Transaction Types
//!
//! - **Legacy (0x00)**: Pre-EIP-2718 transactions, optionally with EIP-155 replay protection
//! - **EIP-2930 (0x01)**: Access list transactions with a single gas price
//! - **EIP-1559 (0x02)**: Fee market transactions with base fee and priority fee
//! - **Priority (0x40)**: Fee market transactions carrying a second signature
//!
//! # Usage
//!
//! ```text
//! use evolve_tx_eth::{Common, TransactionFactory, TxOptions, TypedTransaction};
//!
//! let opts = TxOptions::with_common(Common::from_names("sepolia", "london")?);
//! let tx = TransactionFactory::default().from_serialized(raw_tx, opts)?;
//! let sender = tx.sender_address()?;
//! ```
//!
//! # Architecture
//!
//! 1. [`Common`] - Chain and hardfork registry answering "is EIP x active"
//! 2. [`TypedTransaction`] - Read interface every transaction type implements
//! 3. [`TxEnvelope`] - Enum holding any supported transaction type
//! 4. [`TransactionFactory`] - Builds envelopes from field data, raw values or bytes

pub mod access_list;
pub mod base;
pub mod common;
pub mod data;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod ethereum;
pub mod json;
pub mod primitives;
pub mod rlp;
pub mod traits;

pub use access_list::{AccessList, AccessListItem};
pub use base::Capability;
pub use common::{Chain, ChainConfig, Common, CommonError, ConfigError, GasParams, Hardfork};
pub use data::{TxData, TxOptions, TxType};
pub use decoder::TransactionFactory;
pub use envelope::{tx_type, TxEnvelope};
pub use error::*;
pub use ethereum::{Eip1559Tx, Eip2930Tx, LegacyTx, PriorityTx, ReplayProtection};
pub use json::{JsonAccessListItem, JsonTx};
pub use traits::{BuildTransaction, TypedTransaction};
