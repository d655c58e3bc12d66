//! Transaction error types.

use std::fmt;

use alloy_primitives::U256;
use thiserror::Error;

use crate::common::CommonError;
use crate::rlp::RlpError;

/// What went wrong, independent of which transaction it happened to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxErrorKind {
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] RlpError),

    #[error("wrong transaction type: expected {expected:#04x}, found {found:#04x}")]
    WrongTransactionType { expected: u8, found: u8 },

    #[error("unsupported transaction type {0:#04x}")]
    UnsupportedTransactionType(u8),

    #[error("invalid number of fields: expected {unsigned} (unsigned) or {signed} (signed), found {found}")]
    WrongFieldCount {
        unsigned: usize,
        signed: usize,
        found: usize,
    },

    /// Integer given as bytes with a leading zero, or unparsable text.
    #[error("invalid encoding of field {0}")]
    InvalidFieldEncoding(String),

    /// A list where a byte string was expected, or the reverse.
    #[error("invalid shape of field {0}")]
    InvalidFieldShape(String),

    #[error("field {field} must be {expected} bytes, found {found}")]
    InvalidFieldLength {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("integer overflow in {0}: value exceeds 2^256 - 1")]
    IntegerOverflow(String),

    #[error("maxFeePerGas {max_fee} is below maxPriorityFeePerGas {max_priority_fee}")]
    FeeOrderingViolation { max_fee: U256, max_priority_fee: U256 },

    #[error("base fee {base_fee} exceeds fee cap {fee_cap}")]
    FeeCapTooLow { fee_cap: U256, base_fee: U256 },

    #[error("invalid signature parity {field}={value}")]
    InvalidSignatureParity { field: &'static str, value: U256 },

    #[error("{0} is above half the curve order")]
    HighSSignature(&'static str),

    #[error("private key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("private key is not a valid secp256k1 scalar")]
    InvalidPrivateKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("transaction is not signed")]
    NotSigned,

    /// A dual-signature transaction carrying only one of its signature sets.
    #[error("signature set ({0}) missing")]
    MissingSignatureSet(&'static str),

    #[error("EIP-{0} is not activated")]
    UnsupportedUpgrade(u32),

    #[error("chain id mismatch: registry has {expected}, transaction has {found}")]
    ChainIdMismatch { expected: u64, found: U256 },

    #[error("initcode size {size} exceeds limit {limit}")]
    InitCodeSizeExceeded { size: usize, limit: usize },

    #[error("transaction is frozen")]
    Frozen,

    #[error(transparent)]
    Common(#[from] CommonError),
}

/// An error kind annotated with a compact description of the transaction it
/// concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxError {
    kind: TxErrorKind,
    descriptor: Option<String>,
}

impl TxError {
    pub fn new(kind: TxErrorKind) -> Self {
        Self {
            kind,
            descriptor: None,
        }
    }

    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }

    pub fn kind(&self) -> &TxErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> TxErrorKind {
        self.kind
    }

    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.descriptor {
            Some(descriptor) => write!(f, "{} ({descriptor})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for TxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<TxErrorKind> for TxError {
    fn from(kind: TxErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<RlpError> for TxError {
    fn from(err: RlpError) -> Self {
        Self::new(TxErrorKind::MalformedEncoding(err))
    }
}

impl From<CommonError> for TxError {
    fn from(err: CommonError) -> Self {
        Self::new(TxErrorKind::Common(err))
    }
}

pub type TxResult<T> = Result<T, TxError>;
