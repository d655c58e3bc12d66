//! Core traits for typed transactions.

use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, B256, B512, U256};

use crate::access_list::AccessList;
use crate::base::{descriptor, encode_typed, validate_low_s, Capability, TxCore};
use crate::common::Common;
use crate::data::{TxData, TxOptions, TxType};
use crate::error::{TxError, TxErrorKind, TxResult};
use crate::ethereum::recovery::{ecrecover, public_key_to_address};
use crate::json::JsonTx;
use crate::rlp::RlpItem;

/// Read-only interface shared by every transaction variant.
///
/// Implementors supply their field layout and fee model; hashing, data fee,
/// intrinsic gas and sender recovery are derived from those.
pub trait TypedTransaction: Send + Sync {
    /// EIP-2718 type byte; 0 for legacy.
    fn tx_type(&self) -> u8;

    fn core(&self) -> &TxCore;

    /// Chain id the signature commits to, if any.
    fn chain_id(&self) -> Option<u64>;

    fn access_list(&self) -> Option<&AccessList> {
        None
    }

    /// Fields covered by the signature, in wire order.
    fn unsigned_raw_values(&self) -> Vec<RlpItem>;

    /// All fields in wire order, signature included when present.
    fn raw_values(&self) -> Vec<RlpItem>;

    /// Maximum amount the sender pays at `base_fee`: gas times effective gas
    /// price, plus value.
    fn upfront_cost(&self, base_fee: U256) -> U256;

    /// Tip per gas paid to the block producer at `base_fee`.
    fn effective_priority_fee(&self, base_fee: U256) -> TxResult<U256>;

    fn to_tx_data(&self) -> TxData;

    fn supports(&self, capability: Capability) -> bool;

    fn is_signed(&self) -> bool {
        self.core().signature().is_some()
    }

    /// Recovery parity (0 or 1) of the primary signature.
    fn signature_parity(&self) -> Option<u8> {
        self.core().v().and_then(|v| u8::try_from(v).ok())
    }

    /// Wire bytes: type byte followed by the encoded raw values.
    fn serialize(&self) -> Vec<u8> {
        encode_typed(self.tx_type(), &self.raw_values())
    }

    /// Bytes the signature commits to, before hashing.
    fn signing_message(&self) -> Vec<u8> {
        encode_typed(self.tx_type(), &self.unsigned_raw_values())
    }

    fn signing_hash(&self) -> B256 {
        keccak256(self.signing_message())
    }

    /// The digest to sign, or the unhashed message for devices that hash
    /// internally.
    fn message_to_sign(&self, hashed: bool) -> Bytes {
        if hashed {
            Bytes::copy_from_slice(self.signing_hash().as_slice())
        } else {
            Bytes::from(self.signing_message())
        }
    }

    /// Keccak of the signed wire bytes. Cached while frozen.
    fn hash(&self) -> TxResult<B256> {
        if !self.is_signed() {
            return Err(self.error(TxErrorKind::NotSigned));
        }
        Ok(self.core().cached_hash(|| keccak256(self.serialize())))
    }

    /// Calldata cost plus access-list charge. Cached while frozen.
    fn data_fee(&self) -> U256 {
        let core = self.core();
        core.cached_data_fee(|| core.compute_data_fee(self.access_list()))
    }

    /// Minimum gas the transaction must provide.
    fn intrinsic_gas(&self) -> U256 {
        self.core().compute_intrinsic_gas(self.data_fee())
    }

    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.is_signed() && !self.verify_signature() {
            errors.push("invalid signature".to_string());
        }
        let intrinsic = self.intrinsic_gas();
        if intrinsic > self.gas_limit() {
            errors.push(format!(
                "gasLimit is too low. given {}, need at least {intrinsic}",
                self.gas_limit()
            ));
        }
        errors
    }

    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Uncompressed public key (without the 0x04 prefix) of the primary signer.
    fn sender_public_key(&self) -> TxResult<B512> {
        if !self.is_signed() {
            return Err(self.error(TxErrorKind::NotSigned));
        }
        let (_, r, s) = self
            .core()
            .signature()
            .ok_or_else(|| self.error(TxErrorKind::NotSigned))?;
        let parity = self
            .signature_parity()
            .ok_or_else(|| self.error(TxErrorKind::InvalidSignature))?;
        validate_low_s(self.common(), "s", s).map_err(|kind| self.error(kind))?;
        ecrecover(&self.signing_hash(), u64::from(parity) + 27, r, s)
            .map_err(|kind| self.error(kind))
    }

    fn sender_address(&self) -> TxResult<Address> {
        self.sender_public_key()
            .map(|public_key| public_key_to_address(&public_key))
    }

    fn verify_signature(&self) -> bool {
        self.sender_public_key().is_ok()
    }

    /// True when the transaction creates a contract.
    fn to_creation_address(&self) -> bool {
        self.to().is_none()
    }

    fn to_json(&self) -> JsonTx {
        JsonTx::from(&self.to_tx_data())
    }

    fn descriptor(&self) -> String {
        descriptor(self.tx_type(), self.nonce(), self.to())
    }

    /// Annotate `kind` with this transaction's descriptor.
    fn error(&self, kind: TxErrorKind) -> TxError {
        TxError::new(kind).with_descriptor(self.descriptor())
    }

    fn common(&self) -> &Arc<Common> {
        self.core().common()
    }

    fn is_frozen(&self) -> bool {
        self.core().is_frozen()
    }

    fn nonce(&self) -> U256 {
        self.core().nonce()
    }

    fn gas_limit(&self) -> U256 {
        self.core().gas_limit()
    }

    /// `None` for contract creation.
    fn to(&self) -> Option<Address> {
        self.core().to()
    }

    fn value(&self) -> U256 {
        self.core().value()
    }

    fn input(&self) -> &[u8] {
        self.core().data()
    }
}

/// Construction and copy-on-write operations of a concrete variant.
pub trait BuildTransaction: TypedTransaction + Clone + Sized {
    const TX_TYPE: TxType;

    fn core_mut(&mut self) -> &mut TxCore;

    /// Validate `data` and build an instance. Fails atomically.
    fn from_tx_data(data: TxData, opts: TxOptions) -> TxResult<Self>;

    /// Build from decoded raw values in wire order.
    fn from_raw_values(values: &[RlpItem], opts: TxOptions) -> TxResult<Self>;

    /// Build from wire bytes.
    fn from_serialized(serialized: &[u8], opts: TxOptions) -> TxResult<Self>;

    /// Rebuild from modified field data with full validation. Rejected while
    /// frozen.
    fn update(&self, f: impl FnOnce(&mut TxData)) -> TxResult<Self> {
        if self.is_frozen() {
            return Err(self.error(TxErrorKind::Frozen));
        }
        let mut data = self.to_tx_data();
        f(&mut data);
        Self::from_tx_data(data, self.core().options())
    }

    /// Copy bound to another registry, revalidated against it.
    fn with_common(&self, common: Arc<Common>) -> TxResult<Self> {
        let opts = TxOptions {
            common: Some(common.clone()),
            ..self.core().options()
        };
        Self::from_tx_data(self.to_tx_data(), opts)?;
        let mut copy = self.clone();
        copy.core_mut().rebind(common);
        Ok(copy)
    }

    fn freeze(mut self) -> Self {
        self.core_mut().set_frozen(true);
        self
    }
}

/// Error for failures before any field is known.
pub(crate) fn type_error(tx_type: TxType, kind: TxErrorKind) -> TxError {
    TxError::new(kind).with_descriptor(format!("type={}", tx_type.marker()))
}
