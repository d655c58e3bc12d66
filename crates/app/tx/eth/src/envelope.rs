//! Transaction envelope over every supported EIP-2718 type.

use std::sync::Arc;

use alloy_primitives::U256;

use crate::access_list::AccessList;
use crate::base::{Capability, TxCore};
use crate::common::Common;
use crate::data::{TxData, TxOptions, TxType};
use crate::decoder::TransactionFactory;
use crate::error::{TxErrorKind, TxResult};
use crate::ethereum::{Eip1559Tx, Eip2930Tx, LegacyTx, PriorityTx};
use crate::rlp::RlpItem;
use crate::traits::{BuildTransaction, TypedTransaction};

/// Transaction type constants per EIP-2718.
pub mod tx_type {
    /// Legacy transaction (pre-EIP-2718), never written as a prefix.
    pub const LEGACY: u8 = 0x00;
    /// EIP-2930 access list transaction.
    pub const EIP2930: u8 = 0x01;
    /// EIP-1559 fee market transaction.
    pub const EIP1559: u8 = 0x02;
    /// Dual-signature priority transaction.
    pub const PRIORITY: u8 = 0x40;
}

/// Any supported transaction.
#[derive(Clone, Debug)]
pub enum TxEnvelope {
    Legacy(LegacyTx),
    Eip2930(Eip2930Tx),
    Eip1559(Eip1559Tx),
    Priority(PriorityTx),
}

impl TxEnvelope {
    /// Decode wire bytes of any supported type.
    pub fn decode(bytes: &[u8], opts: TxOptions) -> TxResult<Self> {
        TransactionFactory::permissive().from_serialized(bytes, opts)
    }

    pub fn from_tx_data(data: TxData, opts: TxOptions) -> TxResult<Self> {
        TransactionFactory::permissive().from_tx_data(data, opts)
    }

    pub fn kind(&self) -> TxType {
        match self {
            TxEnvelope::Legacy(_) => TxType::Legacy,
            TxEnvelope::Eip2930(_) => TxType::AccessList,
            TxEnvelope::Eip1559(_) => TxType::FeeMarket,
            TxEnvelope::Priority(_) => TxType::Priority,
        }
    }

    pub fn as_dyn(&self) -> &dyn TypedTransaction {
        match self {
            TxEnvelope::Legacy(tx) => tx,
            TxEnvelope::Eip2930(tx) => tx,
            TxEnvelope::Eip1559(tx) => tx,
            TxEnvelope::Priority(tx) => tx,
        }
    }

    pub fn as_priority(&self) -> Option<&PriorityTx> {
        match self {
            TxEnvelope::Priority(tx) => Some(tx),
            _ => None,
        }
    }

    /// Sign with `private_key`. A priority transaction also needs
    /// `priority_key`; other types ignore it.
    pub fn sign(&self, private_key: &[u8], priority_key: Option<&[u8]>) -> TxResult<Self> {
        if priority_key.is_some() && !matches!(self, TxEnvelope::Priority(_)) {
            tracing::debug!(
                tx_type = self.tx_type(),
                "ignoring priority key for single-signature transaction"
            );
        }
        Ok(match self {
            TxEnvelope::Legacy(tx) => tx.sign(private_key)?.into(),
            TxEnvelope::Eip2930(tx) => tx.sign(private_key)?.into(),
            TxEnvelope::Eip1559(tx) => tx.sign(private_key)?.into(),
            TxEnvelope::Priority(tx) => {
                let priority_key =
                    priority_key.ok_or_else(|| tx.error(TxErrorKind::InvalidKeyLength(0)))?;
                tx.sign(private_key, priority_key)?.into()
            }
        })
    }

    /// See [`BuildTransaction::update`].
    pub fn update(&self, f: impl FnOnce(&mut TxData)) -> TxResult<Self> {
        Ok(match self {
            TxEnvelope::Legacy(tx) => tx.update(f)?.into(),
            TxEnvelope::Eip2930(tx) => tx.update(f)?.into(),
            TxEnvelope::Eip1559(tx) => tx.update(f)?.into(),
            TxEnvelope::Priority(tx) => tx.update(f)?.into(),
        })
    }

    /// See [`BuildTransaction::with_common`].
    pub fn with_common(&self, common: Arc<Common>) -> TxResult<Self> {
        Ok(match self {
            TxEnvelope::Legacy(tx) => tx.with_common(common)?.into(),
            TxEnvelope::Eip2930(tx) => tx.with_common(common)?.into(),
            TxEnvelope::Eip1559(tx) => tx.with_common(common)?.into(),
            TxEnvelope::Priority(tx) => tx.with_common(common)?.into(),
        })
    }

    pub fn freeze(self) -> Self {
        match self {
            TxEnvelope::Legacy(tx) => tx.freeze().into(),
            TxEnvelope::Eip2930(tx) => tx.freeze().into(),
            TxEnvelope::Eip1559(tx) => tx.freeze().into(),
            TxEnvelope::Priority(tx) => tx.freeze().into(),
        }
    }
}

impl From<LegacyTx> for TxEnvelope {
    fn from(tx: LegacyTx) -> Self {
        TxEnvelope::Legacy(tx)
    }
}

impl From<Eip2930Tx> for TxEnvelope {
    fn from(tx: Eip2930Tx) -> Self {
        TxEnvelope::Eip2930(tx)
    }
}

impl From<Eip1559Tx> for TxEnvelope {
    fn from(tx: Eip1559Tx) -> Self {
        TxEnvelope::Eip1559(tx)
    }
}

impl From<PriorityTx> for TxEnvelope {
    fn from(tx: PriorityTx) -> Self {
        TxEnvelope::Priority(tx)
    }
}

// Provided methods that a variant overrides are forwarded as well, otherwise
// the envelope would fall back to the typed defaults.
impl TypedTransaction for TxEnvelope {
    fn tx_type(&self) -> u8 {
        self.kind().marker()
    }

    fn core(&self) -> &TxCore {
        self.as_dyn().core()
    }

    fn chain_id(&self) -> Option<u64> {
        self.as_dyn().chain_id()
    }

    fn access_list(&self) -> Option<&AccessList> {
        self.as_dyn().access_list()
    }

    fn unsigned_raw_values(&self) -> Vec<RlpItem> {
        self.as_dyn().unsigned_raw_values()
    }

    fn raw_values(&self) -> Vec<RlpItem> {
        self.as_dyn().raw_values()
    }

    fn upfront_cost(&self, base_fee: U256) -> U256 {
        self.as_dyn().upfront_cost(base_fee)
    }

    fn effective_priority_fee(&self, base_fee: U256) -> TxResult<U256> {
        self.as_dyn().effective_priority_fee(base_fee)
    }

    fn to_tx_data(&self) -> TxData {
        self.as_dyn().to_tx_data()
    }

    fn supports(&self, capability: Capability) -> bool {
        self.as_dyn().supports(capability)
    }

    fn is_signed(&self) -> bool {
        self.as_dyn().is_signed()
    }

    fn signature_parity(&self) -> Option<u8> {
        self.as_dyn().signature_parity()
    }

    fn serialize(&self) -> Vec<u8> {
        self.as_dyn().serialize()
    }

    fn signing_message(&self) -> Vec<u8> {
        self.as_dyn().signing_message()
    }
}
