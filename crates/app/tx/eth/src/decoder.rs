//! Transaction factory: builds any supported variant from field data, raw
//! values, wire bytes or block body items.

use std::collections::BTreeSet;

use crate::data::{TxData, TxOptions, TxType};
use crate::envelope::{tx_type, TxEnvelope};
use crate::error::{TxErrorKind, TxResult};
use crate::ethereum::{Eip1559Tx, Eip2930Tx, LegacyTx, PriorityTx};
use crate::rlp::{RlpError, RlpItem};
use crate::traits::BuildTransaction;

/// First byte at which an RLP list starts; anything below is a type marker.
const RLP_LIST_OFFSET: u8 = 0xc0;

/// Configurable factory for typed transactions.
///
/// Allows restricting which transaction types are accepted, useful for
/// chains that only want to support specific types.
#[derive(Clone, Debug)]
pub struct TransactionFactory {
    allowed_types: BTreeSet<u8>,
}

impl TransactionFactory {
    /// Accept the standard Ethereum types only.
    pub fn ethereum() -> Self {
        Self::with_types([tx_type::LEGACY, tx_type::EIP2930, tx_type::EIP1559])
    }

    /// Accept specific transaction types.
    pub fn with_types(types: impl IntoIterator<Item = u8>) -> Self {
        Self {
            allowed_types: types.into_iter().collect(),
        }
    }

    /// Accept every type this crate implements.
    pub fn permissive() -> Self {
        Self::with_types(TxType::ALL.map(TxType::marker))
    }

    pub fn allow_type(&mut self, tx_type: u8) -> &mut Self {
        self.allowed_types.insert(tx_type);
        self
    }

    pub fn is_allowed(&self, tx_type: u8) -> bool {
        self.allowed_types.contains(&tx_type)
    }

    fn check_allowed(&self, ty: TxType) -> TxResult<()> {
        if self.is_allowed(ty.marker()) {
            Ok(())
        } else {
            Err(TxErrorKind::UnsupportedTransactionType(ty.marker()).into())
        }
    }

    /// Build from field data, dispatching on `data.tx_type` (legacy when
    /// absent).
    pub fn from_tx_data(&self, data: TxData, opts: TxOptions) -> TxResult<TxEnvelope> {
        let ty = data.tx_type.unwrap_or_default();
        self.check_allowed(ty)?;
        Ok(match ty {
            TxType::Legacy => LegacyTx::from_tx_data(data, opts)?.into(),
            TxType::AccessList => Eip2930Tx::from_tx_data(data, opts)?.into(),
            TxType::FeeMarket => Eip1559Tx::from_tx_data(data, opts)?.into(),
            TxType::Priority => PriorityTx::from_tx_data(data, opts)?.into(),
        })
    }

    /// Build from decoded raw values of a known type.
    pub fn from_raw_values(
        &self,
        values: &[RlpItem],
        ty: TxType,
        opts: TxOptions,
    ) -> TxResult<TxEnvelope> {
        self.check_allowed(ty)?;
        let tx: TxEnvelope = match ty {
            TxType::Legacy => LegacyTx::from_raw_values(values, opts)?.into(),
            TxType::AccessList => Eip2930Tx::from_raw_values(values, opts)?.into(),
            TxType::FeeMarket => Eip1559Tx::from_raw_values(values, opts)?.into(),
            TxType::Priority => PriorityTx::from_raw_values(values, opts)?.into(),
        };
        tracing::debug!(tx_type = ty.marker(), fields = values.len(), "decoded transaction");
        Ok(tx)
    }

    /// Build from wire bytes. A leading RLP list is a legacy transaction;
    /// otherwise the first byte is the type marker.
    pub fn from_serialized(&self, serialized: &[u8], opts: TxOptions) -> TxResult<TxEnvelope> {
        let Some(&first) = serialized.first() else {
            return Err(RlpError::Header(alloy_rlp::Error::InputTooShort).into());
        };
        let ty = if first >= RLP_LIST_OFFSET {
            TxType::Legacy
        } else {
            match TxType::from_marker(first) {
                Some(ty) if ty != TxType::Legacy => ty,
                _ => return Err(TxErrorKind::UnsupportedTransactionType(first).into()),
            }
        };
        self.check_allowed(ty)?;

        let tx: TxEnvelope = match ty {
            TxType::Legacy => LegacyTx::from_serialized(serialized, opts)?.into(),
            TxType::AccessList => Eip2930Tx::from_serialized(serialized, opts)?.into(),
            TxType::FeeMarket => Eip1559Tx::from_serialized(serialized, opts)?.into(),
            TxType::Priority => PriorityTx::from_serialized(serialized, opts)?.into(),
        };
        tracing::debug!(
            tx_type = ty.marker(),
            bytes = serialized.len(),
            "decoded transaction"
        );
        Ok(tx)
    }

    /// Build from a transaction item of a block body: a byte string holds a
    /// typed transaction, a list holds legacy raw values.
    pub fn from_block_body_data(&self, item: &RlpItem, opts: TxOptions) -> TxResult<TxEnvelope> {
        match item {
            RlpItem::Bytes(bytes) => self.from_serialized(bytes, opts),
            RlpItem::List(values) => self.from_raw_values(values, TxType::Legacy, opts),
        }
    }
}

impl Default for TransactionFactory {
    fn default() -> Self {
        Self::permissive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::common::{Chain, Common, Hardfork};
    use crate::rlp;
    use crate::traits::TypedTransaction;
    use alloy_primitives::U256;

    fn london() -> TxOptions {
        TxOptions::with_common(Common::new(Chain::Mainnet, Hardfork::London))
    }

    #[test]
    fn test_ethereum_factory_types() {
        let factory = TransactionFactory::ethereum();

        assert!(factory.is_allowed(tx_type::LEGACY));
        assert!(factory.is_allowed(tx_type::EIP2930));
        assert!(factory.is_allowed(tx_type::EIP1559));
        assert!(!factory.is_allowed(tx_type::PRIORITY));
    }

    #[test]
    fn test_custom_types() {
        let factory = TransactionFactory::with_types([tx_type::EIP1559, tx_type::EIP2930]);

        assert!(!factory.is_allowed(tx_type::LEGACY));
        assert!(factory.is_allowed(tx_type::EIP1559));
        assert!(factory.is_allowed(tx_type::EIP2930));
    }

    #[test]
    fn test_allow_type_builder() {
        let mut factory = TransactionFactory::ethereum();
        factory.allow_type(tx_type::PRIORITY);

        assert!(factory.is_allowed(tx_type::PRIORITY));
    }

    #[test]
    fn test_disallowed_type_rejected() {
        let data = TxData::default().with_type(TxType::Priority);
        let err = TransactionFactory::ethereum()
            .from_tx_data(data, london())
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &TxErrorKind::UnsupportedTransactionType(tx_type::PRIORITY)
        );
    }

    #[test]
    fn test_unknown_marker_rejected() {
        let factory = TransactionFactory::permissive();
        for marker in [0x00, 0x03, 0x7f] {
            let mut bytes = vec![marker];
            bytes.extend_from_slice(&rlp::encode_list(&[]));
            let err = factory.from_serialized(&bytes, london()).unwrap_err();
            assert_eq!(err.kind(), &TxErrorKind::UnsupportedTransactionType(marker));
        }
        let err = factory.from_serialized(&[], london()).unwrap_err();
        assert!(matches!(err.kind(), TxErrorKind::MalformedEncoding(_)));
    }

    #[test]
    fn test_block_body_data() {
        let factory = TransactionFactory::default();
        let legacy = factory
            .from_tx_data(
                TxData {
                    nonce: Some(U256::from(5)),
                    ..TxData::default()
                },
                london(),
            )
            .unwrap();
        let item = RlpItem::List(legacy.raw_values());
        let decoded = factory.from_block_body_data(&item, london()).unwrap();
        assert_eq!(decoded.kind(), TxType::Legacy);
        assert_eq!(decoded.nonce(), U256::from(5));

        let typed = factory
            .from_tx_data(TxData::default().with_type(TxType::FeeMarket), london())
            .unwrap()
            .sign(&[0x05; 32], None)
            .unwrap();
        let item = RlpItem::bytes(typed.serialize());
        let decoded = factory.from_block_body_data(&item, london()).unwrap();
        assert_eq!(decoded.kind(), TxType::FeeMarket);
        assert_eq!(decoded.raw_values(), typed.raw_values());
    }
}
