//! Structured field data and construction options.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};

use crate::access_list::AccessList;
use crate::common::Common;
use crate::envelope::tx_type;

/// Transaction variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TxType {
    #[default]
    Legacy,
    AccessList,
    FeeMarket,
    Priority,
}

impl TxType {
    pub const ALL: [TxType; 4] = [
        TxType::Legacy,
        TxType::AccessList,
        TxType::FeeMarket,
        TxType::Priority,
    ];

    /// EIP-2718 type byte. Legacy is 0 but is never written as a prefix.
    pub const fn marker(self) -> u8 {
        match self {
            TxType::Legacy => tx_type::LEGACY,
            TxType::AccessList => tx_type::EIP2930,
            TxType::FeeMarket => tx_type::EIP1559,
            TxType::Priority => tx_type::PRIORITY,
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.marker() == marker)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

/// Every field any variant understands. Fields a variant does not use are
/// ignored by that variant; absent numeric fields default to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxData {
    pub tx_type: Option<TxType>,
    pub chain_id: Option<U256>,
    pub nonce: Option<U256>,
    pub gas_price: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub gas_limit: Option<U256>,
    /// `None` creates a contract.
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub data: Option<Bytes>,
    pub access_list: Option<AccessList>,
    pub v: Option<U256>,
    pub r: Option<U256>,
    pub s: Option<U256>,
    /// Second signature of a priority transaction.
    pub priority_v: Option<U256>,
    pub priority_r: Option<U256>,
    pub priority_s: Option<U256>,
}

impl TxData {
    pub fn with_type(mut self, tx_type: TxType) -> Self {
        self.tx_type = Some(tx_type);
        self
    }

    /// Drop every signature component.
    pub fn without_signatures(mut self) -> Self {
        self.v = None;
        self.r = None;
        self.s = None;
        self.priority_v = None;
        self.priority_r = None;
        self.priority_s = None;
        self
    }
}

/// How a transaction is built.
#[derive(Debug, Clone)]
pub struct TxOptions {
    /// Registry to validate against. When absent one is derived from the
    /// transaction's chain id, or mainnet at the default fork.
    pub common: Option<Arc<Common>>,
    /// Reject mutation after construction and cache derived values.
    pub freeze: bool,
    /// Skip the EIP-3860 initcode size limit.
    pub allow_unlimited_init_code_size: bool,
}

impl TxOptions {
    pub fn with_common(common: impl Into<Arc<Common>>) -> Self {
        Self {
            common: Some(common.into()),
            ..Self::default()
        }
    }

    pub fn unfrozen(mut self) -> Self {
        self.freeze = false;
        self
    }

    pub fn allow_unlimited_init_code_size(mut self) -> Self {
        self.allow_unlimited_init_code_size = true;
        self
    }
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            common: None,
            freeze: true,
            allow_unlimited_init_code_size: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Chain, Hardfork};

    #[test]
    fn test_markers() {
        assert_eq!(TxType::Legacy.marker(), 0);
        assert_eq!(TxType::AccessList.marker(), 1);
        assert_eq!(TxType::FeeMarket.marker(), 2);
        assert_eq!(TxType::Priority.marker(), 0x40);
        assert_eq!(TxType::from_marker(0x40), Some(TxType::Priority));
        assert_eq!(TxType::from_marker(0x03), None);
        assert_eq!(TxType::Priority.to_string(), "64");
    }

    #[test]
    fn test_options_defaults() {
        let opts = TxOptions::default();
        assert!(opts.freeze);
        assert!(!opts.allow_unlimited_init_code_size);
        assert!(opts.common.is_none());

        let opts = TxOptions::with_common(Common::new(Chain::Goerli, Hardfork::London)).unfrozen();
        assert!(!opts.freeze);
        assert_eq!(opts.common.map(|c| c.chain_id()), Some(5));
    }

    #[test]
    fn test_without_signatures() {
        let data = TxData {
            v: Some(U256::from(1)),
            r: Some(U256::from(2)),
            priority_s: Some(U256::from(3)),
            nonce: Some(U256::from(9)),
            ..TxData::default()
        }
        .without_signatures();
        assert_eq!(data.v, None);
        assert_eq!(data.priority_s, None);
        assert_eq!(data.nonce, Some(U256::from(9)));
    }
}
