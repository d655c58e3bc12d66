//! Gas parameters that depend on the active upgrades.

use super::hardfork::eip;
use super::Common;

/// Gas prices consulted when computing data fees and intrinsic gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    /// Base cost of every transaction.
    pub tx_gas: u64,
    /// Extra cost of a contract creation (0 before homestead).
    pub tx_creation: u64,
    /// Cost per zero byte of data.
    pub tx_data_zero: u64,
    /// Cost per non-zero byte of data.
    pub tx_data_non_zero: u64,
    pub access_list_address_cost: u64,
    pub access_list_storage_key_cost: u64,
    /// Cost per 32-byte word of initcode (0 without EIP-3860).
    pub init_code_word_cost: u64,
    /// Upper bound on initcode length, if EIP-3860 is active.
    pub max_init_code_size: Option<usize>,
}

impl GasParams {
    pub fn for_common(common: &Common) -> Self {
        let eip3860 = common.is_active(eip::EIP3860);
        Self {
            tx_gas: 21_000,
            tx_creation: if common.is_active(eip::EIP2) { 32_000 } else { 0 },
            tx_data_zero: 4,
            tx_data_non_zero: if common.is_active(eip::EIP2028) { 16 } else { 68 },
            access_list_address_cost: 2_400,
            access_list_storage_key_cost: 1_900,
            init_code_word_cost: if eip3860 { 2 } else { 0 },
            max_init_code_size: eip3860.then_some(49_152),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Chain, Hardfork};

    #[test]
    fn test_calldata_cost_changes_at_istanbul() {
        let petersburg = GasParams::for_common(&Common::new(Chain::Mainnet, Hardfork::Petersburg));
        let istanbul = GasParams::for_common(&Common::new(Chain::Mainnet, Hardfork::Istanbul));
        assert_eq!(petersburg.tx_data_non_zero, 68);
        assert_eq!(istanbul.tx_data_non_zero, 16);
        assert_eq!(istanbul.tx_data_zero, 4);
    }

    #[test]
    fn test_creation_and_initcode_costs() {
        let chainstart = GasParams::for_common(&Common::new(Chain::Mainnet, Hardfork::Chainstart));
        assert_eq!(chainstart.tx_creation, 0);

        let london = GasParams::for_common(&Common::new(Chain::Mainnet, Hardfork::London));
        assert_eq!(london.tx_creation, 32_000);
        assert_eq!(london.max_init_code_size, None);

        let shanghai = GasParams::for_common(&Common::new(Chain::Mainnet, Hardfork::Shanghai));
        assert_eq!(shanghai.init_code_word_cost, 2);
        assert_eq!(shanghai.max_init_code_size, Some(49_152));
    }
}
