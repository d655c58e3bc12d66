//! EIP-1559 fee market transaction type.

use alloy_primitives::U256;

use crate::access_list::AccessList;
use crate::base::{
    annotate, check_field_count, decode_typed, require_upgrades, resolve_common,
    resolve_typed_chain_id, validate_fee_bound, validate_fee_ordering, validate_parity,
    Capability, RawFields, TxCore,
};
use crate::common::eip;
use crate::data::{TxData, TxOptions, TxType};
use crate::error::{TxErrorKind, TxResult};
use crate::ethereum::sign_typed;
use crate::rlp::RlpItem;
use crate::traits::{type_error, BuildTransaction, TypedTransaction};

/// A fee market transaction (type 2).
///
/// EIP-1559 transactions include:
/// - a fee cap (`maxFeePerGas`) and a tip cap (`maxPriorityFeePerGas`)
/// - an access list
/// - a mandatory chain id
#[derive(Debug, Clone)]
pub struct Eip1559Tx {
    core: TxCore,
    fees: FeeMarketFields,
}

/// Fee fields shared with the priority variant.
#[derive(Debug, Clone)]
pub(crate) struct FeeMarketFields {
    pub(crate) chain_id: u64,
    pub(crate) max_priority_fee_per_gas: U256,
    pub(crate) max_fee_per_gas: U256,
    pub(crate) access_list: AccessList,
}

impl FeeMarketFields {
    /// Registry gating, chain id, parity and fee checks of a fee market
    /// transaction. Returns the fields together with the validated core.
    pub(crate) fn build(data: &TxData, opts: &TxOptions) -> Result<(Self, TxCore), TxErrorKind> {
        let common = resolve_common(opts, data.chain_id)?;
        require_upgrades(&common, &[eip::EIP2718, eip::EIP1559])?;
        let chain_id = resolve_typed_chain_id(&common, data.chain_id)?;
        if let Some(v) = data.v {
            validate_parity("v", v)?;
        }

        let max_priority_fee_per_gas = data.max_priority_fee_per_gas.unwrap_or_default();
        let max_fee_per_gas = data.max_fee_per_gas.unwrap_or_default();
        let core = TxCore::new(data, common, opts)?;
        validate_fee_bound(core.gas_limit(), max_fee_per_gas, "maxFeePerGas")?;
        validate_fee_ordering(max_fee_per_gas, max_priority_fee_per_gas)?;

        let fields = Self {
            chain_id,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            access_list: data.access_list.clone().unwrap_or_default(),
        };
        Ok((fields, core))
    }

    /// The nine unsigned fields in wire order.
    pub(crate) fn parse_raw(fields: &mut RawFields<'_>, tx_type: TxType) -> Result<TxData, TxErrorKind> {
        Ok(TxData {
            tx_type: Some(tx_type),
            chain_id: Some(fields.uint("chainId")?),
            nonce: Some(fields.uint("nonce")?),
            max_priority_fee_per_gas: Some(fields.uint("maxPriorityFeePerGas")?),
            max_fee_per_gas: Some(fields.uint("maxFeePerGas")?),
            gas_limit: Some(fields.uint("gasLimit")?),
            to: fields.to()?,
            value: Some(fields.uint("value")?),
            data: Some(fields.bytes("data")?),
            access_list: Some(fields.access_list()?),
            ..TxData::default()
        })
    }

    pub(crate) fn unsigned_raw_values(&self, core: &TxCore) -> Vec<RlpItem> {
        let mut values = vec![
            RlpItem::uint(U256::from(self.chain_id)),
            core.nonce_item(),
            RlpItem::uint(self.max_priority_fee_per_gas),
            RlpItem::uint(self.max_fee_per_gas),
        ];
        values.extend(core.call_items());
        values.push(self.access_list.to_rlp());
        values
    }

    /// `gasLimit * min(baseFee + tip cap, fee cap) + value`
    pub(crate) fn upfront_cost(&self, core: &TxCore, base_fee: U256) -> U256 {
        let gas_price = base_fee
            .saturating_add(self.max_priority_fee_per_gas)
            .min(self.max_fee_per_gas);
        (core.gas_limit() * gas_price).saturating_add(core.value())
    }

    /// `min(tip cap, fee cap - baseFee)`
    pub(crate) fn effective_priority_fee(&self, base_fee: U256) -> Result<U256, TxErrorKind> {
        let headroom = self.max_fee_per_gas.checked_sub(base_fee).ok_or(
            TxErrorKind::FeeCapTooLow {
                fee_cap: self.max_fee_per_gas,
                base_fee,
            },
        )?;
        Ok(headroom.min(self.max_priority_fee_per_gas))
    }

    pub(crate) fn fill_tx_data(&self, data: &mut TxData) {
        data.chain_id = Some(U256::from(self.chain_id));
        data.max_priority_fee_per_gas = Some(self.max_priority_fee_per_gas);
        data.max_fee_per_gas = Some(self.max_fee_per_gas);
        data.access_list = Some(self.access_list.clone());
    }

    pub(crate) fn supports(capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Eip155ReplayProtection
                | Capability::Eip1559FeeMarket
                | Capability::Eip2718TypedTransaction
                | Capability::Eip2930AccessLists
        )
    }
}

impl Eip1559Tx {
    fn build(data: &TxData, opts: &TxOptions) -> Result<Self, TxErrorKind> {
        let (fees, core) = FeeMarketFields::build(data, opts)?;
        Ok(Self { core, fees })
    }

    fn parse_raw(values: &[RlpItem]) -> Result<TxData, TxErrorKind> {
        let signed = check_field_count(values, 9, 12)?;
        let mut fields = RawFields::new(values);
        let mut data = FeeMarketFields::parse_raw(&mut fields, TxType::FeeMarket)?;
        if signed {
            let (v, r, s) = fields.signature(["v", "r", "s"])?;
            data.v = Some(v);
            data.r = Some(r);
            data.s = Some(s);
        }
        Ok(data)
    }

    pub fn max_fee_per_gas(&self) -> U256 {
        self.fees.max_fee_per_gas
    }

    pub fn max_priority_fee_per_gas(&self) -> U256 {
        self.fees.max_priority_fee_per_gas
    }

    pub fn sign(&self, private_key: &[u8]) -> TxResult<Self> {
        let data = sign_typed(self, private_key)?;
        Self::from_tx_data(data, self.core.options())
    }
}

impl TypedTransaction for Eip1559Tx {
    fn tx_type(&self) -> u8 {
        TxType::FeeMarket.marker()
    }

    fn core(&self) -> &TxCore {
        &self.core
    }

    fn chain_id(&self) -> Option<u64> {
        Some(self.fees.chain_id)
    }

    fn access_list(&self) -> Option<&AccessList> {
        Some(&self.fees.access_list)
    }

    fn unsigned_raw_values(&self) -> Vec<RlpItem> {
        self.fees.unsigned_raw_values(&self.core)
    }

    fn raw_values(&self) -> Vec<RlpItem> {
        let mut values = self.unsigned_raw_values();
        values.extend(self.core.signature_items());
        values
    }

    fn upfront_cost(&self, base_fee: U256) -> U256 {
        self.fees.upfront_cost(&self.core, base_fee)
    }

    fn effective_priority_fee(&self, base_fee: U256) -> TxResult<U256> {
        self.fees
            .effective_priority_fee(base_fee)
            .map_err(|kind| self.error(kind))
    }

    fn to_tx_data(&self) -> TxData {
        let mut data = TxData {
            tx_type: Some(TxType::FeeMarket),
            ..TxData::default()
        };
        self.core.fill_tx_data(&mut data);
        self.fees.fill_tx_data(&mut data);
        data
    }

    fn supports(&self, capability: Capability) -> bool {
        FeeMarketFields::supports(capability)
    }
}

impl BuildTransaction for Eip1559Tx {
    const TX_TYPE: TxType = TxType::FeeMarket;

    fn core_mut(&mut self) -> &mut TxCore {
        &mut self.core
    }

    fn from_tx_data(data: TxData, opts: TxOptions) -> TxResult<Self> {
        Self::build(&data, &opts).map_err(|kind| annotate(kind, Self::TX_TYPE, &data))
    }

    fn from_raw_values(values: &[RlpItem], opts: TxOptions) -> TxResult<Self> {
        let data = Self::parse_raw(values).map_err(|kind| type_error(Self::TX_TYPE, kind))?;
        Self::from_tx_data(data, opts)
    }

    fn from_serialized(serialized: &[u8], opts: TxOptions) -> TxResult<Self> {
        let values = decode_typed(serialized, Self::TX_TYPE.marker())
            .map_err(|kind| type_error(Self::TX_TYPE, kind))?;
        Self::from_raw_values(&values, opts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::common::{Chain, Common, Hardfork};
    use alloy_primitives::Address;

    fn london() -> TxOptions {
        TxOptions::with_common(Common::new(Chain::Mainnet, Hardfork::London))
    }

    fn fees(max_fee: u64, max_priority_fee: u64) -> TxData {
        TxData {
            max_fee_per_gas: Some(U256::from(max_fee)),
            max_priority_fee_per_gas: Some(U256::from(max_priority_fee)),
            gas_limit: Some(U256::from(100)),
            value: Some(U256::from(6)),
            to: Some(Address::repeat_byte(0x01)),
            ..TxData::default()
        }
    }

    #[test]
    fn test_requires_fee_market_upgrade() {
        let berlin = TxOptions::with_common(Common::new(Chain::Mainnet, Hardfork::Berlin));
        let err = Eip1559Tx::from_tx_data(fees(10, 8), berlin).unwrap_err();
        assert_eq!(err.kind(), &TxErrorKind::UnsupportedUpgrade(1559));
    }

    #[test]
    fn test_fee_ordering() {
        let err = Eip1559Tx::from_tx_data(fees(7, 8), london()).unwrap_err();
        assert!(matches!(err.kind(), TxErrorKind::FeeOrderingViolation { .. }));
        assert!(Eip1559Tx::from_tx_data(fees(8, 8), london()).is_ok());
    }

    #[test]
    fn test_upfront_cost_and_tip() {
        let tx = Eip1559Tx::from_tx_data(fees(10, 8), london()).unwrap();
        assert_eq!(tx.upfront_cost(U256::ZERO), U256::from(806));
        assert_eq!(tx.upfront_cost(U256::from(4)), U256::from(1006));
        assert_eq!(tx.upfront_cost(U256::from(20)), U256::from(1006));

        assert_eq!(tx.effective_priority_fee(U256::from(1)).unwrap(), U256::from(8));
        assert_eq!(tx.effective_priority_fee(U256::from(4)).unwrap(), U256::from(6));
        let err = tx.effective_priority_fee(U256::from(11)).unwrap_err();
        assert!(matches!(err.kind(), TxErrorKind::FeeCapTooLow { .. }));
    }

    #[test]
    fn test_gas_fee_product_bound() {
        let mut data = fees(0, 0);
        data.gas_limit = Some(U256::from(2));
        data.max_fee_per_gas = Some(U256::MAX / U256::from(2) + U256::from(1));
        let err = Eip1559Tx::from_tx_data(data, london()).unwrap_err();
        assert!(matches!(err.kind(), TxErrorKind::IntegerOverflow(_)));
    }

    #[test]
    fn test_chain_id_defaults_to_registry() {
        let goerli = TxOptions::with_common(Common::new(Chain::Goerli, Hardfork::London));
        let tx = Eip1559Tx::from_tx_data(fees(10, 8), goerli).unwrap();
        assert_eq!(tx.chain_id(), Some(5));
        assert_eq!(tx.to_tx_data().chain_id, Some(U256::from(5)));
    }

    #[test]
    fn test_sign_round_trip() {
        let tx = Eip1559Tx::from_tx_data(fees(10, 8), london()).unwrap();
        let signed = tx.sign(&[0x22; 32]).unwrap();
        let decoded = Eip1559Tx::from_serialized(&signed.serialize(), london()).unwrap();
        assert_eq!(decoded.raw_values(), signed.raw_values());
        assert!(decoded.verify_signature());
        assert!(decoded.supports(Capability::Eip1559FeeMarket));
    }
}
