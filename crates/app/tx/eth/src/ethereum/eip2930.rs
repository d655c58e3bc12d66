//! EIP-2930 access list transaction type.

use alloy_primitives::U256;

use crate::access_list::AccessList;
use crate::base::{
    annotate, check_field_count, decode_typed, require_upgrades, resolve_common,
    resolve_typed_chain_id, validate_fee_bound, validate_parity, Capability, RawFields, TxCore,
};
use crate::common::eip;
use crate::data::{TxData, TxOptions, TxType};
use crate::error::{TxErrorKind, TxResult};
use crate::ethereum::sign_typed;
use crate::rlp::RlpItem;
use crate::traits::{type_error, BuildTransaction, TypedTransaction};

/// An access-list transaction (type 1) with a single gas price.
///
/// The chain id is mandatory and `v` is the bare recovery parity.
#[derive(Debug, Clone)]
pub struct Eip2930Tx {
    core: TxCore,
    chain_id: u64,
    gas_price: U256,
    access_list: AccessList,
}

impl Eip2930Tx {
    fn build(data: &TxData, opts: &TxOptions) -> Result<Self, TxErrorKind> {
        let common = resolve_common(opts, data.chain_id)?;
        require_upgrades(&common, &[eip::EIP2718, eip::EIP2930])?;
        let chain_id = resolve_typed_chain_id(&common, data.chain_id)?;
        if let Some(v) = data.v {
            validate_parity("v", v)?;
        }

        let gas_price = data.gas_price.unwrap_or_default();
        let access_list = data.access_list.clone().unwrap_or_default();
        let core = TxCore::new(data, common, opts)?;
        validate_fee_bound(core.gas_limit(), gas_price, "gasPrice")?;

        Ok(Self {
            core,
            chain_id,
            gas_price,
            access_list,
        })
    }

    fn parse_raw(values: &[RlpItem]) -> Result<TxData, TxErrorKind> {
        let signed = check_field_count(values, 8, 11)?;
        let mut fields = RawFields::new(values);
        let mut data = TxData {
            tx_type: Some(TxType::AccessList),
            chain_id: Some(fields.uint("chainId")?),
            nonce: Some(fields.uint("nonce")?),
            gas_price: Some(fields.uint("gasPrice")?),
            gas_limit: Some(fields.uint("gasLimit")?),
            to: fields.to()?,
            value: Some(fields.uint("value")?),
            data: Some(fields.bytes("data")?),
            access_list: Some(fields.access_list()?),
            ..TxData::default()
        };
        if signed {
            let (v, r, s) = fields.signature(["v", "r", "s"])?;
            data.v = Some(v);
            data.r = Some(r);
            data.s = Some(s);
        }
        Ok(data)
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn sign(&self, private_key: &[u8]) -> TxResult<Self> {
        let data = sign_typed(self, private_key)?;
        Self::from_tx_data(data, self.core.options())
    }
}

impl TypedTransaction for Eip2930Tx {
    fn tx_type(&self) -> u8 {
        TxType::AccessList.marker()
    }

    fn core(&self) -> &TxCore {
        &self.core
    }

    fn chain_id(&self) -> Option<u64> {
        Some(self.chain_id)
    }

    fn access_list(&self) -> Option<&AccessList> {
        Some(&self.access_list)
    }

    fn unsigned_raw_values(&self) -> Vec<RlpItem> {
        let mut values = vec![
            RlpItem::uint(U256::from(self.chain_id)),
            self.core.nonce_item(),
            RlpItem::uint(self.gas_price),
        ];
        values.extend(self.core.call_items());
        values.push(self.access_list.to_rlp());
        values
    }

    fn raw_values(&self) -> Vec<RlpItem> {
        let mut values = self.unsigned_raw_values();
        values.extend(self.core.signature_items());
        values
    }

    fn upfront_cost(&self, _base_fee: U256) -> U256 {
        (self.core.gas_limit() * self.gas_price).saturating_add(self.core.value())
    }

    fn effective_priority_fee(&self, base_fee: U256) -> TxResult<U256> {
        self.gas_price.checked_sub(base_fee).ok_or_else(|| {
            self.error(TxErrorKind::FeeCapTooLow {
                fee_cap: self.gas_price,
                base_fee,
            })
        })
    }

    fn to_tx_data(&self) -> TxData {
        let mut data = TxData {
            tx_type: Some(TxType::AccessList),
            chain_id: Some(U256::from(self.chain_id)),
            gas_price: Some(self.gas_price),
            access_list: Some(self.access_list.clone()),
            ..TxData::default()
        };
        self.core.fill_tx_data(&mut data);
        data
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Eip155ReplayProtection
                | Capability::Eip2718TypedTransaction
                | Capability::Eip2930AccessLists
        )
    }
}

impl BuildTransaction for Eip2930Tx {
    const TX_TYPE: TxType = TxType::AccessList;

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
