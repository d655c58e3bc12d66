//! Priority transaction type (0x40): a fee market transaction carrying a
//! second, independent signature over the same payload.

use alloy_primitives::{Address, B256, B512, U256};

use super::eip1559::FeeMarketFields;
use super::recovery::{ecrecover, public_key_to_address, sign_digest};
use crate::access_list::AccessList;
use crate::base::{
    annotate, check_field_count, decode_typed, signature_items, validate_low_s, validate_parity,
    Capability, RawFields, TxCore,
};
use crate::data::{TxData, TxOptions, TxType};
use crate::error::{TxErrorKind, TxResult};
use crate::rlp::RlpItem;
use crate::traits::{type_error, BuildTransaction, TypedTransaction};

/// A dual-signature fee market transaction.
///
/// Field layout is the fee market layout followed by `[v, r, s, pV, pR, pS]`.
/// Both signature sets are present or neither is; construction with only one
/// fails with [`TxErrorKind::MissingSignatureSet`].
#[derive(Debug, Clone)]
pub struct PriorityTx {
    core: TxCore,
    fees: FeeMarketFields,
    priority_v: Option<U256>,
    priority_r: Option<U256>,
    priority_s: Option<U256>,
}

impl PriorityTx {
    fn build(data: &TxData, opts: &TxOptions) -> Result<Self, TxErrorKind> {
        let (fees, core) = FeeMarketFields::build(data, opts)?;
        let has_primary = data.v.is_some() || data.r.is_some() || data.s.is_some();
        let has_priority =
            data.priority_v.is_some() || data.priority_r.is_some() || data.priority_s.is_some();
        match (has_primary, has_priority) {
            (true, false) => return Err(TxErrorKind::MissingSignatureSet("pV, pR, pS")),
            (false, true) => return Err(TxErrorKind::MissingSignatureSet("v, r, s")),
            _ => {}
        }
        if let Some(v) = data.priority_v {
            validate_parity("pV", v)?;
        }
        if let Some(s) = data.priority_s {
            validate_low_s(core.common(), "pS", s)?;
        }
        Ok(Self {
            core,
            fees,
            priority_v: data.priority_v,
            priority_r: data.priority_r,
            priority_s: data.priority_s,
        })
    }

    fn parse_raw(values: &[RlpItem]) -> Result<TxData, TxErrorKind> {
        let signed = check_field_count(values, 9, 15)?;
        let mut fields = RawFields::new(values);
        let mut data = FeeMarketFields::parse_raw(&mut fields, TxType::Priority)?;
        if signed {
            let (v, r, s) = fields.signature(["v", "r", "s"])?;
            data.v = Some(v);
            data.r = Some(r);
            data.s = Some(s);
            let (pv, pr, ps) = fields.signature(["pV", "pR", "pS"])?;
            data.priority_v = Some(pv);
            data.priority_r = Some(pr);
            data.priority_s = Some(ps);
        }
        Ok(data)
    }

    pub fn max_fee_per_gas(&self) -> U256 {
        self.fees.max_fee_per_gas
    }

    pub fn max_priority_fee_per_gas(&self) -> U256 {
        self.fees.max_priority_fee_per_gas
    }

    /// `(pV, pR, pS)` if all three are present.
    pub fn priority_signature(&self) -> Option<(U256, U256, U256)> {
        Some((self.priority_v?, self.priority_r?, self.priority_s?))
    }

    /// Sign the same digest with both keys.
    pub fn sign(&self, private_key: &[u8], priority_private_key: &[u8]) -> TxResult<Self> {
        for key in [private_key, priority_private_key] {
            if key.len() != 32 {
                return Err(self.error(TxErrorKind::InvalidKeyLength(key.len())));
            }
        }

        let digest = self.signing_hash();
        let primary = sign_digest(&digest, private_key).map_err(|kind| self.error(kind))?;
        let secondary =
            sign_digest(&digest, priority_private_key).map_err(|kind| self.error(kind))?;
        tracing::debug!(tx_type = self.tx_type(), "signed transaction with both keys");

        let mut data = self.to_tx_data();
        data.v = Some(U256::from(primary.parity));
        data.r = Some(primary.r);
        data.s = Some(primary.s);
        data.priority_v = Some(U256::from(secondary.parity));
        data.priority_r = Some(secondary.r);
        data.priority_s = Some(secondary.s);
        Self::from_tx_data(data, self.core.options())
    }

    /// Public key behind the second signature.
    pub fn priority_public_key(&self) -> TxResult<B512> {
        if !self.is_signed() {
            return Err(self.error(TxErrorKind::NotSigned));
        }
        let (v, r, s) = self
            .priority_signature()
            .ok_or_else(|| self.error(TxErrorKind::NotSigned))?;
        self.recover(&self.signing_hash(), "pS", v, r, s)
    }

    /// Both public keys, recovered independently from the same digest. Either
    /// failing fails the call.
    pub fn sender_and_priority_public_keys(&self) -> TxResult<(B512, B512)> {
        if !self.is_signed() {
            return Err(self.error(TxErrorKind::NotSigned));
        }
        let digest = self.signing_hash();
        let (v, r, s) = self
            .core
            .signature()
            .ok_or_else(|| self.error(TxErrorKind::NotSigned))?;
        let (pv, pr, ps) = self
            .priority_signature()
            .ok_or_else(|| self.error(TxErrorKind::NotSigned))?;
        let sender = self.recover(&digest, "s", v, r, s)?;
        let priority = self.recover(&digest, "pS", pv, pr, ps)?;
        Ok((sender, priority))
    }

    pub fn priority_address(&self) -> TxResult<Address> {
        self.priority_public_key()
            .map(|public_key| public_key_to_address(&public_key))
    }

    fn recover(
        &self,
        digest: &B256,
        s_field: &'static str,
        v: U256,
        r: U256,
        s: U256,
    ) -> TxResult<B512> {
        validate_low_s(self.common(), s_field, s).map_err(|kind| self.error(kind))?;
        let parity = u64::try_from(v).map_err(|_| self.error(TxErrorKind::InvalidSignature))?;
        ecrecover(digest, parity + 27, r, s).map_err(|kind| self.error(kind))
    }
}

impl TypedTransaction for PriorityTx {
    fn tx_type(&self) -> u8 {
        TxType::Priority.marker()
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
        if self.is_signed() {
            values.extend(self.core.signature_items());
            values.extend(signature_items(self.priority_signature()));
        }
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
            tx_type: Some(TxType::Priority),
            priority_v: self.priority_v,
            priority_r: self.priority_r,
            priority_s: self.priority_s,
            ..TxData::default()
        };
        self.core.fill_tx_data(&mut data);
        self.fees.fill_tx_data(&mut data);
        data
    }

    fn supports(&self, capability: Capability) -> bool {
        FeeMarketFields::supports(capability)
    }

    fn is_signed(&self) -> bool {
        self.core.signature().is_some() && self.priority_signature().is_some()
    }
}

impl BuildTransaction for PriorityTx {
    const TX_TYPE: TxType = TxType::Priority;

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
