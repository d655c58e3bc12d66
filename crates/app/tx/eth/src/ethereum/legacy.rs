//! Legacy (pre-EIP-2718) transaction type.

use alloy_primitives::{keccak256, U256};

use crate::base::{
    annotate, check_field_count, resolve_common, validate_fee_bound, validate_parity, Capability,
    RawFields, TxCore,
};
use crate::common::{eip, Common};
use crate::data::{TxData, TxOptions, TxType};
use crate::error::{TxErrorKind, TxResult};
use crate::ethereum::recovery::sign_digest;
use crate::rlp::{self, RlpItem};
use crate::traits::{type_error, BuildTransaction, TypedTransaction};

/// Whether a legacy signature commits to the chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayProtection {
    /// `v = parity + 35 + 2 * chainId`, message extended with `[chainId, 0, 0]`.
    Eip155,
    /// `v = parity + 27`.
    Unprotected,
}

/// A legacy transaction with a single gas price.
///
/// Legacy transactions carry no type prefix. EIP-155 replay protection is
/// encoded in `v`; the normalized parity is recovered from it on demand.
#[derive(Debug, Clone)]
pub struct LegacyTx {
    core: TxCore,
    gas_price: U256,
}

/// `(parity, chain id)` encoded in a legacy `v`.
fn decode_v(v: U256) -> Result<(U256, Option<U256>), TxErrorKind> {
    let offset = U256::from(35u8);
    if v == U256::from(27u8) || v == U256::from(28u8) {
        return Ok((v - U256::from(27u8), None));
    }
    if v >= offset {
        let shifted = v - offset;
        return Ok((shifted % U256::from(2u8), Some(shifted / U256::from(2u8))));
    }
    Err(TxErrorKind::InvalidSignatureParity {
        field: "v",
        value: v,
    })
}

fn validate_v(common: &Common, v: U256) -> Result<(), TxErrorKind> {
    let (parity, chain_id) = decode_v(v)?;
    if let Some(found) = chain_id {
        if !common.is_active(eip::EIP155) {
            return Err(TxErrorKind::UnsupportedUpgrade(eip::EIP155));
        }
        if found != U256::from(common.chain_id()) {
            return Err(TxErrorKind::ChainIdMismatch {
                expected: common.chain_id(),
                found,
            });
        }
    }
    validate_parity("v", parity)
}

impl LegacyTx {
    fn build(data: &TxData, opts: &TxOptions) -> Result<Self, TxErrorKind> {
        let v_chain_id = data.v.and_then(|v| decode_v(v).ok()).and_then(|(_, id)| id);
        let common = resolve_common(opts, v_chain_id.or(data.chain_id))?;
        if let Some(v) = data.v {
            validate_v(&common, v)?;
        }

        let gas_price = data.gas_price.unwrap_or_default();
        let core = TxCore::new(data, common, opts)?;
        validate_fee_bound(core.gas_limit(), gas_price, "gasPrice")?;
        Ok(Self { core, gas_price })
    }

    fn parse_raw(values: &[RlpItem]) -> Result<TxData, TxErrorKind> {
        let signed = check_field_count(values, 6, 9)?;
        let mut fields = RawFields::new(values);
        let mut data = TxData {
            tx_type: Some(TxType::Legacy),
            nonce: Some(fields.uint("nonce")?),
            gas_price: Some(fields.uint("gasPrice")?),
            gas_limit: Some(fields.uint("gasLimit")?),
            to: fields.to()?,
            value: Some(fields.uint("value")?),
            data: Some(fields.bytes("data")?),
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

    /// Replay protection of the existing signature, or the mode a fresh
    /// signature would use on this registry.
    pub fn replay_protection(&self) -> ReplayProtection {
        match self.core.v() {
            Some(v) if v >= U256::from(35u8) => ReplayProtection::Eip155,
            Some(_) => ReplayProtection::Unprotected,
            None if self.common().is_active(eip::EIP155) => ReplayProtection::Eip155,
            None => ReplayProtection::Unprotected,
        }
    }

    fn signing_message_for(&self, mode: ReplayProtection) -> Vec<u8> {
        let mut values = self.unsigned_raw_values();
        if mode == ReplayProtection::Eip155 {
            values.extend([
                RlpItem::uint(U256::from(self.common().chain_id())),
                RlpItem::empty(),
                RlpItem::empty(),
            ]);
        }
        rlp::encode_list(&values)
    }

    /// Sign with EIP-155 replay protection if the registry has it active.
    pub fn sign(&self, private_key: &[u8]) -> TxResult<Self> {
        let mode = if self.common().is_active(eip::EIP155) {
            ReplayProtection::Eip155
        } else {
            ReplayProtection::Unprotected
        };
        self.sign_with(private_key, mode)
    }

    /// Sign with an explicit replay-protection mode.
    pub fn sign_with(&self, private_key: &[u8], mode: ReplayProtection) -> TxResult<Self> {
        if mode == ReplayProtection::Eip155 && !self.common().is_active(eip::EIP155) {
            return Err(self.error(TxErrorKind::UnsupportedUpgrade(eip::EIP155)));
        }
        let digest = keccak256(self.signing_message_for(mode));
        let sig = sign_digest(&digest, private_key).map_err(|kind| self.error(kind))?;

        let parity = U256::from(sig.parity);
        let v = match mode {
            ReplayProtection::Eip155 => {
                parity + U256::from(35u8) + U256::from(self.common().chain_id()) * U256::from(2u8)
            }
            ReplayProtection::Unprotected => parity + U256::from(27u8),
        };
        tracing::debug!(
            tx_type = TxType::Legacy.marker(),
            replay_protected = mode == ReplayProtection::Eip155,
            "signed transaction"
        );

        let mut data = self.to_tx_data();
        data.v = Some(v);
        data.r = Some(sig.r);
        data.s = Some(sig.s);
        Self::from_tx_data(data, self.core.options())
    }
}

impl TypedTransaction for LegacyTx {
    fn tx_type(&self) -> u8 {
        TxType::Legacy.marker()
    }

    fn core(&self) -> &TxCore {
        &self.core
    }

    fn chain_id(&self) -> Option<u64> {
        match self.replay_protection() {
            ReplayProtection::Eip155 => Some(self.common().chain_id()),
            ReplayProtection::Unprotected => None,
        }
    }

    fn unsigned_raw_values(&self) -> Vec<RlpItem> {
        let mut values = vec![self.core.nonce_item(), RlpItem::uint(self.gas_price)];
        values.extend(self.core.call_items());
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
            tx_type: Some(TxType::Legacy),
            gas_price: Some(self.gas_price),
            ..TxData::default()
        };
        self.core.fill_tx_data(&mut data);
        data
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::Eip155ReplayProtection && self.common().is_active(eip::EIP155)
    }

    fn signature_parity(&self) -> Option<u8> {
        let (parity, _) = decode_v(self.core.v()?).ok()?;
        u8::try_from(parity).ok()
    }

    fn serialize(&self) -> Vec<u8> {
        rlp::encode_list(&self.raw_values())
    }

    fn signing_message(&self) -> Vec<u8> {
        self.signing_message_for(self.replay_protection())
    }
}

impl BuildTransaction for LegacyTx {
    const TX_TYPE: TxType = TxType::Legacy;

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
        let values = rlp::decode_list(serialized)
            .map_err(|err| type_error(Self::TX_TYPE, err.into()))?;
        Self::from_raw_values(&values, opts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::common::{Chain, Hardfork};
    use alloy_primitives::Address;
    use std::sync::Arc;

    const KEY: [u8; 32] = [0x46; 32];

    fn eip155_example(common: Common) -> LegacyTx {
        let data = TxData {
            nonce: Some(U256::from(9)),
            gas_price: Some(U256::from(20_000_000_000u64)),
            gas_limit: Some(U256::from(21_000)),
            to: Some(Address::repeat_byte(0x35)),
            value: Some(U256::from(1_000_000_000_000_000_000u64)),
            ..TxData::default()
        };
        LegacyTx::from_tx_data(data, TxOptions::with_common(common)).unwrap()
    }

    #[test]
    fn test_eip155_signing_message() {
        let tx = eip155_example(Common::new(Chain::Mainnet, Hardfork::Istanbul));
        assert_eq!(
            hex::encode(tx.signing_message()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        assert_eq!(tx.chain_id(), Some(1));
    }

    #[test]
    fn test_sign_applies_replay_protection() {
        let tx = eip155_example(Common::new(Chain::Mainnet, Hardfork::Istanbul));
        let signed = tx.sign(&KEY).unwrap();
        assert_eq!(signed.core().v(), Some(U256::from(37)));
        assert_eq!(signed.signature_parity(), Some(0));
        assert_eq!(signed.replay_protection(), ReplayProtection::Eip155);
        assert!(!tx.is_signed());
        assert!(signed.is_signed());
    }

    #[test]
    fn test_unprotected_signature() {
        let tx = eip155_example(Common::new(Chain::Mainnet, Hardfork::Istanbul));
        let signed = tx.sign_with(&KEY, ReplayProtection::Unprotected).unwrap();
        let v = signed.core().v().unwrap();
        assert!(v == U256::from(27) || v == U256::from(28));
        assert_eq!(signed.chain_id(), None);
        assert_eq!(
            signed.sender_address().unwrap(),
            tx.sign(&KEY).unwrap().sender_address().unwrap()
        );
    }

    #[test]
    fn test_pre_eip155_registry() {
        let tx = eip155_example(Common::new(Chain::Mainnet, Hardfork::Homestead));
        assert_eq!(tx.chain_id(), None);
        let err = tx.sign_with(&KEY, ReplayProtection::Eip155).unwrap_err();
        assert_eq!(err.kind(), &TxErrorKind::UnsupportedUpgrade(155));

        let signed = tx.sign(&KEY).unwrap();
        assert!(signed.core().v().unwrap() < U256::from(29));
    }

    #[test]
    fn test_v_validation() {
        let common = Arc::new(Common::new(Chain::Goerli, Hardfork::London));
        let with_v = |v: u64| TxData {
            v: Some(U256::from(v)),
            r: Some(U256::from(1)),
            s: Some(U256::from(1)),
            ..TxData::default()
        };

        // 35 + 2 * 5
        assert!(LegacyTx::from_tx_data(with_v(45), TxOptions::with_common(common.clone())).is_ok());
        assert!(LegacyTx::from_tx_data(with_v(28), TxOptions::with_common(common.clone())).is_ok());

        let err = LegacyTx::from_tx_data(with_v(37), TxOptions::with_common(common.clone()))
            .unwrap_err();
        assert!(matches!(err.kind(), TxErrorKind::ChainIdMismatch { expected: 5, .. }));

        let err = LegacyTx::from_tx_data(with_v(30), TxOptions::with_common(common)).unwrap_err();
        assert!(matches!(
            err.kind(),
            TxErrorKind::InvalidSignatureParity { field: "v", .. }
        ));

        let homestead = Common::new(Chain::Mainnet, Hardfork::Homestead);
        let err = LegacyTx::from_tx_data(with_v(37), TxOptions::with_common(homestead)).unwrap_err();
        assert_eq!(err.kind(), &TxErrorKind::UnsupportedUpgrade(155));
    }

    #[test]
    fn test_registry_derived_from_v() {
        // 35 + 2 * 11155111
        let data = TxData {
            v: Some(U256::from(22_310_257u64)),
            r: Some(U256::from(1)),
            s: Some(U256::from(1)),
            ..TxData::default()
        };
        let tx = LegacyTx::from_tx_data(data, TxOptions::default()).unwrap();
        assert_eq!(tx.common().chain_name(), "sepolia");
        assert_eq!(tx.chain_id(), Some(11_155_111));
    }

    #[test]
    fn test_effective_priority_fee() {
        let tx = eip155_example(Common::default());
        assert_eq!(
            tx.effective_priority_fee(U256::from(5_000_000_000u64)).unwrap(),
            U256::from(15_000_000_000u64)
        );
        let err = tx
            .effective_priority_fee(U256::from(30_000_000_000u64))
            .unwrap_err();
        assert!(matches!(err.kind(), TxErrorKind::FeeCapTooLow { .. }));
    }

    #[test]
    fn test_raw_values_field_count() {
        let err = LegacyTx::from_raw_values(&vec![RlpItem::empty(); 7], TxOptions::default())
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &TxErrorKind::WrongFieldCount {
                unsigned: 6,
                signed: 9,
                found: 7
            }
        );
        assert_eq!(err.descriptor(), Some("type=0"));
    }
}
