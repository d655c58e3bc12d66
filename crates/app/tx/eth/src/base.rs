//! Shared transaction core.
//!
//! Every variant embeds a [`TxCore`] holding the fields common to all of them
//! (nonce, gas limit, recipient, value, data, primary signature), the registry
//! it was validated against, and the fork-keyed caches used once the instance
//! is frozen. The free functions here are the validation primitives the
//! variants compose during construction.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use parking_lot::Mutex;

use crate::access_list::{parse_address, AccessList};
use crate::common::{eip, Common, Hardfork};
use crate::data::{TxData, TxOptions, TxType};
use crate::error::{TxError, TxErrorKind};
use crate::primitives::{has_leading_zero, uint_from_be_bytes, SECP256K1_N_DIV_2};
use crate::rlp::{self, RlpError, RlpItem};

/// Protocol features a transaction may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Eip155ReplayProtection,
    Eip1559FeeMarket,
    Eip2718TypedTransaction,
    Eip2930AccessLists,
}

impl Capability {
    pub const fn eip(self) -> u32 {
        match self {
            Capability::Eip155ReplayProtection => eip::EIP155,
            Capability::Eip1559FeeMarket => eip::EIP1559,
            Capability::Eip2718TypedTransaction => eip::EIP2718,
            Capability::Eip2930AccessLists => eip::EIP2930,
        }
    }
}

/// A derived value remembered together with the fork it was computed under.
#[derive(Debug, Default)]
pub(crate) struct ForkCache<T>(Mutex<Option<(Hardfork, T)>>);

impl<T: Copy> ForkCache<T> {
    pub(crate) fn get_or_compute(
        &self,
        fork: Hardfork,
        what: &'static str,
        compute: impl FnOnce() -> T,
    ) -> T {
        let mut slot = self.0.lock();
        match *slot {
            Some((cached_fork, value)) if cached_fork == fork => return value,
            Some((cached_fork, _)) => tracing::trace!(
                cache = what,
                from = %cached_fork,
                to = %fork,
                "recomputing cached value after fork change"
            ),
            None => {}
        }
        let value = compute();
        *slot = Some((fork, value));
        value
    }

    pub(crate) fn clear(&self) {
        *self.0.lock() = None;
    }

    #[cfg(test)]
    pub(crate) fn peek(&self) -> Option<(Hardfork, T)> {
        *self.0.lock()
    }
}

impl<T: Copy> Clone for ForkCache<T> {
    fn clone(&self) -> Self {
        Self(Mutex::new(*self.0.lock()))
    }
}

/// Fields and bookkeeping shared by every variant.
#[derive(Debug, Clone)]
pub struct TxCore {
    nonce: U256,
    gas_limit: U256,
    to: Option<Address>,
    value: U256,
    data: Bytes,
    v: Option<U256>,
    r: Option<U256>,
    s: Option<U256>,
    common: Arc<Common>,
    frozen: bool,
    allow_unlimited_init_code_size: bool,
    hash_cache: ForkCache<B256>,
    data_fee_cache: ForkCache<U256>,
}

impl TxCore {
    /// Take the shared fields from `data`, enforcing the initcode limit and
    /// the low-S rule on the primary signature.
    pub(crate) fn new(
        data: &TxData,
        common: Arc<Common>,
        opts: &TxOptions,
    ) -> Result<Self, TxErrorKind> {
        let payload = data.data.clone().unwrap_or_default();

        if data.to.is_none() && !opts.allow_unlimited_init_code_size {
            if let Some(limit) = common.gas_params().max_init_code_size {
                if payload.len() > limit {
                    return Err(TxErrorKind::InitCodeSizeExceeded {
                        size: payload.len(),
                        limit,
                    });
                }
            }
        }

        if let Some(s) = data.s {
            validate_low_s(&common, "s", s)?;
        }

        Ok(Self {
            nonce: data.nonce.unwrap_or_default(),
            gas_limit: data.gas_limit.unwrap_or_default(),
            to: data.to,
            value: data.value.unwrap_or_default(),
            data: payload,
            v: data.v,
            r: data.r,
            s: data.s,
            common,
            frozen: opts.freeze,
            allow_unlimited_init_code_size: opts.allow_unlimited_init_code_size,
            hash_cache: ForkCache::default(),
            data_fee_cache: ForkCache::default(),
        })
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn gas_limit(&self) -> U256 {
        self.gas_limit
    }

    pub fn to(&self) -> Option<Address> {
        self.to
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn v(&self) -> Option<U256> {
        self.v
    }

    pub fn r(&self) -> Option<U256> {
        self.r
    }

    pub fn s(&self) -> Option<U256> {
        self.s
    }

    /// `(v, r, s)` if all three are present.
    pub fn signature(&self) -> Option<(U256, U256, U256)> {
        Some((self.v?, self.r?, self.s?))
    }

    pub fn common(&self) -> &Arc<Common> {
        &self.common
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Options reproducing this instance's registry and freeze setting.
    pub(crate) fn options(&self) -> TxOptions {
        TxOptions {
            common: Some(self.common.clone()),
            freeze: self.frozen,
            allow_unlimited_init_code_size: self.allow_unlimited_init_code_size,
        }
    }

    pub(crate) fn fill_tx_data(&self, data: &mut TxData) {
        data.nonce = Some(self.nonce);
        data.gas_limit = Some(self.gas_limit);
        data.to = self.to;
        data.value = Some(self.value);
        data.data = Some(self.data.clone());
        data.v = self.v;
        data.r = self.r;
        data.s = self.s;
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    /// Bind to another registry. The caches keep their contents and are
    /// re-keyed on the next read; a registry with different explicit upgrades
    /// at the same fork drops them.
    pub(crate) fn rebind(&mut self, common: Arc<Common>) {
        if !self.common.extra_eips().eq(common.extra_eips()) {
            self.hash_cache.clear();
            self.data_fee_cache.clear();
        }
        self.common = common;
    }

    pub(crate) fn cached_hash(&self, compute: impl FnOnce() -> B256) -> B256 {
        if !self.frozen {
            return compute();
        }
        self.hash_cache
            .get_or_compute(self.common.hardfork(), "hash", compute)
    }

    pub(crate) fn cached_data_fee(&self, compute: impl FnOnce() -> U256) -> U256 {
        if !self.frozen {
            return compute();
        }
        self.data_fee_cache
            .get_or_compute(self.common.hardfork(), "data_fee", compute)
    }

    pub(crate) fn nonce_item(&self) -> RlpItem {
        RlpItem::uint(self.nonce)
    }

    /// `[gasLimit, to, value, data]`, which follow the fee fields.
    pub(crate) fn call_items(&self) -> [RlpItem; 4] {
        [
            RlpItem::uint(self.gas_limit),
            match self.to {
                Some(to) => RlpItem::bytes(to.to_vec()),
                None => RlpItem::empty(),
            },
            RlpItem::uint(self.value),
            RlpItem::Bytes(self.data.clone()),
        ]
    }

    /// `[v, r, s]`, or nothing if any component is missing.
    pub(crate) fn signature_items(&self) -> Vec<RlpItem> {
        signature_items(self.signature())
    }

    /// Data fee of the payload plus the access-list charge, if any.
    pub(crate) fn compute_data_fee(&self, access_list: Option<&AccessList>) -> U256 {
        let params = self.common.gas_params();
        let zeros = self.data.iter().filter(|b| **b == 0).count() as u64;
        let non_zeros = self.data.len() as u64 - zeros;
        let mut cost = U256::from(zeros) * U256::from(params.tx_data_zero)
            + U256::from(non_zeros) * U256::from(params.tx_data_non_zero);
        if let Some(list) = access_list {
            cost += U256::from(list.address_count()) * U256::from(params.access_list_address_cost)
                + U256::from(list.storage_key_count())
                    * U256::from(params.access_list_storage_key_cost);
        }
        cost
    }

    /// Gas charged before execution: base cost, data fee and creation costs.
    pub(crate) fn compute_intrinsic_gas(&self, data_fee: U256) -> U256 {
        let params = self.common.gas_params();
        let mut gas = U256::from(params.tx_gas) + data_fee;
        if self.to.is_none() {
            let words = (self.data.len() as u64).div_ceil(32);
            gas += U256::from(params.tx_creation)
                + U256::from(words) * U256::from(params.init_code_word_cost);
        }
        gas
    }
}

pub(crate) fn signature_items(signature: Option<(U256, U256, U256)>) -> Vec<RlpItem> {
    match signature {
        Some((v, r, s)) => vec![RlpItem::uint(v), RlpItem::uint(r), RlpItem::uint(s)],
        None => Vec::new(),
    }
}

/// `type=<n> nonce=<n> to=<0x..>` used to annotate errors.
pub fn descriptor(tx_type: u8, nonce: U256, to: Option<Address>) -> String {
    match to {
        Some(to) => format!("type={tx_type} nonce={nonce} to={to}"),
        None => format!("type={tx_type} nonce={nonce}"),
    }
}

/// Attach the descriptor of the transaction described by `data`.
pub(crate) fn annotate(kind: TxErrorKind, tx_type: TxType, data: &TxData) -> TxError {
    TxError::new(kind).with_descriptor(descriptor(
        tx_type.marker(),
        data.nonce.unwrap_or_default(),
        data.to,
    ))
}

// ---------------------------------------------------------------------------
// Validation primitives
// ---------------------------------------------------------------------------

/// Integers must be minimal-length: no leading zero byte.
pub fn validate_no_leading_zero(fields: &[(&str, &[u8])]) -> Result<(), TxErrorKind> {
    for (name, bytes) in fields {
        if has_leading_zero(bytes) {
            return Err(TxErrorKind::InvalidFieldEncoding((*name).to_string()));
        }
    }
    Ok(())
}

/// Scalar fields must be byte strings, not lists.
pub fn validate_not_array(fields: &[(&str, &RlpItem)]) -> Result<(), TxErrorKind> {
    for (name, item) in fields {
        if item.as_bytes().is_none() {
            return Err(TxErrorKind::InvalidFieldShape((*name).to_string()));
        }
    }
    Ok(())
}

/// Integers must fit in 256 bits.
pub fn validate_bound_256(fields: &[(&str, &[u8])]) -> Result<(), TxErrorKind> {
    for (name, bytes) in fields {
        if uint_from_be_bytes(bytes).is_none() {
            return Err(TxErrorKind::IntegerOverflow((*name).to_string()));
        }
    }
    Ok(())
}

/// A normalized signature parity is 0 or 1.
pub fn validate_parity(field: &'static str, parity: U256) -> Result<(), TxErrorKind> {
    if parity > U256::from(1u8) {
        return Err(TxErrorKind::InvalidSignatureParity {
            field,
            value: parity,
        });
    }
    Ok(())
}

/// With EIP-2 active, `s` must not exceed half the curve order.
pub fn validate_low_s(common: &Common, field: &'static str, s: U256) -> Result<(), TxErrorKind> {
    if common.is_active(eip::EIP2) && s > SECP256K1_N_DIV_2 {
        return Err(TxErrorKind::HighSSignature(field));
    }
    Ok(())
}

/// Every listed upgrade must be active on the registry.
pub(crate) fn require_upgrades(common: &Common, eips: &[u32]) -> Result<(), TxErrorKind> {
    match eips.iter().find(|eip| !common.is_active(**eip)) {
        Some(missing) => Err(TxErrorKind::UnsupportedUpgrade(*missing)),
        None => Ok(()),
    }
}

/// `gas_limit * fee` must stay within 256 bits.
pub(crate) fn validate_fee_bound(
    gas_limit: U256,
    fee: U256,
    fee_name: &str,
) -> Result<(), TxErrorKind> {
    gas_limit
        .checked_mul(fee)
        .map(|_| ())
        .ok_or_else(|| TxErrorKind::IntegerOverflow(format!("gasLimit * {fee_name}")))
}

pub(crate) fn validate_fee_ordering(max_fee: U256, max_priority_fee: U256) -> Result<(), TxErrorKind> {
    if max_fee < max_priority_fee {
        return Err(TxErrorKind::FeeOrderingViolation {
            max_fee,
            max_priority_fee,
        });
    }
    Ok(())
}

/// The registry a transaction is validated against: the supplied one, else
/// one derived from the transaction's chain id, else the default.
pub(crate) fn resolve_common(
    opts: &TxOptions,
    chain_id: Option<U256>,
) -> Result<Arc<Common>, TxErrorKind> {
    if let Some(common) = &opts.common {
        return Ok(common.clone());
    }
    let Some(found) = chain_id else {
        return Ok(Arc::new(Common::default()));
    };
    let chain_id = u64::try_from(found).map_err(|_| TxErrorKind::ChainIdMismatch {
        expected: Common::default().chain_id(),
        found,
    })?;
    tracing::debug!(chain_id, "deriving registry from transaction chain id");
    Ok(Arc::new(Common::for_chain_id(chain_id)))
}

/// Typed transactions default to the registry's chain id and must match it.
pub(crate) fn resolve_typed_chain_id(
    common: &Common,
    supplied: Option<U256>,
) -> Result<u64, TxErrorKind> {
    match supplied {
        Some(found) if found != U256::from(common.chain_id()) => Err(TxErrorKind::ChainIdMismatch {
            expected: common.chain_id(),
            found,
        }),
        _ => Ok(common.chain_id()),
    }
}

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// Returns whether the values include the signature fields.
pub(crate) fn check_field_count(
    values: &[RlpItem],
    unsigned: usize,
    signed: usize,
) -> Result<bool, TxErrorKind> {
    match values.len() {
        n if n == unsigned => Ok(false),
        n if n == signed => Ok(true),
        found => Err(TxErrorKind::WrongFieldCount {
            unsigned,
            signed,
            found,
        }),
    }
}

/// Strip and check the type byte, then decode the payload list.
pub(crate) fn decode_typed(serialized: &[u8], marker: u8) -> Result<Vec<RlpItem>, TxErrorKind> {
    let Some((&found, payload)) = serialized.split_first() else {
        return Err(RlpError::Header(alloy_rlp::Error::InputTooShort).into());
    };
    if found != marker {
        return Err(TxErrorKind::WrongTransactionType {
            expected: marker,
            found,
        });
    }
    Ok(rlp::decode_list(payload)?)
}

pub(crate) fn encode_typed(marker: u8, values: &[RlpItem]) -> Vec<u8> {
    let mut out = vec![marker];
    out.extend_from_slice(&rlp::encode_list(values));
    out
}

/// Sequential reader over decoded raw values with per-field checks.
pub(crate) struct RawFields<'a> {
    items: std::slice::Iter<'a, RlpItem>,
}

impl<'a> RawFields<'a> {
    pub(crate) fn new(values: &'a [RlpItem]) -> Self {
        Self {
            items: values.iter(),
        }
    }

    fn next_bytes(&mut self, name: &str) -> Result<&'a Bytes, TxErrorKind> {
        let item = self
            .items
            .next()
            .ok_or_else(|| TxErrorKind::InvalidFieldShape(name.to_string()))?;
        validate_not_array(&[(name, item)])?;
        item.as_bytes()
            .ok_or_else(|| TxErrorKind::InvalidFieldShape(name.to_string()))
    }

    pub(crate) fn uint(&mut self, name: &str) -> Result<U256, TxErrorKind> {
        let bytes = self.next_bytes(name)?;
        validate_no_leading_zero(&[(name, &bytes[..])])?;
        validate_bound_256(&[(name, &bytes[..])])?;
        uint_from_be_bytes(bytes).ok_or_else(|| TxErrorKind::IntegerOverflow(name.to_string()))
    }

    /// Empty byte string means contract creation.
    pub(crate) fn to(&mut self) -> Result<Option<Address>, TxErrorKind> {
        let bytes = self.next_bytes("to")?;
        if bytes.is_empty() {
            return Ok(None);
        }
        parse_address(bytes, "to").map(Some)
    }

    pub(crate) fn bytes(&mut self, name: &str) -> Result<Bytes, TxErrorKind> {
        self.next_bytes(name).cloned()
    }

    pub(crate) fn access_list(&mut self) -> Result<AccessList, TxErrorKind> {
        let item = self
            .items
            .next()
            .ok_or_else(|| TxErrorKind::InvalidFieldShape("accessList".into()))?;
        AccessList::from_rlp(item)
    }

    /// `(v, r, s)` under the given field names.
    pub(crate) fn signature(
        &mut self,
        names: [&str; 3],
    ) -> Result<(U256, U256, U256), TxErrorKind> {
        let [v, r, s] = names;
        Ok((self.uint(v)?, self.uint(r)?, self.uint(s)?))
    }
}
