//! Transaction variants and the signing primitives they share.

mod eip1559;
mod eip2930;
mod legacy;
mod priority;
pub mod recovery;

pub use eip1559::Eip1559Tx;
pub use eip2930::Eip2930Tx;
pub use legacy::{LegacyTx, ReplayProtection};
pub use priority::PriorityTx;
pub use recovery::EcdsaSignature;

use alloy_primitives::U256;

use crate::data::TxData;
use crate::error::TxResult;
use crate::traits::TypedTransaction;

/// Sign the signing hash of a typed transaction and return its field data
/// with the primary signature filled in. Parity goes into `v` as 0 or 1.
pub(crate) fn sign_typed<T: TypedTransaction>(tx: &T, private_key: &[u8]) -> TxResult<TxData> {
    let sig = recovery::sign_digest(&tx.signing_hash(), private_key)
        .map_err(|kind| tx.error(kind))?;
    tracing::debug!(tx_type = tx.tx_type(), "signed transaction");

    let mut data = tx.to_tx_data();
    data.v = Some(U256::from(sig.parity));
    data.r = Some(sig.r);
    data.s = Some(sig.s);
    Ok(data)
}
