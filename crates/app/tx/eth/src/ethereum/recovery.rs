use alloy_primitives::{keccak256, Address, B256, B512, U256};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use std::sync::OnceLock;

use crate::error::TxErrorKind;

/// A recoverable ECDSA signature with its parity normalized to 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub parity: u8,
    pub r: U256,
    pub s: U256,
}

/// Deterministic (RFC 6979) low-S signature over a 32-byte digest.
pub fn sign_digest(digest: &B256, private_key: &[u8]) -> Result<EcdsaSignature, TxErrorKind> {
    let secret = secret_key(private_key)?;
    let msg =
        Message::from_digest_slice(digest.as_slice()).map_err(|_| TxErrorKind::InvalidSignature)?;
    let (recid, compact) = secp()
        .sign_ecdsa_recoverable(&msg, &secret)
        .serialize_compact();
    let (r, s) = compact.split_at(32);
    let parity = u8::try_from(recid.to_i32()).map_err(|_| TxErrorKind::InvalidSignature)?;
    Ok(EcdsaSignature {
        parity,
        r: U256::from_be_slice(r),
        s: U256::from_be_slice(s),
    })
}

/// Recover the signer's public key from `(digest, v, r, s)` with `v` in
/// `{27, 28}`.
pub fn ecrecover(digest: &B256, v: u64, r: U256, s: U256) -> Result<B512, TxErrorKind> {
    let recid = match v {
        27 | 28 => (v - 27) as i32,
        _ => return Err(TxErrorKind::InvalidSignature),
    };

    let mut compact = [0u8; 64];
    let (r_out, s_out) = compact.split_at_mut(32);
    r_out.copy_from_slice(&r.to_be_bytes::<32>());
    s_out.copy_from_slice(&s.to_be_bytes::<32>());

    let recid = RecoveryId::from_i32(recid).map_err(|_| TxErrorKind::InvalidSignature)?;
    let recoverable = RecoverableSignature::from_compact(&compact, recid)
        .map_err(|_| TxErrorKind::InvalidSignature)?;
    let msg =
        Message::from_digest_slice(digest.as_slice()).map_err(|_| TxErrorKind::InvalidSignature)?;
    let public_key = secp()
        .recover_ecdsa(&msg, &recoverable)
        .map_err(|_| TxErrorKind::InvalidSignature)?;
    uncompressed_payload(&public_key)
}

/// Public key of a 32-byte private key.
pub fn private_key_to_public_key(private_key: &[u8]) -> Result<B512, TxErrorKind> {
    let secret = secret_key(private_key)?;
    uncompressed_payload(&PublicKey::from_secret_key(secp(), &secret))
}

/// Last 20 bytes of the keccak of the public key.
pub fn public_key_to_address(public_key: &B512) -> Address {
    Address::from_word(keccak256(public_key))
}

fn secret_key(private_key: &[u8]) -> Result<SecretKey, TxErrorKind> {
    if private_key.len() != 32 {
        return Err(TxErrorKind::InvalidKeyLength(private_key.len()));
    }
    SecretKey::from_slice(private_key).map_err(|_| TxErrorKind::InvalidPrivateKey)
}

fn uncompressed_payload(public_key: &PublicKey) -> Result<B512, TxErrorKind> {
    let uncompressed = public_key.serialize_uncompressed();
    let payload = uncompressed.get(1..).ok_or(TxErrorKind::InvalidSignature)?;
    Ok(B512::from_slice(payload))
}

fn secp() -> &'static Secp256k1<All> {
    static SECP: OnceLock<Secp256k1<All>> = OnceLock::new();
    SECP.get_or_init(Secp256k1::new)
}
