//! Numeric and byte helpers shared by the codec and the transaction types.
//!
//! Integers travel on the wire as minimal big-endian byte strings: zero is the
//! empty string and no encoding may start with a `0x00` byte.

use alloy_primitives::{Bytes, U256};

/// `2^256 - 1`.
pub const MAX_INTEGER: U256 = U256::MAX;

/// Half of the secp256k1 group order. Signatures with `s` above this value are
/// malleable and rejected once EIP-2 is active.
pub const SECP256K1_N_DIV_2: U256 = U256::from_limbs([
    0xdfe9_2f46_681b_20a0,
    0x5d57_6e73_57a4_501d,
    0xffff_ffff_ffff_ffff,
    0x7fff_ffff_ffff_ffff,
]);

/// Strip leading zero bytes.
pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first_non_zero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes.get(first_non_zero..).unwrap_or_default()
}

/// Returns true if `bytes` would be rejected as a non-minimal integer encoding.
pub fn has_leading_zero(bytes: &[u8]) -> bool {
    bytes.first() == Some(&0)
}

/// Minimal big-endian encoding of an unsigned integer. Zero encodes as `[]`.
pub fn uint_to_unpadded(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes_trimmed_vec())
}

/// Interpret a big-endian byte string as an unsigned integer.
///
/// Returns `None` if the value does not fit in 256 bits. Leading zeros are
/// accepted here; callers that require minimal encodings check separately.
pub fn uint_from_be_bytes(bytes: &[u8]) -> Option<U256> {
    U256::try_from_be_slice(strip_leading_zeros(bytes))
}

/// Concatenate byte slices into a single vector.
pub fn concat_bytes(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(len);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Byte-wise equality.
pub fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    a == b
}

/// `0x`-prefixed minimal hex quantity, `0x0` for zero.
pub fn quantity_to_hex(value: U256) -> String {
    format!("{value:#x}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_half_order_constant() {
        let expected = U256::from_str_radix(
            "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0",
            16,
        )
        .unwrap();
        assert_eq!(SECP256K1_N_DIV_2, expected);
    }

    #[test]
    fn test_unpadded_encoding() {
        assert!(uint_to_unpadded(U256::ZERO).is_empty());
        assert_eq!(uint_to_unpadded(U256::from(1u64)).as_ref(), &[0x01]);
        assert_eq!(uint_to_unpadded(U256::from(0x0100u64)).as_ref(), &[0x01, 0x00]);
        assert_eq!(uint_to_unpadded(MAX_INTEGER).len(), 32);
    }

    #[test]
    fn test_uint_from_bytes_bounds() {
        assert_eq!(uint_from_be_bytes(&[]), Some(U256::ZERO));
        assert_eq!(uint_from_be_bytes(&[0x00, 0x2a]), Some(U256::from(42u64)));
        assert_eq!(uint_from_be_bytes(&[0xff; 32]), Some(MAX_INTEGER));
        assert_eq!(uint_from_be_bytes(&[0x01; 33]), None);

        let mut padded = vec![0u8; 8];
        padded.extend_from_slice(&[0xff; 32]);
        assert_eq!(uint_from_be_bytes(&padded), Some(MAX_INTEGER));
    }

    #[test]
    fn test_leading_zero_detection() {
        assert!(has_leading_zero(&[0x00]));
        assert!(has_leading_zero(&[0x00, 0x01]));
        assert!(!has_leading_zero(&[]));
        assert!(!has_leading_zero(&[0x01, 0x00]));
        assert_eq!(strip_leading_zeros(&[0, 0, 5, 0]), &[5, 0]);
        assert_eq!(strip_leading_zeros(&[0, 0]), &[] as &[u8]);
    }

    #[test]
    fn test_concat_and_hex() {
        assert_eq!(concat_bytes(&[&[1, 2], &[], &[3]]), vec![1, 2, 3]);
        assert!(bytes_eq(&[1, 2], &[1, 2]));
        assert_eq!(quantity_to_hex(U256::ZERO), "0x0");
        assert_eq!(quantity_to_hex(U256::from(806u64)), "0x326");
    }
}
