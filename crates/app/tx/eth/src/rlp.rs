//! Recursive-length-prefix codec over a dynamic value tree.
//!
//! Transactions are decoded into [`RlpItem`] first and validated field by
//! field afterwards, so shape errors (a list where a scalar was expected) are
//! reported with the offending field name instead of a generic decode error.
//!
//! Header parsing is delegated to [`alloy_rlp::Header`], which already rejects
//! non-canonical sizes, single bytes wrapped in a string header and length
//! prefixes with leading zeros.

use alloy_primitives::{Bytes, U256};
use alloy_rlp::{BufMut, Header, EMPTY_STRING_CODE};
use thiserror::Error;

use crate::primitives::uint_to_unpadded;

/// Codec failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RlpError {
    /// Header malformed, truncated or non-canonical.
    #[error("invalid rlp header: {0}")]
    Header(#[from] alloy_rlp::Error),

    /// Input continues after the top-level item.
    #[error("{0} trailing bytes after rlp item")]
    TrailingBytes(usize),

    /// A list was required at the top level.
    #[error("expected rlp list, found byte string")]
    ExpectedList,

    /// Lists nested deeper than [`MAX_DEPTH`].
    #[error("rlp lists nested deeper than {0} levels")]
    DepthLimitExceeded(usize),
}

/// Deepest list nesting the decoder accepts. Transactions need four levels
/// (payload, access list, entry, storage keys).
pub const MAX_DEPTH: usize = 16;

/// A decoded value: a byte string or a list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Bytes),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// The empty byte string, used for zero and for an absent recipient.
    pub fn empty() -> Self {
        RlpItem::Bytes(Bytes::new())
    }

    /// Minimal big-endian integer item.
    pub fn uint(value: U256) -> Self {
        RlpItem::Bytes(uint_to_unpadded(value))
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        RlpItem::Bytes(bytes.into())
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RlpItem::Bytes(b) => Some(b),
            RlpItem::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Some(items),
            RlpItem::Bytes(_) => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<RlpItem>> {
        match self {
            RlpItem::List(items) => Some(items),
            RlpItem::Bytes(_) => None,
        }
    }

    fn payload_length(&self) -> usize {
        match self {
            RlpItem::Bytes(b) => b.len(),
            RlpItem::List(items) => items.iter().map(RlpItem::length).sum(),
        }
    }

    /// Total encoded length including the header.
    pub fn length(&self) -> usize {
        match self {
            RlpItem::Bytes(b) if is_single_byte(b) => 1,
            _ => {
                let payload = self.payload_length();
                alloy_rlp::length_of_length(payload) + payload
            }
        }
    }

    /// Append the canonical encoding to `out`.
    pub fn encode_into(&self, out: &mut dyn BufMut) {
        match self {
            RlpItem::Bytes(b) if is_single_byte(b) => out.put_slice(b),
            RlpItem::Bytes(b) => {
                Header {
                    list: false,
                    payload_length: b.len(),
                }
                .encode(out);
                out.put_slice(b);
            }
            RlpItem::List(items) => {
                Header {
                    list: true,
                    payload_length: self.payload_length(),
                }
                .encode(out);
                for item in items {
                    item.encode_into(out);
                }
            }
        }
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }
}

fn is_single_byte(bytes: &[u8]) -> bool {
    matches!(bytes, [b] if *b < EMPTY_STRING_CODE)
}

/// Encode a value into its canonical byte form.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::with_capacity(item.length());
    item.encode_into(&mut out);
    out
}

/// Encode a list of values.
pub fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let payload_length: usize = items.iter().map(RlpItem::length).sum();
    let mut out = Vec::with_capacity(alloy_rlp::length_of_length(payload_length) + payload_length);
    Header {
        list: true,
        payload_length,
    }
    .encode(&mut out);
    for item in items {
        item.encode_into(&mut out);
    }
    out
}

/// Decode exactly one value; any remaining input is an error.
pub fn decode(bytes: &[u8]) -> Result<RlpItem, RlpError> {
    let mut buf = bytes;
    let item = decode_item(&mut buf, 0)?;
    if !buf.is_empty() {
        return Err(RlpError::TrailingBytes(buf.len()));
    }
    Ok(item)
}

/// Decode exactly one value which must be a list.
pub fn decode_list(bytes: &[u8]) -> Result<Vec<RlpItem>, RlpError> {
    decode(bytes)?.into_list().ok_or(RlpError::ExpectedList)
}

fn decode_item(buf: &mut &[u8], depth: usize) -> Result<RlpItem, RlpError> {
    let header = Header::decode(buf)?;
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;

    if !header.list {
        return Ok(RlpItem::Bytes(Bytes::copy_from_slice(payload)));
    }

    if depth >= MAX_DEPTH {
        return Err(RlpError::DepthLimitExceeded(MAX_DEPTH));
    }
    let mut inner = payload;
    let mut items = Vec::new();
    while !inner.is_empty() {
        items.push(decode_item(&mut inner, depth + 1)?);
    }
    Ok(RlpItem::List(items))
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn b(bytes: &[u8]) -> RlpItem {
        RlpItem::bytes(bytes.to_vec())
    }

    #[test]
    fn test_encode_short_forms() {
        assert_eq!(encode(&RlpItem::empty()), vec![0x80]);
        assert_eq!(encode(&b(&[0x00])), vec![0x00]);
        assert_eq!(encode(&b(&[0x7f])), vec![0x7f]);
        assert_eq!(encode(&b(&[0x80])), vec![0x81, 0x80]);
        assert_eq!(encode(&b(b"dog")), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(encode(&RlpItem::List(vec![])), vec![0xc0]);
        assert_eq!(encode(&RlpItem::uint(U256::from(1024u64))), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn test_encode_nested_list() {
        // The set-theoretic representation of three: [ [], [[]], [ [], [[]] ] ]
        let three = RlpItem::List(vec![
            RlpItem::List(vec![]),
            RlpItem::List(vec![RlpItem::List(vec![])]),
            RlpItem::List(vec![
                RlpItem::List(vec![]),
                RlpItem::List(vec![RlpItem::List(vec![])]),
            ]),
        ]);
        let encoded = encode(&three);
        assert_eq!(encoded, vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]);
        assert_eq!(decode(&encoded).unwrap(), three);
    }

    #[test]
    fn test_long_string_header() {
        let payload = vec![0xaa; 56];
        let encoded = encode(&b(&payload));
        assert_eq!(&encoded[..2], &[0xb8, 56]);
        assert_eq!(encoded.len(), 58);
        assert_eq!(decode(&encoded).unwrap(), b(&payload));
    }

    #[test]
    fn test_encode_list_matches_item_encoding() {
        let items = vec![b(b"cat"), b(b"dog")];
        assert_eq!(encode_list(&items), encode(&RlpItem::List(items.clone())));
        assert_eq!(
            encode_list(&items),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        assert_eq!(decode(&[0x80, 0x00]), Err(RlpError::TrailingBytes(1)));
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        assert!(matches!(decode(&[0x83, b'd', b'o']), Err(RlpError::Header(_))));
        assert!(matches!(decode(&[0xb8]), Err(RlpError::Header(_))));
        assert!(matches!(decode(&[0xc2, 0x80]), Err(RlpError::Header(_))));
        assert!(matches!(decode(&[]), Err(RlpError::Header(_))));
    }

    #[test]
    fn test_decode_rejects_non_canonical_forms() {
        // single byte below 0x80 wrapped in a string header
        assert!(matches!(decode(&[0x81, 0x05]), Err(RlpError::Header(_))));
        // long form used for a short payload
        let mut overlong = vec![0xb8, 0x02];
        overlong.extend_from_slice(&[0xaa, 0xbb]);
        assert!(matches!(decode(&overlong), Err(RlpError::Header(_))));
        // length of length with a leading zero
        let mut padded_len = vec![0xb9, 0x00, 0x38];
        padded_len.extend_from_slice(&[0xaa; 56]);
        assert!(matches!(decode(&padded_len), Err(RlpError::Header(_))));
    }

    /// `depth` lists wrapped around an empty list, built outside-in without
    /// recursion.
    fn nested(depth: usize) -> Vec<u8> {
        let mut headers = Vec::with_capacity(depth);
        let mut inner_len = 1;
        for _ in 0..depth {
            let mut header = Vec::new();
            Header {
                list: true,
                payload_length: inner_len,
            }
            .encode(&mut header);
            inner_len += header.len();
            headers.push(header);
        }
        let mut out = Vec::with_capacity(inner_len);
        for header in headers.iter().rev() {
            out.extend_from_slice(header);
        }
        out.push(0xc0);
        out
    }

    #[test]
    fn test_decode_nesting_limit() {
        // MAX_DEPTH wrappers around an empty list: MAX_DEPTH + 1 list levels.
        assert!(decode(&nested(MAX_DEPTH - 1)).is_ok());
        assert_eq!(
            decode(&nested(MAX_DEPTH)),
            Err(RlpError::DepthLimitExceeded(MAX_DEPTH))
        );
        assert_eq!(
            decode_list(&nested(200_000)),
            Err(RlpError::DepthLimitExceeded(MAX_DEPTH))
        );
    }

    #[test]
    fn test_decode_list_requires_list() {
        assert_eq!(decode_list(&[0x80]), Err(RlpError::ExpectedList));
        assert_eq!(decode_list(&[0xc1, 0x80]).unwrap(), vec![RlpItem::empty()]);
    }

    #[test]
    fn test_item_length_matches_encoding() {
        let item = RlpItem::List(vec![
            b(&[0x01]),
            b(&[0xff; 70]),
            RlpItem::List(vec![b(&[0x00; 3]); 20]),
        ]);
        assert_eq!(item.length(), encode(&item).len());
    }
}
