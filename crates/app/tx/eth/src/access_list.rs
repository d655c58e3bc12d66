//! Access lists: addresses and storage slots a transaction declares up front.

use alloy_primitives::{Address, B256};

use crate::error::TxErrorKind;
use crate::rlp::RlpItem;

/// One accessed account and the storage keys touched under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

impl AccessListItem {
    pub fn new(address: Address, storage_keys: Vec<B256>) -> Self {
        Self {
            address,
            storage_keys,
        }
    }
}

/// Ordered sequence of [`AccessListItem`]. Order and duplicates are preserved
/// as given; both affect the encoding and the data fee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccessList(pub Vec<AccessListItem>);

impl AccessList {
    pub fn new(items: Vec<AccessListItem>) -> Self {
        Self(items)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessListItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn address_count(&self) -> u64 {
        self.0.len() as u64
    }

    pub fn storage_key_count(&self) -> u64 {
        self.0.iter().map(|item| item.storage_keys.len() as u64).sum()
    }

    /// `[[address, [key, ...]], ...]`
    pub fn to_rlp(&self) -> RlpItem {
        RlpItem::List(
            self.0
                .iter()
                .map(|item| {
                    RlpItem::List(vec![
                        RlpItem::bytes(item.address.to_vec()),
                        RlpItem::List(
                            item.storage_keys
                                .iter()
                                .map(|key| RlpItem::bytes(key.to_vec()))
                                .collect(),
                        ),
                    ])
                })
                .collect(),
        )
    }

    pub fn from_rlp(item: &RlpItem) -> Result<Self, TxErrorKind> {
        let entries = item
            .as_list()
            .ok_or_else(|| TxErrorKind::InvalidFieldShape("accessList".into()))?;

        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let field = format!("accessList[{index}]");
            let (address, keys) = match entry.as_list() {
                Some([address, keys]) => (address, keys),
                _ => return Err(TxErrorKind::InvalidFieldShape(field)),
            };

            let address = address
                .as_bytes()
                .ok_or_else(|| TxErrorKind::InvalidFieldShape(format!("{field}.address")))?;
            let address = parse_address(address, &format!("{field}.address"))?;

            let keys = keys
                .as_list()
                .ok_or_else(|| TxErrorKind::InvalidFieldShape(format!("{field}.storageKeys")))?;
            let storage_keys = keys
                .iter()
                .enumerate()
                .map(|(key_index, key)| {
                    let name = format!("{field}.storageKeys[{key_index}]");
                    let key = key
                        .as_bytes()
                        .ok_or_else(|| TxErrorKind::InvalidFieldShape(name.clone()))?;
                    parse_storage_key(key, &name)
                })
                .collect::<Result<Vec<_>, _>>()?;

            items.push(AccessListItem {
                address,
                storage_keys,
            });
        }
        Ok(Self(items))
    }
}

impl From<Vec<AccessListItem>> for AccessList {
    fn from(items: Vec<AccessListItem>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a AccessList {
    type Item = &'a AccessListItem;
    type IntoIter = std::slice::Iter<'a, AccessListItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) fn parse_address(bytes: &[u8], field: &str) -> Result<Address, TxErrorKind> {
    if bytes.len() != 20 {
        return Err(TxErrorKind::InvalidFieldLength {
            field: field.to_string(),
            expected: 20,
            found: bytes.len(),
        });
    }
    Ok(Address::from_slice(bytes))
}

pub(crate) fn parse_storage_key(bytes: &[u8], field: &str) -> Result<B256, TxErrorKind> {
    if bytes.len() != 32 {
        return Err(TxErrorKind::InvalidFieldLength {
            field: field.to_string(),
            expected: 32,
            found: bytes.len(),
        });
    }
    Ok(B256::from_slice(bytes))
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rlp;

    fn sample() -> AccessList {
        AccessList::new(vec![
            AccessListItem::new(Address::repeat_byte(0x01), vec![B256::repeat_byte(0x01)]),
            AccessListItem::new(
                Address::repeat_byte(0x02),
                vec![B256::repeat_byte(0x0a), B256::repeat_byte(0x0b)],
            ),
        ])
    }

    #[test]
    fn test_counts() {
        let list = sample();
        assert_eq!(list.address_count(), 2);
        assert_eq!(list.storage_key_count(), 3);
        assert!(AccessList::default().is_empty());
    }

    #[test]
    fn test_encoding_layout() {
        let single = AccessList::new(vec![AccessListItem::new(
            Address::repeat_byte(0x01),
            vec![B256::repeat_byte(0x01)],
        )]);
        let encoded = rlp::encode(&single.to_rlp());
        // outer list, entry list, 20-byte address, key list, 32-byte key
        assert_eq!(&encoded[..4], &[0xf8, 0x38, 0xf7, 0x94]);
        assert_eq!(single.to_rlp().length(), 58);
        assert_eq!(AccessList::from_rlp(&rlp::decode(&encoded).unwrap()).unwrap(), single);
    }

    #[test]
    fn test_rejects_short_address() {
        let item = RlpItem::List(vec![RlpItem::List(vec![
            RlpItem::bytes(vec![0x01; 19]),
            RlpItem::List(vec![]),
        ])]);
        assert_eq!(
            AccessList::from_rlp(&item),
            Err(TxErrorKind::InvalidFieldLength {
                field: "accessList[0].address".into(),
                expected: 20,
                found: 19
            })
        );
    }

    #[test]
    fn test_rejects_long_storage_key() {
        let item = RlpItem::List(vec![RlpItem::List(vec![
            RlpItem::bytes(vec![0x01; 20]),
            RlpItem::List(vec![RlpItem::bytes(vec![0x01; 33])]),
        ])]);
        assert!(matches!(
            AccessList::from_rlp(&item),
            Err(TxErrorKind::InvalidFieldLength { expected: 32, found: 33, .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_entries() {
        let three_fields = RlpItem::List(vec![RlpItem::List(vec![
            RlpItem::bytes(vec![0x01; 20]),
            RlpItem::List(vec![]),
            RlpItem::empty(),
        ])]);
        assert!(matches!(
            AccessList::from_rlp(&three_fields),
            Err(TxErrorKind::InvalidFieldShape(_))
        ));

        let keys_not_list = RlpItem::List(vec![RlpItem::List(vec![
            RlpItem::bytes(vec![0x01; 20]),
            RlpItem::empty(),
        ])]);
        assert!(matches!(
            AccessList::from_rlp(&keys_not_list),
            Err(TxErrorKind::InvalidFieldShape(name)) if name == "accessList[0].storageKeys"
        ));

        assert!(matches!(
            AccessList::from_rlp(&RlpItem::empty()),
            Err(TxErrorKind::InvalidFieldShape(_))
        ));
    }
}
