//! Hex-string JSON projection of a transaction.

use alloy_primitives::{hex, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::access_list::{parse_address, parse_storage_key, AccessList, AccessListItem};
use crate::data::{TxData, TxType};
use crate::error::{TxError, TxErrorKind};
use crate::primitives::quantity_to_hex;

/// Every field as a `0x` hex string. Quantities are minimal (`0x0` for zero);
/// absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonTx {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<JsonAccessListItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    #[serde(rename = "pV", default, skip_serializing_if = "Option::is_none")]
    pub priority_v: Option<String>,
    #[serde(rename = "pR", default, skip_serializing_if = "Option::is_none")]
    pub priority_r: Option<String>,
    #[serde(rename = "pS", default, skip_serializing_if = "Option::is_none")]
    pub priority_s: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonAccessListItem {
    pub address: String,
    pub storage_keys: Vec<String>,
}

fn quantity(value: Option<U256>) -> Option<String> {
    value.map(quantity_to_hex)
}

impl From<&TxData> for JsonTx {
    fn from(data: &TxData) -> Self {
        let access_list = data.access_list.as_ref().map(|list| {
            list.iter()
                .map(|item| JsonAccessListItem {
                    address: hex::encode_prefixed(item.address),
                    storage_keys: item.storage_keys.iter().map(hex::encode_prefixed).collect(),
                })
                .collect()
        });
        Self {
            tx_type: data
                .tx_type
                .map(|ty| quantity_to_hex(U256::from(ty.marker()))),
            chain_id: quantity(data.chain_id),
            nonce: quantity(data.nonce),
            gas_price: quantity(data.gas_price),
            max_priority_fee_per_gas: quantity(data.max_priority_fee_per_gas),
            max_fee_per_gas: quantity(data.max_fee_per_gas),
            gas_limit: quantity(data.gas_limit),
            to: data.to.map(hex::encode_prefixed),
            value: quantity(data.value),
            data: data.data.as_ref().map(|bytes| hex::encode_prefixed(bytes)),
            access_list,
            v: quantity(data.v),
            r: quantity(data.r),
            s: quantity(data.s),
            priority_v: quantity(data.priority_v),
            priority_r: quantity(data.priority_r),
            priority_s: quantity(data.priority_s),
        }
    }
}

fn strip_prefix<'a>(text: &'a str, field: &str) -> Result<&'a str, TxErrorKind> {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| TxErrorKind::InvalidFieldEncoding(field.to_string()))
}

fn parse_quantity(text: &str, field: &str) -> Result<U256, TxErrorKind> {
    let digits = strip_prefix(text, field)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TxErrorKind::InvalidFieldEncoding(field.to_string()));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > 64 {
        return Err(TxErrorKind::IntegerOverflow(field.to_string()));
    }
    if significant.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(significant, 16)
        .map_err(|_| TxErrorKind::InvalidFieldEncoding(field.to_string()))
}

fn parse_bytes(text: &str, field: &str) -> Result<Vec<u8>, TxErrorKind> {
    let digits = strip_prefix(text, field)?;
    hex::decode(digits).map_err(|_| TxErrorKind::InvalidFieldEncoding(field.to_string()))
}

fn opt_quantity(text: Option<&String>, field: &str) -> Result<Option<U256>, TxErrorKind> {
    text.map(|t| parse_quantity(t, field)).transpose()
}

fn parse_access_list(items: &[JsonAccessListItem]) -> Result<AccessList, TxErrorKind> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let address = parse_address(
                &parse_bytes(&item.address, "accessList.address")?,
                &format!("accessList[{i}].address"),
            )?;
            let storage_keys = item
                .storage_keys
                .iter()
                .enumerate()
                .map(|(j, key)| {
                    let field = format!("accessList[{i}].storageKeys[{j}]");
                    parse_storage_key(&parse_bytes(key, &field)?, &field)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AccessListItem::new(address, storage_keys))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AccessList::new)
}

fn parse_json(json: &JsonTx) -> Result<TxData, TxErrorKind> {
    let tx_type = match opt_quantity(json.tx_type.as_ref(), "type")? {
        None => None,
        Some(marker) => {
            let marker = u8::try_from(marker)
                .map_err(|_| TxErrorKind::InvalidFieldEncoding("type".to_string()))?;
            Some(
                TxType::from_marker(marker)
                    .ok_or(TxErrorKind::UnsupportedTransactionType(marker))?,
            )
        }
    };
    let to = json
        .to
        .as_ref()
        .map(|to| parse_address(&parse_bytes(to, "to")?, "to"))
        .transpose()?;
    let data = json
        .data
        .as_ref()
        .map(|data| parse_bytes(data, "data").map(Bytes::from))
        .transpose()?;
    let access_list = json
        .access_list
        .as_deref()
        .map(parse_access_list)
        .transpose()?;

    Ok(TxData {
        tx_type,
        chain_id: opt_quantity(json.chain_id.as_ref(), "chainId")?,
        nonce: opt_quantity(json.nonce.as_ref(), "nonce")?,
        gas_price: opt_quantity(json.gas_price.as_ref(), "gasPrice")?,
        max_priority_fee_per_gas: opt_quantity(
            json.max_priority_fee_per_gas.as_ref(),
            "maxPriorityFeePerGas",
        )?,
        max_fee_per_gas: opt_quantity(json.max_fee_per_gas.as_ref(), "maxFeePerGas")?,
        gas_limit: opt_quantity(json.gas_limit.as_ref(), "gasLimit")?,
        to,
        value: opt_quantity(json.value.as_ref(), "value")?,
        data,
        access_list,
        v: opt_quantity(json.v.as_ref(), "v")?,
        r: opt_quantity(json.r.as_ref(), "r")?,
        s: opt_quantity(json.s.as_ref(), "s")?,
        priority_v: opt_quantity(json.priority_v.as_ref(), "pV")?,
        priority_r: opt_quantity(json.priority_r.as_ref(), "pR")?,
        priority_s: opt_quantity(json.priority_s.as_ref(), "pS")?,
    })
}

impl TryFrom<&JsonTx> for TxData {
    type Error = TxError;

    fn try_from(json: &JsonTx) -> Result<Self, Self::Error> {
        parse_json(json).map_err(TxError::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};

    fn sample() -> TxData {
        TxData {
            tx_type: Some(TxType::Priority),
            chain_id: Some(U256::from(4)),
            nonce: Some(U256::ZERO),
            max_fee_per_gas: Some(U256::from(10)),
            gas_limit: Some(U256::from(100)),
            to: Some(Address::repeat_byte(0x01)),
            data: Some(Bytes::from(vec![0x01, 0x02, 0x00])),
            access_list: Some(AccessList::new(vec![AccessListItem::new(
                Address::repeat_byte(0x01),
                vec![B256::repeat_byte(0x01)],
            )])),
            priority_v: Some(U256::from(1)),
            ..TxData::default()
        }
    }

    #[test]
    fn test_hex_fields_and_omission() {
        let json = serde_json::to_value(JsonTx::from(&sample())).unwrap();
        assert_eq!(json["type"], "0x40");
        assert_eq!(json["chainId"], "0x4");
        assert_eq!(json["nonce"], "0x0");
        assert_eq!(json["maxFeePerGas"], "0xa");
        assert_eq!(json["data"], "0x010200");
        assert_eq!(json["pV"], "0x1");
        assert_eq!(json["to"], "0x0101010101010101010101010101010101010101");
        assert_eq!(
            json["accessList"][0]["storageKeys"][0],
            format!("0x{}", "01".repeat(32))
        );
        assert!(json.get("gasPrice").is_none());
        assert!(json.get("v").is_none());
        assert!(json.get("pR").is_none());
    }

    #[test]
    fn test_parse_back() {
        let json = JsonTx::from(&sample());
        assert_eq!(TxData::try_from(&json).unwrap(), sample());
    }

    #[test]
    fn test_parse_errors() {
        let json = JsonTx {
            nonce: Some(format!("0x1{}", "0".repeat(64))),
            ..JsonTx::default()
        };
        assert_eq!(
            TxData::try_from(&json).unwrap_err().kind(),
            &TxErrorKind::IntegerOverflow("nonce".to_string())
        );

        let json = JsonTx {
            value: Some("0xzz".to_string()),
            ..JsonTx::default()
        };
        assert_eq!(
            TxData::try_from(&json).unwrap_err().kind(),
            &TxErrorKind::InvalidFieldEncoding("value".to_string())
        );

        let json = JsonTx {
            to: Some("0x0102".to_string()),
            ..JsonTx::default()
        };
        assert!(matches!(
            TxData::try_from(&json).unwrap_err().kind(),
            TxErrorKind::InvalidFieldLength { .. }
        ));
    }
}
