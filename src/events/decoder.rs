//! Generic log decoding against an [`EventSchema`].

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, TxHash, B256, U256};

use crate::blockchain::types::ContractEvent;
use crate::error::{GatewayError, GatewayResult};
use crate::events::schema::{EventSchema, FieldDescriptor, FieldType};
use crate::observability::metrics;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    Bytes32(B256),
    String(String),
    /// An indexed dynamic value; only its keccak hash is on chain.
    Hash(B256),
}

impl FieldValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            FieldValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            FieldValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A log decoded against its schema, fields in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub schema: EventSchema,
    pub fields: Vec<(&'static str, FieldValue)>,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: TxHash,
    pub block_timestamp: Option<u64>,
}

impl DecodedEvent {
    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

fn malformed(schema: &EventSchema, event: &ContractEvent, reason: impl std::fmt::Display) -> GatewayError {
    GatewayError::MalformedEvent(format!(
        "{} in tx {} (log {}): {}",
        schema.name, event.transaction_hash, event.log_index, reason
    ))
}

fn decode_topic(field: &FieldDescriptor, topic: B256) -> Result<FieldValue, String> {
    if field.ty.is_dynamic() {
        return Ok(FieldValue::Hash(topic));
    }
    match field.ty {
        FieldType::Address => {
            if topic[..12].iter().any(|b| *b != 0) {
                return Err(format!("topic for '{}' is not a padded address", field.name));
            }
            Ok(FieldValue::Address(Address::from_slice(&topic[12..])))
        }
        FieldType::Uint256 => Ok(FieldValue::Uint(U256::from_be_bytes(topic.0))),
        FieldType::Bool => match U256::from_be_bytes(topic.0) {
            v if v == U256::ZERO => Ok(FieldValue::Bool(false)),
            v if v == U256::from(1u8) => Ok(FieldValue::Bool(true)),
            _ => Err(format!("topic for '{}' is not a bool", field.name)),
        },
        FieldType::Bytes32 => Ok(FieldValue::Bytes32(topic)),
        FieldType::String => Ok(FieldValue::Hash(topic)),
    }
}

fn from_dyn(field: &FieldDescriptor, value: DynSolValue) -> Result<FieldValue, String> {
    match (field.ty, value) {
        (FieldType::Address, DynSolValue::Address(a)) => Ok(FieldValue::Address(a)),
        (FieldType::Uint256, DynSolValue::Uint(v, _)) => Ok(FieldValue::Uint(v)),
        (FieldType::Bool, DynSolValue::Bool(b)) => Ok(FieldValue::Bool(b)),
        (FieldType::Bytes32, DynSolValue::FixedBytes(w, _)) => Ok(FieldValue::Bytes32(w)),
        (FieldType::String, DynSolValue::String(s)) => Ok(FieldValue::String(s)),
        (ty, other) => Err(format!(
            "field '{}' expected {}, decoded {:?}",
            field.name,
            ty.sol_name(),
            other
        )),
    }
}

/// Decode `event` against `schema`.
///
/// Topic 0 must equal the schema's signature hash and the topic count must
/// match the number of indexed fields. Any mismatch is `MalformedEvent`.
pub fn decode_event(schema: &EventSchema, event: &ContractEvent) -> GatewayResult<DecodedEvent> {
    match event.topics.first() {
        Some(topic) if *topic == schema.topic0() => {}
        Some(topic) => return Err(malformed(schema, event, format!("unexpected topic0 {}", topic))),
        None => return Err(malformed(schema, event, "log has no topics")),
    }
    if event.topics.len() != schema.topic_count() {
        return Err(malformed(
            schema,
            event,
            format!("expected {} topics, got {}", schema.topic_count(), event.topics.len()),
        ));
    }

    let mut indexed = schema
        .indexed_fields()
        .zip(event.topics.iter().skip(1))
        .map(|(field, topic)| decode_topic(field, *topic).map(|v| (field.name, v)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| malformed(schema, event, e))?
        .into_iter();

    let data_fields: Vec<&FieldDescriptor> = schema.data_fields().collect();
    let data_type = DynSolType::Tuple(data_fields.iter().map(|f| f.ty.dyn_type()).collect());
    let decoded = data_type
        .abi_decode_sequence(&event.data)
        .map_err(|e| malformed(schema, event, format!("data does not decode: {}", e)))?;
    let values = match decoded {
        DynSolValue::Tuple(values) if values.len() == data_fields.len() => values,
        other => return Err(malformed(schema, event, format!("unexpected data shape {:?}", other))),
    };
    let mut data = data_fields
        .into_iter()
        .zip(values)
        .map(|(field, value)| from_dyn(field, value).map(|v| (field.name, v)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| malformed(schema, event, e))?
        .into_iter();

    // Reassemble in declaration order.
    let mut fields = Vec::with_capacity(schema.fields.len());
    for field in schema.fields {
        let next = if field.indexed { indexed.next() } else { data.next() };
        match next {
            Some(pair) => fields.push(pair),
            None => return Err(malformed(schema, event, format!("missing field '{}'", field.name))),
        }
    }

    metrics::record_event_decoded(schema.name);

    Ok(DecodedEvent {
        schema: *schema,
        fields,
        block_number: event.block_number,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash,
        block_timestamp: event.block_timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::abi::ITCoin;
    use crate::events::schema::{TRANSFER, TRANSFER_WITH_DETAILS};
    use alloy::primitives::{Bytes, LogData};
    use alloy::sol_types::SolEvent;

    fn raw(log: LogData) -> ContractEvent {
        ContractEvent {
            address: Address::repeat_byte(0xcc),
            topics: log.topics().to_vec(),
            data: log.data,
            block_number: 5,
            log_index: 2,
            transaction_hash: TxHash::repeat_byte(0x01),
            block_timestamp: None,
        }
    }

    #[test]
    fn test_decode_transfer() {
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        let log = ITCoin::Transfer {
            from,
            to,
            value: U256::from(1234u64),
        }
        .encode_log_data();

        let decoded = decode_event(&TRANSFER, &raw(log)).unwrap();
        assert_eq!(decoded.name(), "Transfer");
        assert_eq!(decoded.field("from").and_then(FieldValue::as_address), Some(from));
        assert_eq!(decoded.field("to").and_then(FieldValue::as_address), Some(to));
        assert_eq!(
            decoded.field("value").and_then(FieldValue::as_uint),
            Some(U256::from(1234u64))
        );
        assert_eq!(decoded.block_number, 5);
        assert_eq!(decoded.log_index, 2);
    }

    #[test]
    fn test_decode_transfer_with_details() {
        let log = ITCoin::TransferWithDetails {
            from: Address::repeat_byte(0x11),
            to: Address::repeat_byte(0x22),
            value: U256::from(7u64),
            message: "invoice 9".into(),
            timestamp: U256::from(1_700_000_000u64),
        }
        .encode_log_data();

        let decoded = decode_event(&TRANSFER_WITH_DETAILS, &raw(log)).unwrap();
        let names: Vec<_> = decoded.fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["from", "to", "value", "message", "timestamp"]);
        assert_eq!(decoded.field("message").and_then(FieldValue::as_str), Some("invoice 9"));
    }

    #[test]
    fn test_wrong_topic_count_is_malformed() {
        let mut event = raw(
            ITCoin::Transfer {
                from: Address::ZERO,
                to: Address::ZERO,
                value: U256::ZERO,
            }
            .encode_log_data(),
        );
        event.topics.pop();
        assert!(matches!(
            decode_event(&TRANSFER, &event),
            Err(GatewayError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_truncated_data_is_malformed() {
        let mut event = raw(
            ITCoin::Transfer {
                from: Address::ZERO,
                to: Address::ZERO,
                value: U256::from(1u64),
            }
            .encode_log_data(),
        );
        event.data = Bytes::from_static(&[0u8; 5]);
        assert!(matches!(
            decode_event(&TRANSFER, &event),
            Err(GatewayError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_dirty_address_topic_is_malformed() {
        let mut event = raw(
            ITCoin::Transfer {
                from: Address::ZERO,
                to: Address::ZERO,
                value: U256::from(1u64),
            }
            .encode_log_data(),
        );
        event.topics[1] = B256::repeat_byte(0xff);
        assert!(matches!(
            decode_event(&TRANSFER, &event),
            Err(GatewayError::MalformedEvent(_))
        ));
    }

    #[test]
    fn test_foreign_topic0_is_malformed() {
        let event = raw(
            ITCoin::Transfer {
                from: Address::ZERO,
                to: Address::ZERO,
                value: U256::from(1u64),
            }
            .encode_log_data(),
        );
        assert!(matches!(
            decode_event(&TRANSFER_WITH_DETAILS, &event),
            Err(GatewayError::MalformedEvent(_))
        ));
    }
}
