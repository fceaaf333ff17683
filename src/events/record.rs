//! Transaction records folded from decoded events.

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;

use crate::error::{GatewayError, GatewayResult};
use crate::events::decoder::{DecodedEvent, FieldValue};
use crate::numeric::{wire, NumericCodec};

/// One token movement reconstructed from the chain. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub event: &'static str,
    pub hash: TxHash,
    pub from: Address,
    pub to: Address,
    #[serde(with = "wire::u256_string")]
    pub amount: U256,
    pub amount_decimal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        with = "wire::option_safe_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<u64>,
    #[serde(with = "wire::safe_u64")]
    pub block_number: u64,
    #[serde(with = "wire::safe_u64")]
    pub log_index: u64,
}

impl TransactionRecord {
    /// Sort key matching ledger order.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    /// Build a record from any event carrying `from`, `to` and `value`.
    ///
    /// `message` and `timestamp` are taken from the event when present; the
    /// timestamp falls back to the block's.
    pub fn from_event(event: &DecodedEvent, codec: &NumericCodec) -> GatewayResult<Self> {
        let missing = |name: &str| {
            GatewayError::MalformedEvent(format!(
                "{} in tx {} has no usable '{}' field",
                event.name(),
                event.transaction_hash,
                name
            ))
        };

        let from = event
            .field("from")
            .and_then(FieldValue::as_address)
            .ok_or_else(|| missing("from"))?;
        let to = event
            .field("to")
            .and_then(FieldValue::as_address)
            .ok_or_else(|| missing("to"))?;
        let amount = event
            .field("value")
            .and_then(FieldValue::as_uint)
            .ok_or_else(|| missing("value"))?;
        let message = event
            .field("message")
            .and_then(FieldValue::as_str)
            .map(str::to_string);
        let timestamp = match event.field("timestamp").and_then(FieldValue::as_uint) {
            Some(ts) => Some(u64::try_from(ts).map_err(|_| missing("timestamp"))?),
            None => event.block_timestamp,
        };

        Ok(Self {
            event: event.name(),
            hash: event.transaction_hash,
            from,
            to,
            amount,
            amount_decimal: codec.to_decimal(amount),
            message,
            timestamp,
            block_number: event.block_number,
            log_index: event.log_index,
        })
    }

    /// Copy the descriptive fields of a matching `TransferWithDetails` record.
    pub fn enrich_with(&mut self, details: &TransactionRecord) {
        if self.message.is_none() {
            self.message = details.message.clone();
        }
        if details.timestamp.is_some() {
            self.timestamp = details.timestamp;
        }
    }
}
