//! Chain-specific types shared by the client, signer and pipeline.

use alloy::primitives::{Address, Bytes, TxHash, B256};
use serde::Serialize;

use crate::numeric::wire;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// A read-only or simulated contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// Parameters for one `eth_getLogs` window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub from_block: u64,
    pub to_block: u64,
    /// Accepted values for topic 0; empty matches any event.
    pub signatures: Vec<B256>,
}

/// A raw log as returned by the node. Never leaves the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEvent {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: TxHash,
    pub block_timestamp: Option<u64>,
}

/// The parts of a mined transaction's receipt the gateway reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptView {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
    pub logs: Vec<ContractEvent>,
}

/// Fully populated, not yet signed transaction.
///
/// Built fresh per request and consumed by value when signed, so one
/// descriptor yields at most one signed payload.
#[derive(Debug, PartialEq, Eq)]
pub struct UnsignedTxDescriptor {
    pub from: Address,
    pub to: Address,
    pub call_data: Bytes,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub nonce: u64,
    pub chain_id: u64,
}

/// Signed, RLP/2718-encoded transaction bytes plus the hash they commit to.
#[derive(Debug, PartialEq, Eq)]
pub struct SignedTxPayload {
    raw: Bytes,
    tx_hash: TxHash,
    nonce: u64,
}

impl SignedTxPayload {
    pub(crate) fn new(raw: Bytes, tx_hash: TxHash, nonce: u64) -> Self {
        Self { raw, tx_hash, nonce }
    }

    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

/// Handle returned by a successful submission. The transaction may still be
/// pending, dropped from the pool, or later reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransfer {
    pub transaction_hash: TxHash,
    pub from: Address,
    #[serde(with = "wire::safe_u64")]
    pub nonce: u64,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ConfirmationStatus {
    /// No receipt yet.
    Pending,
    /// Mined but not deep enough.
    #[serde(rename_all = "camelCase")]
    Confirming {
        #[serde(with = "wire::safe_u64")]
        block_number: u64,
        current: u32,
        required: u32,
    },
    /// Mined at the required depth.
    #[serde(rename_all = "camelCase")]
    Confirmed {
        #[serde(with = "wire::safe_u64")]
        block_number: u64,
    },
    /// Mined with a failed status.
    #[serde(rename_all = "camelCase")]
    Reverted {
        #[serde(with = "wire::safe_u64")]
        block_number: u64,
    },
}
