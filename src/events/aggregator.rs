//! Event aggregation over the token contract's logs.
//!
//! Every query is a fresh rescan; nothing is cached and there is no
//! watermark. Results are ordered by `(block_number, log_index)`.

use alloy::primitives::{Address, TxHash, B256, U256};
use serde::Serialize;
use std::sync::Arc;

use crate::blockchain::client::ChainClient;
use crate::blockchain::parse_address;
use crate::blockchain::types::{ContractEvent, LogQuery};
use crate::error::{GatewayError, GatewayResult};
use crate::events::decoder::decode_event;
use crate::events::record::TransactionRecord;
use crate::events::schema::{EventRegistry, TRANSFER, TRANSFER_WITH_DETAILS};
use crate::numeric::{wire, NumericCodec, TokenAmount};

/// Inclusive block range. Missing bounds default to the deployment block and
/// the latest block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl BlockRange {
    pub fn new(from: Option<u64>, to: Option<u64>) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
    /// Sender and recipient are the same account.
    #[serde(rename = "self")]
    SelfTransfer,
}

/// A transfer touching one account, with that account's balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub direction: Direction,
    pub balance_after: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHistory {
    pub account: Address,
    #[serde(with = "wire::safe_u64")]
    pub to_block: u64,
    pub entries: Vec<HistoryEntry>,
    pub balance: TokenAmount,
}

/// Reconstructs transaction history from contract logs.
pub struct EventAggregator {
    client: Arc<dyn ChainClient>,
    contract: Address,
    registry: EventRegistry,
    codec: NumericCodec,
    deployment_block: u64,
    chunk_size: u64,
}

impl EventAggregator {
    pub fn new(client: Arc<dyn ChainClient>, contract: Address, codec: NumericCodec) -> Self {
        Self {
            client,
            contract,
            registry: EventRegistry::token_events(),
            codec,
            deployment_block: 0,
            chunk_size: 10_000,
        }
    }

    /// First block scanned when a range has no lower bound.
    pub fn with_deployment_block(mut self, block: u64) -> Self {
        self.deployment_block = block;
        self
    }

    /// Blocks per `eth_getLogs` window.
    pub fn with_chunk_size(mut self, blocks: u64) -> Self {
        self.chunk_size = blocks.max(1);
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    /// Every registered event in `range`, decoded and ordered.
    ///
    /// A single undecodable log fails the whole scan.
    pub async fn scan(&self, range: BlockRange) -> GatewayResult<Vec<TransactionRecord>> {
        self.scan_signatures(range, self.registry.signatures()).await
    }

    async fn scan_signatures(
        &self,
        range: BlockRange,
        signatures: Vec<B256>,
    ) -> GatewayResult<Vec<TransactionRecord>> {
        let (from, to) = self.resolve(range).await?;
        if from > to {
            return Ok(Vec::new());
        }

        let raw = self.fetch(from, to, signatures).await?;
        let mut records = raw
            .iter()
            .map(|event| self.decode(event))
            .collect::<GatewayResult<Vec<_>>>()?;
        records.sort_by_key(TransactionRecord::position);

        tracing::debug!(from, to, records = records.len(), "Scan complete");
        Ok(records)
    }

    async fn resolve(&self, range: BlockRange) -> GatewayResult<(u64, u64)> {
        let from = range.from.unwrap_or(self.deployment_block);
        let to = match range.to {
            Some(to) => to,
            None => self.client.block_number().await?,
        };
        Ok((from, to))
    }

    async fn fetch(
        &self,
        from: u64,
        to: u64,
        signatures: Vec<B256>,
    ) -> GatewayResult<Vec<ContractEvent>> {
        let mut events = Vec::new();
        let mut start = from;
        loop {
            let end = start.saturating_add(self.chunk_size - 1).min(to);
            let query = LogQuery {
                address: self.contract,
                from_block: start,
                to_block: end,
                signatures: signatures.clone(),
            };
            let chunk = self.client.logs(&query).await?;
            tracing::trace!(from = start, to = end, logs = chunk.len(), "Fetched log window");
            events.extend(chunk);

            if end >= to {
                break;
            }
            start = end + 1;
        }
        Ok(events)
    }

    fn decode(&self, event: &ContractEvent) -> GatewayResult<TransactionRecord> {
        let topic0 = event.topics.first().ok_or_else(|| {
            GatewayError::MalformedEvent(format!(
                "log {} in tx {} has no topics",
                event.log_index, event.transaction_hash
            ))
        })?;
        let schema = self.registry.get(topic0).ok_or_else(|| {
            GatewayError::MalformedEvent(format!(
                "log {} in tx {} has unknown signature {}",
                event.log_index, event.transaction_hash, topic0
            ))
        })?;
        let decoded = decode_event(schema, event)?;
        TransactionRecord::from_event(&decoded, &self.codec)
    }

    /// The transfer carried by `tx_hash`'s receipt.
    ///
    /// Both "no receipt" and "no transfer log from this contract" are
    /// `NotFound`.
    pub async fn lookup(&self, tx_hash: TxHash) -> GatewayResult<TransactionRecord> {
        let receipt = self
            .client
            .transaction_receipt(tx_hash)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("no receipt for transaction {}", tx_hash)))?;

        let ours = |event: &&ContractEvent, topic: B256| {
            event.address == self.contract && event.topics.first() == Some(&topic)
        };

        let transfer = receipt
            .logs
            .iter()
            .find(|e| ours(e, TRANSFER.topic0()))
            .ok_or_else(|| {
                GatewayError::NotFound(format!("transaction {} emitted no Transfer event", tx_hash))
            })?;
        let mut record = TransactionRecord::from_event(&decode_event(&TRANSFER, transfer)?, &self.codec)?;

        if let Some(details) = receipt
            .logs
            .iter()
            .find(|e| ours(e, TRANSFER_WITH_DETAILS.topic0()))
        {
            let details =
                TransactionRecord::from_event(&decode_event(&TRANSFER_WITH_DETAILS, details)?, &self.codec)?;
            record.enrich_with(&details);
        }

        Ok(record)
    }

    /// Running balance of `account` built from `Transfer` events up to
    /// `to_block` (latest when absent).
    pub async fn account_history(
        &self,
        account: &str,
        to_block: Option<u64>,
    ) -> GatewayResult<AccountHistory> {
        let account = parse_address(account)?;
        if account.is_zero() {
            // Mint source and burn sink; it holds no balance to fold.
            return Err(GatewayError::InvalidAddress(
                "the zero address has no balance history".to_string(),
            ));
        }
        let (_, to) = self.resolve(BlockRange::new(None, to_block)).await?;
        let records = self
            .scan_signatures(BlockRange::new(None, Some(to)), vec![TRANSFER.topic0()])
            .await?;

        let mut balance = U256::ZERO;
        let mut entries = Vec::new();
        for record in records {
            let direction = match (record.from == account, record.to == account) {
                (true, true) => Direction::SelfTransfer,
                (true, false) => Direction::Out,
                (false, true) => Direction::In,
                (false, false) => continue,
            };
            balance = match direction {
                Direction::In => balance.checked_add(record.amount).ok_or_else(|| {
                    GatewayError::MalformedEvent(format!(
                        "balance of {} overflows at tx {}",
                        account, record.hash
                    ))
                })?,
                Direction::Out => balance.checked_sub(record.amount).ok_or_else(|| {
                    GatewayError::MalformedEvent(format!(
                        "tx {} debits {} more than its balance",
                        record.hash, account
                    ))
                })?,
                Direction::SelfTransfer => balance,
            };
            entries.push(HistoryEntry {
                record,
                direction,
                balance_after: self.codec.amount(balance),
            });
        }

        Ok(AccountHistory {
            account,
            to_block: to,
            entries,
            balance: self.codec.amount(balance),
        })
    }
}

impl std::fmt::Debug for EventAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventAggregator")
            .field("contract", &self.contract)
            .field("events", &self.registry.len())
            .field("deployment_block", &self.deployment_block)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::abi::ITCoin;
    use crate::blockchain::mock::MockChain;
    use crate::blockchain::types::ReceiptView;
    use alloy::primitives::Bytes;
    use alloy::sol_types::SolEvent;

    const CONTRACT: Address = Address::new([0xcc; 20]);

    fn log(data: alloy::primitives::LogData, block: u64, index: u64, tx: u8) -> ContractEvent {
        ContractEvent {
            address: CONTRACT,
            topics: data.topics().to_vec(),
            data: data.data,
            block_number: block,
            log_index: index,
            transaction_hash: TxHash::repeat_byte(tx),
            block_timestamp: None,
        }
    }

    fn transfer(from: u8, to: u8, value: u64, block: u64, index: u64, tx: u8) -> ContractEvent {
        log(
            ITCoin::Transfer {
                from: Address::repeat_byte(from),
                to: Address::repeat_byte(to),
                value: U256::from(value),
            }
            .encode_log_data(),
            block,
            index,
            tx,
        )
    }

    fn aggregator(chain: &Arc<MockChain>) -> EventAggregator {
        EventAggregator::new(chain.clone(), CONTRACT, NumericCodec::new(0))
    }

    #[tokio::test]
    async fn test_scan_orders_by_block_then_index() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(20);
        chain.push_log(transfer(1, 2, 30, 9, 4, 0xa3));
        chain.push_log(transfer(1, 2, 10, 3, 1, 0xa1));
        chain.push_log(transfer(1, 2, 20, 9, 0, 0xa2));

        let records = aggregator(&chain).scan(BlockRange::default()).await.unwrap();
        let amounts: Vec<_> = records.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, [U256::from(10u64), U256::from(20u64), U256::from(30u64)]);
    }

    #[tokio::test]
    async fn test_scan_is_chunked() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(25);
        chain.push_log(transfer(1, 2, 1, 0, 0, 1));
        chain.push_log(transfer(1, 2, 2, 25, 0, 2));

        let records = aggregator(&chain)
            .with_chunk_size(10)
            .scan(BlockRange::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        // 0-9, 10-19, 20-25
        assert_eq!(chain.call_count("eth_getLogs"), 3);
    }

    #[tokio::test]
    async fn test_empty_or_inverted_range() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(5);
        let agg = aggregator(&chain).with_deployment_block(10);
        assert!(agg.scan(BlockRange::default()).await.unwrap().is_empty());
        assert_eq!(chain.call_count("eth_getLogs"), 0);
    }

    #[tokio::test]
    async fn test_malformed_log_aborts_scan() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(5);
        chain.push_log(transfer(1, 2, 1, 1, 0, 1));
        let mut bad = transfer(1, 2, 1, 2, 0, 2);
        bad.data = Bytes::from_static(&[1, 2, 3]);
        chain.push_log(bad);

        let result = aggregator(&chain).scan(BlockRange::default()).await;
        assert!(matches!(result, Err(GatewayError::MalformedEvent(_))));
    }

    #[tokio::test]
    async fn test_lookup_enriches_with_details() {
        let chain = Arc::new(MockChain::default());
        let tx = TxHash::repeat_byte(0x77);
        let details = log(
            ITCoin::TransferWithDetails {
                from: Address::repeat_byte(1),
                to: Address::repeat_byte(2),
                value: U256::from(5u64),
                message: "thanks".into(),
                timestamp: U256::from(1_700_000_000u64),
            }
            .encode_log_data(),
            4,
            1,
            0x77,
        );
        chain.insert_receipt(ReceiptView {
            transaction_hash: tx,
            block_number: Some(4),
            success: true,
            logs: vec![transfer(1, 2, 5, 4, 0, 0x77), details],
        });

        let record = aggregator(&chain).lookup(tx).await.unwrap();
        assert_eq!(record.amount, U256::from(5u64));
        assert_eq!(record.message.as_deref(), Some("thanks"));
        assert_eq!(record.timestamp, Some(1_700_000_000));
    }

    #[tokio::test]
    async fn test_lookup_ignores_other_contracts() {
        let chain = Arc::new(MockChain::default());
        let tx = TxHash::repeat_byte(0x78);
        let mut foreign = transfer(1, 2, 5, 4, 0, 0x78);
        foreign.address = Address::repeat_byte(0xdd);
        chain.insert_receipt(ReceiptView {
            transaction_hash: tx,
            block_number: Some(4),
            success: true,
            logs: vec![foreign],
        });

        let result = aggregator(&chain).lookup(tx).await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_account_history_running_balance() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(10);
        chain.push_log(transfer(0, 1, 100, 1, 0, 1));
        chain.push_log(transfer(1, 2, 30, 2, 0, 2));
        chain.push_log(transfer(1, 1, 5, 3, 0, 3));
        chain.push_log(transfer(3, 4, 9, 4, 0, 4));

        let history = aggregator(&chain)
            .account_history(&Address::repeat_byte(1).to_string(), None)
            .await
            .unwrap();

        assert_eq!(history.entries.len(), 3);
        assert_eq!(history.entries[0].direction, Direction::In);
        assert_eq!(history.entries[1].balance_after.decimal, "70");
        assert_eq!(history.entries[2].direction, Direction::SelfTransfer);
        assert_eq!(history.balance.base_units, U256::from(70u64));
        assert_eq!(history.to_block, 10);
    }

    #[tokio::test]
    async fn test_account_history_rejects_zero_address() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(10);
        chain.push_log(transfer(0, 1, 100, 1, 0, 1));

        let result = aggregator(&chain)
            .account_history(&Address::ZERO.to_string(), None)
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidAddress(_))));
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn test_account_history_detects_overdraft() {
        let chain = Arc::new(MockChain::default());
        chain.set_block_number(10);
        chain.push_log(transfer(1, 2, 30, 2, 0, 2));

        let result = aggregator(&chain)
            .account_history(&Address::repeat_byte(1).to_string(), None)
            .await;
        assert!(matches!(result, Err(GatewayError::MalformedEvent(_))));
    }
}
