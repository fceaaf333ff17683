//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint
//! - Query chain state (block number, nonce, gas price, receipts, logs)
//! - Simulate calls and submit signed transactions
//! - Classify node errors into the gateway taxonomy
//! - Bound every call with the configured timeout
//!
//! # Failover
//! The provider is chosen once, at startup, by [`RpcChainClient::select_provider`].
//! After that every call is a single attempt against that provider; a failed
//! call is reported, never retried against another endpoint.

use alloy::eips::BlockId;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::blockchain::types::{
    CallRequest, ChainId, ContractEvent, LogQuery, ReceiptView, SignedTxPayload,
};
use crate::config::BlockchainConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::resilience::with_deadline;

/// The remote ledger as the pipeline and aggregator see it.
///
/// Implementations must bound every call and report an elapsed deadline or a
/// connection failure as [`GatewayError::ChainUnavailable`].
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> GatewayResult<u64>;

    /// Latest block number the node has observed.
    async fn block_number(&self) -> GatewayResult<u64>;

    /// Execute a read-only call against the latest state.
    async fn call(&self, request: &CallRequest) -> GatewayResult<Bytes>;

    /// Simulate `request`; a revert surfaces as [`GatewayError::WouldRevert`].
    async fn estimate_gas(&self, request: &CallRequest) -> GatewayResult<u64>;

    async fn gas_price(&self) -> GatewayResult<u128>;

    /// Transaction count of `address` as of the latest block.
    async fn transaction_count(&self, address: Address) -> GatewayResult<u64>;

    /// Submit a signed transaction. A reused nonce surfaces as
    /// [`GatewayError::NonceConflict`].
    async fn send_raw_transaction(&self, payload: SignedTxPayload) -> GatewayResult<TxHash>;

    async fn transaction_receipt(&self, tx_hash: TxHash) -> GatewayResult<Option<ReceiptView>>;

    async fn logs(&self, query: &LogQuery) -> GatewayResult<Vec<ContractEvent>>;
}

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client over one active provider.
#[derive(Clone)]
pub struct RpcChainClient {
    /// Candidate providers with their URLs (primary first).
    providers: Vec<(String, DynProvider)>,
    /// Index of the provider every call goes to.
    active: usize,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcChainClient {
    /// Create a new blockchain client.
    ///
    /// Does not contact the node; the primary is active until
    /// [`RpcChainClient::select_provider`] picks otherwise.
    pub fn new(config: BlockchainConfig) -> GatewayResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            GatewayError::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push((
            config.rpc_url.clone(),
            Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider,
        ));

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push((
                    url_str.clone(),
                    Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider,
                ));
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            failovers = providers.len() - 1,
            "Chain client initialized"
        );

        Ok(Self {
            providers,
            active: 0,
            config,
            timeout_duration,
        })
    }

    /// Make the first reachable provider the active one and verify its chain ID.
    ///
    /// Unreachable providers are skipped; a reachable one on the wrong chain
    /// is a [`GatewayError::Config`] error. When none answers the primary
    /// stays active and `ChainUnavailable` is returned.
    pub async fn select_provider(&mut self) -> GatewayResult<ChainId> {
        let mut last_error = None;
        for i in 0..self.providers.len() {
            self.active = i;
            match self.chain_id().await {
                Ok(id) if id == self.config.chain_id => {
                    tracing::info!(provider_idx = i, rpc_url = %self.active_url(), "RPC provider selected");
                    return Ok(ChainId(id));
                }
                Ok(id) => {
                    return Err(GatewayError::Config(format!(
                        "Chain ID mismatch at {}: expected {}, got {}",
                        self.active_url(),
                        self.config.chain_id,
                        id
                    )));
                }
                Err(e @ GatewayError::ChainUnavailable(_)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC provider unreachable");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        self.active = 0;
        Err(last_error.unwrap_or_else(|| {
            GatewayError::ChainUnavailable("no RPC providers configured".to_string())
        }))
    }

    /// URL of the provider calls go to.
    pub fn active_url(&self) -> &str {
        &self.providers[self.active].0
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    fn provider(&self) -> DynProvider {
        self.providers[self.active].1.clone()
    }

    /// One attempt, bounded by the per-call timeout.
    async fn attempt<T, Fut>(&self, method: &'static str, fut: Fut) -> GatewayResult<T>
    where
        Fut: Future<Output = GatewayResult<T>>,
    {
        let start = Instant::now();
        let result = with_deadline(self.timeout_duration, method, fut).await;
        metrics::record_rpc_call(method, result.is_ok(), start);
        result
    }

    /// [`RpcChainClient::attempt`] for calls whose only node error is a plain RPC error.
    async fn read<T, Fut>(&self, method: &'static str, fut: Fut) -> GatewayResult<T>
    where
        Fut: Future<Output = Result<T, TransportError>>,
    {
        self.attempt(method, async move {
            fut.await.map_err(|e| classify_rpc_error(method, e))
        })
        .await
    }
}

fn to_transaction_request(request: &CallRequest) -> TransactionRequest {
    let tx = TransactionRequest::default()
        .with_to(request.to)
        .with_input(request.data.clone());
    match request.from {
        Some(from) => tx.with_from(from),
        None => tx,
    }
}

fn to_filter(query: &LogQuery) -> Filter {
    let filter = Filter::new()
        .address(query.address)
        .from_block(query.from_block)
        .to_block(query.to_block);
    if query.signatures.is_empty() {
        filter
    } else {
        filter.event_signature(query.signatures.clone())
    }
}

fn to_contract_event(log: &Log) -> GatewayResult<ContractEvent> {
    let missing = |field: &str| {
        GatewayError::MalformedEvent(format!("log is missing {} (pending log?)", field))
    };
    Ok(ContractEvent {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number: log.block_number.ok_or_else(|| missing("blockNumber"))?,
        log_index: log.log_index.ok_or_else(|| missing("logIndex"))?,
        transaction_hash: log.transaction_hash.ok_or_else(|| missing("transactionHash"))?,
        block_timestamp: log.block_timestamp,
    })
}

fn to_receipt_view(receipt: &TransactionReceipt) -> GatewayResult<ReceiptView> {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(to_contract_event)
        .collect::<GatewayResult<Vec<_>>>()?;
    Ok(ReceiptView {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        success: receipt.status(),
        logs,
    })
}

/// True when a node error message or code describes an execution revert.
pub fn is_revert_error(code: i64, message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    code == 3 || message.contains("revert") || message.contains("invalid opcode")
}

/// True when a node rejected a submission because of its nonce.
pub fn is_nonce_conflict(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    [
        "nonce too low",
        "nonce too high",
        "already known",
        "replacement transaction underpriced",
        "known transaction",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

/// Map a transport-level error onto the gateway taxonomy.
pub fn classify_rpc_error(method: &str, err: TransportError) -> GatewayError {
    match &err {
        RpcError::Transport(kind) => {
            GatewayError::ChainUnavailable(format!("{}: {}", method, kind))
        }
        RpcError::ErrorResp(payload) => GatewayError::Rpc(format!(
            "{}: {} (code {})",
            method, payload.message, payload.code
        )),
        _ => GatewayError::Rpc(format!("{}: {}", method, err)),
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> GatewayResult<u64> {
        let p = self.provider();
        self.read("eth_chainId", async move { p.get_chain_id().await })
            .await
    }

    async fn block_number(&self) -> GatewayResult<u64> {
        let p = self.provider();
        self.read("eth_blockNumber", async move { p.get_block_number().await })
            .await
    }

    async fn call(&self, request: &CallRequest) -> GatewayResult<Bytes> {
        let tx = to_transaction_request(request);
        let p = self.provider();
        self.read("eth_call", async move { p.call(tx).await }).await
    }

    async fn estimate_gas(&self, request: &CallRequest) -> GatewayResult<u64> {
        let tx = to_transaction_request(request);
        let provider = self.provider();
        self.attempt("eth_estimateGas", async move {
            provider.estimate_gas(tx).await.map_err(|e| match e.as_error_resp() {
                Some(payload) if is_revert_error(payload.code, &payload.message) => {
                    GatewayError::WouldRevert(payload.message.to_string())
                }
                _ => classify_rpc_error("eth_estimateGas", e),
            })
        })
        .await
    }

    async fn gas_price(&self) -> GatewayResult<u128> {
        let p = self.provider();
        self.read("eth_gasPrice", async move { p.get_gas_price().await })
            .await
    }

    async fn transaction_count(&self, address: Address) -> GatewayResult<u64> {
        let p = self.provider();
        self.read("eth_getTransactionCount", async move {
            p.get_transaction_count(address)
                .block_id(BlockId::latest())
                .await
        })
        .await
    }

    async fn send_raw_transaction(&self, payload: SignedTxPayload) -> GatewayResult<TxHash> {
        let provider = self.provider();
        self.attempt("eth_sendRawTransaction", async move {
            match provider.send_raw_transaction(payload.raw()).await {
                Ok(pending) => Ok(*pending.tx_hash()),
                Err(e) => Err(match e.as_error_resp() {
                    Some(resp) if is_nonce_conflict(&resp.message) => {
                        GatewayError::NonceConflict(format!(
                            "nonce {}: {}",
                            payload.nonce(),
                            resp.message
                        ))
                    }
                    _ => classify_rpc_error("eth_sendRawTransaction", e),
                }),
            }
        })
        .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> GatewayResult<Option<ReceiptView>> {
        let p = self.provider();
        let receipt = self
            .read("eth_getTransactionReceipt", async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        receipt.as_ref().map(to_receipt_view).transpose()
    }

    async fn logs(&self, query: &LogQuery) -> GatewayResult<Vec<ContractEvent>> {
        let filter = to_filter(query);
        let p = self.provider();
        let logs = self
            .read("eth_getLogs", async move { p.get_logs(&filter).await })
            .await?;
        logs.iter().map(to_contract_event).collect()
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("rpc_url", &self.active_url())
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
