//! In-memory [`ChainClient`] for tests.
//!
//! Models one sender's nonce sequence, a fixed gas market, canned `eth_call`
//! answers keyed by selector, receipts, and a log store filtered like
//! `eth_getLogs`. Every remote call is recorded so tests can assert on what
//! was (or was not) contacted.

use alloy::primitives::{Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{CallRequest, ContractEvent, LogQuery, ReceiptView, SignedTxPayload};
use crate::error::{GatewayError, GatewayResult};

/// A submission the mock accepted into its pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub tx_hash: TxHash,
    pub nonce: u64,
    pub raw: Bytes,
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    block_number: u64,
    gas_price: u128,
    gas_estimate: u64,
    revert_reason: Option<String>,
    unavailable: bool,
    reject_next: Option<String>,
    submit_delay: Duration,
    mined_nonce: u64,
    used_nonces: HashSet<u64>,
    submitted: Vec<Submitted>,
    receipts: HashMap<TxHash, ReceiptView>,
    logs: Vec<ContractEvent>,
    call_responses: HashMap<[u8; 4], Bytes>,
    calls: Vec<&'static str>,
}

/// In-memory ledger.
#[derive(Debug)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new(31337)
    }
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id,
                block_number: 0,
                gas_price: 1_000_000_000,
                gas_estimate: 55_000,
                revert_reason: None,
                unavailable: false,
                reject_next: None,
                submit_delay: Duration::ZERO,
                mined_nonce: 0,
                used_nonces: HashSet::new(),
                submitted: Vec::new(),
                receipts: HashMap::new(),
                logs: Vec::new(),
                call_responses: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `method` and fail if the node is marked unavailable.
    fn enter(&self, method: &'static str) -> GatewayResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.calls.push(method);
        if state.unavailable {
            return Err(GatewayError::ChainUnavailable(format!(
                "{} timed out after 10s",
                method
            )));
        }
        Ok(state)
    }

    pub fn set_block_number(&self, block: u64) {
        self.lock().block_number = block;
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        self.lock().gas_price = gas_price;
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.lock().gas_estimate = gas;
    }

    /// Make every subsequent simulation revert with `reason`.
    pub fn set_revert(&self, reason: impl Into<String>) {
        self.lock().revert_reason = Some(reason.into());
    }

    /// Make every subsequent call fail as if the node timed out.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Reject the next submission as a nonce conflict with `reason`.
    pub fn reject_next_submission(&self, reason: impl Into<String>) {
        self.lock().reject_next = Some(reason.into());
    }

    /// Hold each accepted submission for `delay` before answering, as a
    /// slow node would after the transaction already reached its pool.
    pub fn set_submit_delay(&self, delay: Duration) {
        self.lock().submit_delay = delay;
    }

    /// Drop every pending transaction from the pool.
    pub fn evict_pending(&self) {
        let mut state = self.lock();
        let mined = state.mined_nonce;
        state.used_nonces.retain(|n| *n < mined);
    }

    /// Nonce the chain reports as of the latest block.
    pub fn set_mined_nonce(&self, nonce: u64) {
        self.lock().mined_nonce = nonce;
    }

    /// Answer `eth_call`s whose selector is `selector` with `output`.
    pub fn set_call_response(&self, selector: [u8; 4], output: impl Into<Bytes>) {
        self.lock().call_responses.insert(selector, output.into());
    }

    pub fn insert_receipt(&self, receipt: ReceiptView) {
        self.lock().receipts.insert(receipt.transaction_hash, receipt);
    }

    pub fn push_log(&self, event: ContractEvent) {
        self.lock().logs.push(event);
    }

    pub fn submitted(&self) -> Vec<Submitted> {
        self.lock().submitted.clone()
    }

    /// Names of every RPC method called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|m| **m == method).count()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> GatewayResult<u64> {
        Ok(self.enter("eth_chainId")?.chain_id)
    }

    async fn block_number(&self) -> GatewayResult<u64> {
        Ok(self.enter("eth_blockNumber")?.block_number)
    }

    async fn call(&self, request: &CallRequest) -> GatewayResult<Bytes> {
        let state = self.enter("eth_call")?;
        let selector: [u8; 4] = request
            .data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| GatewayError::Rpc("eth_call: missing selector".into()))?;
        state
            .call_responses
            .get(&selector)
            .cloned()
            .ok_or_else(|| GatewayError::Rpc("eth_call: execution reverted (code 3)".into()))
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> GatewayResult<u64> {
        let state = self.enter("eth_estimateGas")?;
        match &state.revert_reason {
            Some(reason) => Err(GatewayError::WouldRevert(reason.clone())),
            None => Ok(state.gas_estimate),
        }
    }

    async fn gas_price(&self) -> GatewayResult<u128> {
        Ok(self.enter("eth_gasPrice")?.gas_price)
    }

    async fn transaction_count(&self, _address: Address) -> GatewayResult<u64> {
        Ok(self.enter("eth_getTransactionCount")?.mined_nonce)
    }

    async fn send_raw_transaction(&self, payload: SignedTxPayload) -> GatewayResult<TxHash> {
        let delay = {
            let mut state = self.enter("eth_sendRawTransaction")?;
            let nonce = payload.nonce();
            if let Some(reason) = state.reject_next.take() {
                return Err(GatewayError::NonceConflict(reason));
            }
            if nonce < state.mined_nonce || !state.used_nonces.insert(nonce) {
                return Err(GatewayError::NonceConflict(format!(
                    "nonce {}: nonce too low",
                    nonce
                )));
            }
            state.submitted.push(Submitted {
                tx_hash: payload.tx_hash(),
                nonce,
                raw: payload.raw().clone(),
            });
            state.submit_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(payload.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> GatewayResult<Option<ReceiptView>> {
        Ok(self
            .enter("eth_getTransactionReceipt")?
            .receipts
            .get(&tx_hash)
            .cloned())
    }

    async fn logs(&self, query: &LogQuery) -> GatewayResult<Vec<ContractEvent>> {
        let state = self.enter("eth_getLogs")?;
        let matches_signature = |topics: &[B256]| {
            query.signatures.is_empty()
                || topics
                    .first()
                    .map(|t| query.signatures.contains(t))
                    .unwrap_or(false)
        };
        Ok(state
            .logs
            .iter()
            .filter(|log| log.address == query.address)
            .filter(|log| log.block_number >= query.from_block && log.block_number <= query.to_block)
            .filter(|log| matches_signature(&log.topics))
            .cloned()
            .collect())
    }
}
