//! Shared fixtures for integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, LogData, TxHash, U256};
use alloy::sol_types::SolEvent;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use token_gateway::blockchain::abi::ITCoin;
use token_gateway::blockchain::mock::MockChain;
use token_gateway::blockchain::types::ContractEvent;
use token_gateway::blockchain::{NonceManager, TransactionPipeline, Wallet};
use token_gateway::config::GatewayConfig;
use token_gateway::events::EventAggregator;
use token_gateway::http::build_router;
use token_gateway::lifecycle::build_state;
use token_gateway::numeric::NumericCodec;

/// Anvil's first account.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const RECIPIENT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
pub const CHAIN_ID: u64 = 31337;

pub fn contract() -> Address {
    CONTRACT.parse().unwrap()
}

pub fn wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY, CHAIN_ID).unwrap()
}

pub fn chain() -> Arc<MockChain> {
    Arc::new(MockChain::new(CHAIN_ID))
}

pub fn pipeline(chain: &Arc<MockChain>, serialize_nonces: bool) -> TransactionPipeline {
    TransactionPipeline::new(
        chain.clone(),
        Arc::new(wallet()),
        NonceManager::new(serialize_nonces),
        contract(),
        NumericCodec::new(18),
    )
    .with_confirmation_policy(2, Duration::from_millis(10))
}

pub fn aggregator(chain: &Arc<MockChain>) -> EventAggregator {
    EventAggregator::new(chain.clone(), contract(), NumericCodec::new(18))
}

pub fn config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.token.contract_address = CONTRACT.to_string();
    config.blockchain.chain_id = CHAIN_ID;
    config
}

/// Router over `chain` with default configuration.
pub fn app(chain: &Arc<MockChain>) -> Router {
    let config = config();
    let state = build_state(&config, chain.clone(), wallet()).unwrap();
    build_router(state, &config)
}

/// A `Transfer` log emitted by the test contract.
pub fn transfer_log(
    from: Address,
    to: Address,
    value: U256,
    block: u64,
    log_index: u64,
    tx: TxHash,
) -> ContractEvent {
    contract_event(
        ITCoin::Transfer { from, to, value }.encode_log_data(),
        block,
        log_index,
        tx,
    )
}

pub fn contract_event(log: LogData, block: u64, log_index: u64, tx: TxHash) -> ContractEvent {
    ContractEvent {
        address: contract(),
        topics: log.topics().to_vec(),
        data: log.data,
        block_number: block,
        log_index,
        transaction_hash: tx,
        block_timestamp: None,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Drive one request through the router.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
