//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn validated configuration plus a chain client and wallet into the
//!   services the HTTP layer serves
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Configuration is read once here; services receive immutable values

use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{
    parse_address, ChainClient, NonceManager, TokenReader, TransactionPipeline, Wallet,
};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::events::EventAggregator;
use crate::http::AppState;
use crate::numeric::NumericCodec;

/// Longest confirmation wait used when the caller gives none.
const DEFAULT_CONFIRMATION_WAIT: Duration = Duration::from_secs(30);

fn config_address(field: &str, value: &str) -> GatewayResult<Address> {
    parse_address(value).map_err(|e| GatewayError::Config(format!("{}: {}", field, e)))
}

/// Queueing budget for one sender: what is left of the request timeout after
/// the four remote calls of a submission, less a second of headroom.
fn nonce_wait(config: &GatewayConfig) -> Duration {
    let calls = 4 * config.blockchain.rpc_timeout_secs + 1;
    Duration::from_secs(config.timeouts.request_secs.saturating_sub(calls).max(1))
}

/// Build every service from configuration.
pub fn build_state(
    config: &GatewayConfig,
    client: Arc<dyn ChainClient>,
    wallet: Wallet,
) -> GatewayResult<AppState> {
    let contract = config_address("token.contract_address", &config.token.contract_address)?;

    if !config.token.sender_address.is_empty() {
        let expected = config_address("token.sender_address", &config.token.sender_address)?;
        if expected != wallet.address() {
            return Err(GatewayError::Config(format!(
                "signing key belongs to {}, but token.sender_address is {}",
                wallet.address(),
                expected
            )));
        }
    }

    if wallet.chain_id() != config.blockchain.chain_id {
        return Err(GatewayError::Config(format!(
            "wallet chain {} does not match blockchain.chain_id {}",
            wallet.chain_id(),
            config.blockchain.chain_id
        )));
    }

    let codec = NumericCodec::new(config.token.decimals);

    let pipeline = TransactionPipeline::new(
        client.clone(),
        Arc::new(wallet),
        NonceManager::new(config.token.serialize_nonces),
        contract,
        codec,
    )
    .with_confirmation_policy(
        config.blockchain.confirmation_blocks,
        Duration::from_millis(config.blockchain.confirmation_poll_ms),
    )
    .with_nonce_wait(nonce_wait(config));

    let aggregator = EventAggregator::new(client.clone(), contract, codec)
        .with_deployment_block(config.token.deployment_block)
        .with_chunk_size(config.token.log_chunk_size);

    let reader = TokenReader::new(client.clone(), contract, codec);

    // Leave a second of headroom below the request timeout.
    let max_wait = Duration::from_secs(config.timeouts.request_secs.saturating_sub(1).max(1));

    tracing::info!(
        contract = %contract,
        sender = %pipeline.sender(),
        decimals = config.token.decimals,
        serialize_nonces = config.token.serialize_nonces,
        "Gateway services initialized"
    );

    Ok(AppState::new(client, pipeline, aggregator, reader)
        .with_confirmation_wait(DEFAULT_CONFIRMATION_WAIT, max_wait))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mock::MockChain;

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.token.contract_address = "0x5fbdb2315678afecb367f032d93f642f64180aa3".into();
        config
    }

    fn wallet() -> Wallet {
        Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap()
    }

    #[test]
    fn test_build_state() {
        let state = build_state(&config(), Arc::new(MockChain::default()), wallet()).unwrap();
        assert_eq!(state.pipeline.sender(), wallet().address());
        assert_eq!(state.max_confirmation_wait, Duration::from_secs(59));
    }

    #[test]
    fn test_nonce_wait_fits_inside_request_timeout() {
        let mut config = config();
        assert_eq!(nonce_wait(&config), Duration::from_secs(19));

        config.timeouts.request_secs = 5;
        assert_eq!(nonce_wait(&config), Duration::from_secs(1));
    }

    #[test]
    fn test_sender_mismatch_is_fatal() {
        let mut config = config();
        config.token.sender_address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".into();
        let err = build_state(&config, Arc::new(MockChain::default()), wallet()).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_missing_contract_is_fatal() {
        let err = build_state(
            &GatewayConfig::default(),
            Arc::new(MockChain::default()),
            wallet(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("token.contract_address"));
    }
}
