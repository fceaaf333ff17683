//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, precision representable)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::numeric::MAX_DECIMALS;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if config.blockchain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            format!("'{}' is not a URL", config.blockchain.rpc_url),
        ));
    }
    for url in &config.blockchain.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                "blockchain.failover_urls",
                format!("'{}' is not a URL", url),
            ));
        }
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be > 0"));
    }
    if config.blockchain.confirmation_poll_ms == 0 {
        errors.push(ValidationError::new(
            "blockchain.confirmation_poll_ms",
            "must be > 0",
        ));
    }

    if config.token.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "token.contract_address",
            format!("'{}' is not an address", config.token.contract_address),
        ));
    }
    if !config.token.sender_address.is_empty()
        && config.token.sender_address.parse::<Address>().is_err()
    {
        errors.push(ValidationError::new(
            "token.sender_address",
            format!("'{}' is not an address", config.token.sender_address),
        ));
    }
    if config.token.decimals > MAX_DECIMALS {
        errors.push(ValidationError::new(
            "token.decimals",
            format!("must be <= {}", MAX_DECIMALS),
        ));
    }
    if config.token.log_chunk_size == 0 {
        errors.push(ValidationError::new("token.log_chunk_size", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
