//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the token gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Remote ledger RPC settings.
    pub blockchain: BlockchainConfig,

    /// Token contract settings.
    pub token: TokenConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Remote ledger RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads only.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 80001 for Polygon Mumbai, 31337 for local Anvil).
    pub chain_id: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations reported as final by `await_confirmation`.
    pub confirmation_blocks: u32,

    /// Receipt polling interval while awaiting confirmation, in milliseconds.
    pub confirmation_poll_ms: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_poll_ms: 2000,
        }
    }
}

/// Token contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Deployed token contract address.
    pub contract_address: String,

    /// Custodial sender address. Empty means "whatever the signing key derives".
    pub sender_address: String,

    /// Token precision (18 for ether-style tokens).
    pub decimals: u8,

    /// First block scanned when no range start is given.
    pub deployment_block: u64,

    /// Width of each `eth_getLogs` window during a bulk scan.
    pub log_chunk_size: u64,

    /// Serialise nonce acquisition per sender inside the gateway.
    pub serialize_nonces: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            contract_address: String::new(),
            sender_address: String::new(),
            decimals: 18,
            deployment_block: 0,
            log_chunk_size: 10_000,
            serialize_nonces: true,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Allow any origin (the original gateway ran with open CORS).
    pub permissive_cors: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            permissive_cors: true,
        }
    }
}
