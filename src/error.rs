//! Gateway error taxonomy.
//!
//! Every failure surfaced by the pipeline, the aggregator or the codec is one
//! [`GatewayError`]. Each variant carries a human-readable cause and maps to a
//! stable [`ErrorKind`] that the HTTP layer translates into a status code.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while talking to the ledger or decoding its data.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Amount is not a valid non-negative decimal for the token's precision.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Address (or transaction hash) is not in canonical hex form.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Request body or query string could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Gas estimation showed the call would revert.
    #[error("transaction would revert: {0}")]
    WouldRevert(String),

    /// Submission rejected because the nonce was already used or replaced.
    #[error("nonce conflict: {0}")]
    NonceConflict(String),

    /// Connection failure or timeout talking to the RPC endpoint.
    #[error("chain unavailable: {0}")]
    ChainUnavailable(String),

    /// A log matched a known event signature but did not decode against its schema.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Receipt or matching event absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// The node answered with an error that fits no other kind.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Signing key problem.
    #[error("signing error: {0}")]
    Signing(String),

    /// Configuration rejected at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Stable, serialisable classification of a [`GatewayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidAmount,
    InvalidAddress,
    InvalidRequest,
    WouldRevert,
    NonceConflict,
    ChainUnavailable,
    MalformedEvent,
    NotFound,
    Rpc,
    Signing,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "INVALID_AMOUNT",
            ErrorKind::InvalidAddress => "INVALID_ADDRESS",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::WouldRevert => "WOULD_REVERT",
            ErrorKind::NonceConflict => "NONCE_CONFLICT",
            ErrorKind::ChainUnavailable => "CHAIN_UNAVAILABLE",
            ErrorKind::MalformedEvent => "MALFORMED_EVENT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Rpc => "RPC",
            ErrorKind::Signing => "SIGNING",
            ErrorKind::Config => "CONFIG",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GatewayError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidAmount(_) => ErrorKind::InvalidAmount,
            GatewayError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            GatewayError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            GatewayError::WouldRevert(_) => ErrorKind::WouldRevert,
            GatewayError::NonceConflict(_) => ErrorKind::NonceConflict,
            GatewayError::ChainUnavailable(_) => ErrorKind::ChainUnavailable,
            GatewayError::MalformedEvent(_) => ErrorKind::MalformedEvent,
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Rpc(_) => ErrorKind::Rpc,
            GatewayError::Signing(_) => ErrorKind::Signing,
            GatewayError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
