//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key) + GatewayConfig (RPC URL, contract)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts, error classification)
//!     → transaction.rs (estimate, sign, submit, optional confirm)
//!     → reader.rs (read-only contract calls)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod abi;
pub mod client;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod nonce;
pub mod reader;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, RpcChainClient};
pub use nonce::NonceManager;
pub use reader::TokenReader;
pub use transaction::{TokenIntent, TransactionPipeline};
pub use types::{ChainId, ConfirmationStatus, PendingTransfer};
pub use wallet::Wallet;

use alloy::primitives::{Address, TxHash};

use crate::error::{GatewayError, GatewayResult};

/// Parse a `0x`-prefixed 20-byte hex address. Checksums are not enforced.
pub fn parse_address(input: &str) -> GatewayResult<Address> {
    if !input.starts_with("0x") {
        return Err(GatewayError::InvalidAddress(format!(
            "'{}' must be 0x-prefixed hex",
            input
        )));
    }
    input
        .parse()
        .map_err(|_| GatewayError::InvalidAddress(format!("'{}' is not a 20-byte hex address", input)))
}

/// Parse a `0x`-prefixed 32-byte transaction hash.
pub fn parse_tx_hash(input: &str) -> GatewayResult<TxHash> {
    if !input.starts_with("0x") {
        return Err(GatewayError::InvalidAddress(format!(
            "'{}' must be 0x-prefixed hex",
            input
        )));
    }
    input.parse().map_err(|_| {
        GatewayError::InvalidAddress(format!("'{}' is not a 32-byte transaction hash", input))
    })
}
