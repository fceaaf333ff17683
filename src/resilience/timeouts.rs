//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every remote ledger call with a deadline
//! - Map an elapsed deadline to `ChainUnavailable`
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from RPC errors returned by the node
//! - No retry here: a failed attempt is reported once to the caller

use std::future::Future;
use std::time::Duration;

use crate::error::{GatewayError, GatewayResult};

/// Run `fut` with a deadline. `operation` names the call in the error.
pub async fn with_deadline<T, F>(duration: Duration, operation: &str, fut: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::ChainUnavailable(format!(
            "{} timed out after {:?}",
            operation, duration
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_deadline() {
        let result = with_deadline(Duration::from_millis(100), "eth_blockNumber", async {
            Ok::<_, GatewayError>(7u64)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_chain_unavailable() {
        let result: GatewayResult<()> =
            with_deadline(Duration::from_secs(5), "eth_sendRawTransaction", async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, GatewayError::ChainUnavailable(_)));
        assert!(err.to_string().contains("eth_sendRawTransaction timed out"));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: GatewayResult<()> = with_deadline(Duration::from_secs(1), "eth_call", async {
            Err(GatewayError::Rpc("boom".into()))
        })
        .await;
        assert!(matches!(result, Err(GatewayError::Rpc(_))));
    }
}
