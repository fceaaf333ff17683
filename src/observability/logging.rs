//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from `RUST_LOG` or the config file
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over `observability.log_level`
//! - Secrets never enter a span or event field

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by [`init_logging`].
pub fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "token_gateway={level},gateway_cli={level},tower_http={level}",
            level = log_level
        ))
    })
}

/// Install the global subscriber. Safe to call once per process.
pub fn init_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(build_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_mentions_crate() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter("debug");
        assert!(filter.to_string().contains("token_gateway=debug"));
    }
}
