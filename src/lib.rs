//! Token gateway library.
//!
//! An HTTP gateway in front of one token contract. Writes go through the
//! transaction pipeline (build call data, simulate, price, sign, submit);
//! reads go through the token reader and the event aggregator, which rebuilds
//! history from contract logs on every query.
//!
//! ```text
//!   client ──▶ http ──▶ blockchain::TransactionPipeline ──▶ ChainClient ──▶ node
//!                 │ ──▶ blockchain::TokenReader ───────────▶ │
//!                 └───▶ events::EventAggregator ────────────▶ │
//! ```

// Core
pub mod blockchain;
pub mod events;
pub mod numeric;

// Surface
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::GatewayConfig;
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
