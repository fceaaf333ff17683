//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml (optional) + environment (.env via dotenvy)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to constructors of the chain client, signer and aggregator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - The signing key never lives in the config file; see `blockchain::wallet`

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BlockchainConfig;
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::TokenConfig;
