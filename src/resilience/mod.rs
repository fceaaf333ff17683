//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to the RPC endpoint:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On expiry: ChainUnavailable, surfaced to the caller as-is
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: resubmitting a signed transaction is not idempotent

pub mod timeouts;

pub use timeouts::with_deadline;
