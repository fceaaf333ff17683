//! Contract event decoding and history reconstruction.
//!
//! # Data Flow
//! ```text
//! ChainClient::logs / transaction_receipt
//!     → schema.rs (field layout per topic0)
//!     → decoder.rs (topics + data → DecodedEvent)
//!     → record.rs (DecodedEvent → TransactionRecord)
//!     → aggregator.rs (range scan, point lookup, account history)
//! ```

pub mod aggregator;
pub mod decoder;
pub mod record;
pub mod schema;

pub use aggregator::{AccountHistory, BlockRange, Direction, EventAggregator, HistoryEntry};
pub use decoder::{decode_event, DecodedEvent, FieldValue};
pub use record::TransactionRecord;
pub use schema::{EventRegistry, EventSchema, FieldDescriptor, FieldType};
