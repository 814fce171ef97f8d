//! Durable storage for the claim-graph engine.
//!
//! Two backing media, with different durability disciplines:
//!
//! - [`RocksVectorStore`]: the unit store — RocksDB with column families
//!   for unit records and a temporal index, brute-force cosine scan for
//!   similarity queries.
//! - [`PersistenceLedger`]: relations and the idempotency cache — JSON
//!   files rewritten through a temp-file-then-atomic-rename on every
//!   append, so a crash mid-write can never truncate the log.

pub mod column_families;
pub mod error;
pub mod ledger;
pub mod serialization;
pub mod vector_store;

pub use error::{LedgerError, LedgerResult, StorageError, StorageResult};
pub use ledger::PersistenceLedger;
pub use vector_store::RocksVectorStore;
