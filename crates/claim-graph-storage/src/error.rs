//! Storage and ledger error types.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use claim_graph_core::CoreError;

/// Errors from the RocksDB-backed unit store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database failed to open.
    #[error("Failed to open database at '{path}': {message}")]
    OpenFailed { path: String, message: String },

    /// Column family not found (should never happen if the DB opened
    /// with the full descriptor set).
    #[error("Column family '{name}' not found")]
    ColumnFamilyNotFound { name: String },

    /// A unit with this id is already stored.
    #[error("Duplicate unit id: {id}")]
    DuplicateId { id: Uuid },

    /// Write operation failed. No durable state change.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Read operation failed.
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Flush operation failed.
    #[error("Flush failed: {0}")]
    FlushFailed(String),

    /// A stored record could not be decoded.
    #[error("Corrupt record for key '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Convenience alias for results with [`StorageError`].
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::DuplicateId { id } => CoreError::DuplicateId { id },
            other => CoreError::Storage(other.to_string()),
        }
    }
}

/// Errors from the persistence ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// I/O failure reading or writing a ledger file.
    #[error("Ledger I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A ledger file exists but its content could not be decoded.
    /// Malformed entries are rejected, never skipped.
    #[error("Malformed ledger content in '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    /// The atomic temp-file replace failed; the previous file content is
    /// still intact.
    #[error("Atomic replace failed for '{path}': {message}")]
    Replace { path: PathBuf, message: String },
}

/// Convenience alias for results with [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;
