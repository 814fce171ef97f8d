//! Engine-level error type wrapping the component errors.

use thiserror::Error;

use claim_graph_core::CoreError;
use claim_graph_graph::GraphError;
use claim_graph_storage::{LedgerError, StorageError};

/// Errors surfaced by engine operations.
///
/// Component errors pass through unchanged so callers can match on the
/// underlying cause; `Timeout` and `IdempotencyCorrupted` originate
/// here.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// An embedding or storage call exceeded its configured deadline.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// A persisted idempotency record does not match the operation it
    /// was recorded for, or references state absent from the store.
    #[error("idempotency record for key '{key}' is inconsistent with stored state")]
    IdempotencyCorrupted { key: String },
}

impl EngineError {
    /// Whether this error indicates a rejected input rather than an
    /// infrastructure failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Core(
                CoreError::Validation { .. }
                    | CoreError::ConfidenceOutOfBounds { .. }
                    | CoreError::UnknownRelationType { .. }
                    | CoreError::DimensionMismatch { .. }
                    | CoreError::UnknownUnit { .. }
            )
        )
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
