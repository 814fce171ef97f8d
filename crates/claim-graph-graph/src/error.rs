//! Error types for the relation graph.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by graph mutation and rebuild.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge endpoint is not a registered unit.
    #[error("Unknown unit: {id}")]
    UnknownUnit {
        /// The endpoint id that is not registered
        id: Uuid,
    },

    /// Rebuild aborted on a corrupt ledger entry; no partial graph is
    /// exposed.
    #[error("Graph rebuild aborted at relation {index}: {message}")]
    RebuildAborted {
        /// Zero-based index of the offending relation in the log
        index: usize,
        /// What made the entry unusable
        message: String,
    },
}

/// Convenience alias for results with [`GraphError`].
pub type GraphResult<T> = Result<T, GraphError>;
