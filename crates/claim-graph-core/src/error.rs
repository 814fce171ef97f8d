//! Error types for claim-graph-core.
//!
//! Defines the central [`CoreError`] used throughout the core crate and by
//! implementors of the core traits, along with the [`CoreResult<T>`] alias.
//!
//! # Examples
//!
//! ```rust
//! use claim_graph_core::CoreError;
//! use uuid::Uuid;
//!
//! fn lookup_unit(id: Uuid) -> Result<(), CoreError> {
//!     Err(CoreError::UnknownUnit { id })
//! }
//!
//! assert!(lookup_unit(Uuid::nil()).is_err());
//! ```

use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for core operations.
///
/// Validation variants are always raised before any write, so a
/// `CoreError` from a mutating call implies no partial state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field value failed validation constraints.
    ///
    /// # When This Occurs
    ///
    /// - Empty proposition content or reasoning text
    /// - NaN in numeric fields
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Confidence score outside the allowed [0.0, 1.0] range.
    #[error("Confidence {value} is out of bounds [0, 1]")]
    ConfidenceOutOfBounds {
        /// The invalid value provided
        value: f32,
    },

    /// A relation type tag was not part of the closed enumeration.
    ///
    /// Relation types must be recognized tags, never arbitrary text.
    #[error("Unrecognized relation type tag: '{tag}'")]
    UnknownRelationType {
        /// The tag that failed to parse
        tag: String,
    },

    /// Embedding vector dimension does not match the configured size.
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension provided
        actual: usize,
    },

    /// A unit id referenced an entry that does not exist in the store.
    ///
    /// Raised when connecting relations to endpoints that were never
    /// ingested, before anything is appended.
    #[error("Unknown unit: {id}")]
    UnknownUnit {
        /// The unit id that was not found
        id: Uuid,
    },

    /// A unit with this id already exists in the store.
    ///
    /// Only possible on an id-generation collision; fatal to the
    /// operation, never silently retried with a new id.
    #[error("Duplicate unit id: {id}")]
    DuplicateId {
        /// The colliding unit id
        id: Uuid,
    },

    /// An error occurred in the underlying storage medium.
    ///
    /// The operation failed and left no durable state change; callers may
    /// retry.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The embedding provider was unavailable or returned a malformed
    /// response. Nothing is persisted; callers may retry.
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for results with [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Shorthand for a field validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
