//! Idempotency records: exact replay payloads for logical writes.
//!
//! A caller-supplied key maps to the exact result produced the first time
//! that key was seen. Keys are scoped per operation kind and never expire.

use serde::{Deserialize, Serialize};

use crate::types::{AtomicUnit, Relation};

/// The logical write operation a key is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Unit ingestion.
    Ingest,
    /// Relation creation.
    Connect,
}

impl OperationKind {
    /// Stable tag used in cache keys and persisted records.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Connect => "connect",
        }
    }
}

/// Compose the persisted cache key for an operation-scoped caller key.
///
/// The same caller key used for both `ingest` and `connect` produces two
/// distinct entries.
pub fn cache_key(kind: OperationKind, key: &str) -> String {
    format!("{}/{}", kind.as_str(), key)
}

/// The exact result payload recorded for a first-seen idempotency key.
///
/// Replayed verbatim on duplicate keys; replay is a success, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "result", rename_all = "snake_case")]
pub enum IdempotentReply {
    /// Result of a unit ingestion.
    Unit(AtomicUnit),
    /// Result of a relation creation.
    Relation(Relation),
}

impl IdempotentReply {
    /// The unit payload, if this reply records an ingestion.
    pub fn as_unit(&self) -> Option<&AtomicUnit> {
        match self {
            Self::Unit(unit) => Some(unit),
            Self::Relation(_) => None,
        }
    }

    /// The relation payload, if this reply records a connection.
    pub fn as_relation(&self) -> Option<&Relation> {
        match self {
            Self::Relation(relation) => Some(relation),
            Self::Unit(_) => None,
        }
    }

    /// Whether the payload variant matches the given operation kind.
    pub fn matches(&self, kind: OperationKind) -> bool {
        matches!(
            (self, kind),
            (Self::Unit(_), OperationKind::Ingest) | (Self::Relation(_), OperationKind::Connect)
        )
    }
}
