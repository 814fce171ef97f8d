//! Domain types for the claim-graph engine.

mod idempotency;
mod relation;
mod unit;

pub use idempotency::{cache_key, IdempotentReply, OperationKind};
pub use relation::{Relation, RelationId, RelationType};
pub use unit::{AtomicUnit, EmbeddingVector, UnitId, DEFAULT_CONFIDENCE, DEFAULT_EMBEDDING_DIM};
