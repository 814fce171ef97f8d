//! Engine façade over the claim-graph components.
//!
//! [`KnowledgeGraphEngine`] owns the durable unit store, the relation
//! ledger and the in-memory graph, exposing ingestion, semantic search,
//! lineage tracing and contradiction detection behind one handle.
//! Startup rebuilds the graph from the ledger and refuses to open on
//! any ledger/store disagreement.

pub mod engine;
pub mod error;
pub mod request;

pub use engine::{EngineStats, KnowledgeGraphEngine};
pub use error::{EngineError, EngineResult};
pub use request::{ConnectRequest, IngestRequest};
