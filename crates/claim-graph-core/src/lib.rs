//! Core domain types and traits for the claim-graph engine.
//!
//! This crate defines:
//! - Domain types (`AtomicUnit`, `Relation`, `RelationType`, idempotency records)
//! - Core traits (`VectorStore`, `EmbeddingProvider`)
//! - Error types and result aliases
//! - Configuration structures
//! - Deterministic stubs for testing
//!
//! # Example
//!
//! ```
//! use claim_graph_core::types::{AtomicUnit, RelationType};
//!
//! let unit = AtomicUnit::new("Water boils at 100C at sea level", "textbook", vec![0.0; 4]);
//! assert_eq!(unit.confidence, 0.5);
//! assert_eq!("contradicts".parse::<RelationType>().unwrap(), RelationType::Contradicts);
//! ```

pub mod config;
pub mod error;
pub mod stubs;
pub mod traits;
pub mod types;

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use types::{AtomicUnit, Relation, RelationId, RelationType, UnitId};
