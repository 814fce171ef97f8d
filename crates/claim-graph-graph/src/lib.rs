//! In-memory relation graph and the algorithms over it.
//!
//! - [`RelationGraph`]: directed adjacency-list multigraph of typed,
//!   justified edges between unit ids, rebuilt from the durable ledger at
//!   startup.
//! - [`LineageTracer`]: bounded BFS returning all minimal-hop paths in a
//!   deterministic order.
//! - [`ContradictionDetector`]: explicit `contradicts` edges combined
//!   with similarity heuristics.

pub mod contradiction;
pub mod error;
pub mod lineage;
pub mod relation_graph;

pub use contradiction::{ContradictionDetector, ContradictionFinding, ContradictionReason};
pub use error::{GraphError, GraphResult};
pub use lineage::{LineagePath, LineagePaths, LineageStep, LineageTracer, DEFAULT_MAX_DEPTH};
pub use relation_graph::{Direction, RelationGraph};
