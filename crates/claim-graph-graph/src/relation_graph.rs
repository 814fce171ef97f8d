//! Directed adjacency-list multigraph of typed relations.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use claim_graph_core::types::{Relation, RelationType, UnitId};

use crate::error::{GraphError, GraphResult};

/// Edge direction selector for neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges starting at the queried unit.
    Outgoing,
    /// Edges pointing at the queried unit.
    Incoming,
    /// Both directions.
    Both,
}

/// In-memory directed multigraph keyed by unit id.
///
/// Adjacency lists give O(degree) neighbor lookup. Multiple relations may
/// connect the same ordered pair (same or different types); cycles are
/// allowed, so traversals must carry their own visited sets.
///
/// Endpoints must be registered (via [`register_unit`]) before an edge can
/// reference them; the engine registers every ingested unit.
///
/// [`register_unit`]: RelationGraph::register_unit
#[derive(Debug, Default, Clone)]
pub struct RelationGraph {
    units: HashSet<UnitId>,
    outgoing: HashMap<UnitId, Vec<Relation>>,
    incoming: HashMap<UnitId, Vec<Relation>>,
    relation_count: usize,
}

impl RelationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit id as a valid edge endpoint.
    pub fn register_unit(&mut self, id: UnitId) {
        self.units.insert(id);
    }

    /// Whether a unit id is registered.
    pub fn contains_unit(&self, id: UnitId) -> bool {
        self.units.contains(&id)
    }

    /// Number of registered units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of edges in the graph.
    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    /// Total degree (in + out) of a unit.
    pub fn degree(&self, id: UnitId) -> usize {
        self.outgoing.get(&id).map_or(0, Vec::len) + self.incoming.get(&id).map_or(0, Vec::len)
    }

    /// Insert a directed edge.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownUnit` if either endpoint is not a
    /// registered unit. The graph is unchanged on error.
    pub fn add_edge(&mut self, relation: Relation) -> GraphResult<()> {
        if !self.contains_unit(relation.source_id) {
            return Err(GraphError::UnknownUnit {
                id: relation.source_id,
            });
        }
        if !self.contains_unit(relation.target_id) {
            return Err(GraphError::UnknownUnit {
                id: relation.target_id,
            });
        }

        self.incoming
            .entry(relation.target_id)
            .or_default()
            .push(relation.clone());
        self.outgoing
            .entry(relation.source_id)
            .or_default()
            .push(relation);
        self.relation_count += 1;
        Ok(())
    }

    /// Relations touching `id` in the given direction, optionally
    /// restricted to one type. Returned in insertion order (outgoing
    /// before incoming for `Both`).
    pub fn neighbors(
        &self,
        id: UnitId,
        direction: Direction,
        type_filter: Option<RelationType>,
    ) -> Vec<&Relation> {
        let mut out: Vec<&Relation> = Vec::new();

        if matches!(direction, Direction::Outgoing | Direction::Both) {
            if let Some(edges) = self.outgoing.get(&id) {
                out.extend(edges.iter());
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            if let Some(edges) = self.incoming.get(&id) {
                out.extend(edges.iter());
            }
        }

        if let Some(filter) = type_filter {
            out.retain(|r| r.relation_type == filter);
        }
        out
    }

    /// Outgoing edges of `id` whose type is in `types`.
    pub fn outgoing_with_types(&self, id: UnitId, types: &[RelationType]) -> Vec<&Relation> {
        self.outgoing
            .get(&id)
            .map(|edges| {
                edges
                    .iter()
                    .filter(|r| types.contains(&r.relation_type))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build a fresh graph from known unit ids and a relation log.
    ///
    /// All-or-nothing: any relation whose endpoints are not in `units`
    /// or whose justification fails validation aborts the rebuild, so a
    /// corrupt log never produces a partial graph. Callers swap the
    /// returned graph in atomically.
    pub fn rebuild_from(
        units: impl IntoIterator<Item = UnitId>,
        relations: &[Relation],
    ) -> GraphResult<Self> {
        let mut graph = Self::new();
        for id in units {
            graph.register_unit(id);
        }

        for (index, relation) in relations.iter().enumerate() {
            relation
                .validate()
                .map_err(|e| GraphError::RebuildAborted {
                    index,
                    message: e.to_string(),
                })?;
            graph
                .add_edge(relation.clone())
                .map_err(|e| GraphError::RebuildAborted {
                    index,
                    message: e.to_string(),
                })?;
        }

        debug!(
            units = graph.unit_count(),
            relations = graph.relation_count(),
            "graph rebuilt from ledger"
        );
        Ok(graph)
    }
}
