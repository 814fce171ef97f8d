//! Shortest-path lineage tracing over derivation edges.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use claim_graph_core::types::{Relation, RelationType, UnitId};

use crate::error::{GraphError, GraphResult};
use crate::relation_graph::RelationGraph;

/// Default traversal depth cap.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// One hop in a lineage path.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageStep {
    /// The relation crossed by this hop.
    pub relation: Relation,
    /// The unit the hop arrives at.
    pub to: UnitId,
}

/// A derivation chain from a start unit to an end unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LineagePath {
    /// The unit the path starts at.
    pub start: UnitId,
    /// Hops in order from start to end.
    pub steps: Vec<LineageStep>,
}

impl LineagePath {
    /// Number of hops in the path.
    pub fn hops(&self) -> usize {
        self.steps.len()
    }

    /// The unit the path ends at.
    pub fn ends_at(&self) -> UnitId {
        self.steps.last().map_or(self.start, |s| s.to)
    }

    /// Unit ids visited in order, start included.
    pub fn node_ids(&self) -> Vec<UnitId> {
        let mut ids = Vec::with_capacity(self.steps.len() + 1);
        ids.push(self.start);
        ids.extend(self.steps.iter().map(|s| s.to));
        ids
    }
}

/// Traces derivation lineage between two units.
///
/// Follows outgoing edges whose type is in the lineage set
/// (`derives_from`, `extends`, `refines` by default) with breadth-first
/// search, so every reported path has minimal hop count. All minimal
/// paths are reported, enumerated lazily in lexical order of their
/// visited unit-id sequences; parallel edges between the same pair are
/// ordered by creation time, then relation id.
///
/// Cycles are handled by the level structure of BFS: a shortest path
/// never revisits a node, so traversal terminates on cyclic graphs.
#[derive(Debug, Clone)]
pub struct LineageTracer {
    max_depth: usize,
    types: Vec<RelationType>,
}

impl Default for LineageTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineageTracer {
    /// Tracer with the default depth cap and lineage relation types.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            types: RelationType::all()
                .iter()
                .copied()
                .filter(RelationType::is_lineage)
                .collect(),
        }
    }

    /// Override the depth cap.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Override the relation types followed during traversal.
    pub fn with_types(mut self, types: Vec<RelationType>) -> Self {
        self.types = types;
        self
    }

    /// The depth cap in effect.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Enumerate all minimal-hop lineage paths from `from` to `to`.
    ///
    /// The returned iterator is lazy: it materializes one path per
    /// `next` call, so callers can stop after the first path without
    /// paying for the rest. An empty iterator means `to` is not
    /// reachable within the depth cap.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownUnit` if either endpoint is not
    /// registered in the graph.
    pub fn trace(
        &self,
        graph: &RelationGraph,
        from: UnitId,
        to: UnitId,
    ) -> GraphResult<LineagePaths> {
        if !graph.contains_unit(from) {
            return Err(GraphError::UnknownUnit { id: from });
        }
        if !graph.contains_unit(to) {
            return Err(GraphError::UnknownUnit { id: to });
        }

        if from == to {
            return Ok(LineagePaths::single(LineagePath {
                start: from,
                steps: Vec::new(),
            }));
        }

        // BFS level structure: depth[v] is the minimal hop count from
        // `from` to v, computed up to the depth cap.
        let mut depth: HashMap<UnitId, usize> = HashMap::new();
        depth.insert(from, 0);
        let mut frontier = VecDeque::from([from]);
        let mut target_depth: Option<usize> = None;

        while let Some(node) = frontier.pop_front() {
            let d = depth[&node];
            if d >= self.max_depth || target_depth.is_some_and(|td| d >= td) {
                continue;
            }
            for edge in graph.outgoing_with_types(node, &self.types) {
                let next = edge.target_id;
                if !depth.contains_key(&next) {
                    depth.insert(next, d + 1);
                    if next == to {
                        target_depth = Some(d + 1);
                    }
                    frontier.push_back(next);
                }
            }
        }

        let Some(target_depth) = target_depth else {
            debug!(%from, %to, max_depth = self.max_depth, "no lineage path within depth cap");
            return Ok(LineagePaths::empty(from));
        };

        // Keep only nodes lying on some minimal path: walk backwards
        // from `to` along edges that decrease depth by exactly one.
        let mut on_path: HashSet<UnitId> = HashSet::from([to]);
        for d in (1..=target_depth).rev() {
            let level: Vec<UnitId> = on_path
                .iter()
                .copied()
                .filter(|id| depth.get(id) == Some(&d))
                .collect();
            for node in level {
                for edge in graph.neighbors(node, crate::Direction::Incoming, None) {
                    if self.types.contains(&edge.relation_type)
                        && depth.get(&edge.source_id) == Some(&(d - 1))
                    {
                        on_path.insert(edge.source_id);
                    }
                }
            }
        }

        // Forward adjacency over the pruned DAG, sorted so enumeration
        // yields paths in lexical unit-id order.
        let mut dag: HashMap<UnitId, Vec<Relation>> = HashMap::new();
        for &node in &on_path {
            let d = depth[&node];
            if d >= target_depth {
                continue;
            }
            let mut edges: Vec<Relation> = graph
                .outgoing_with_types(node, &self.types)
                .into_iter()
                .filter(|e| on_path.contains(&e.target_id) && depth[&e.target_id] == d + 1)
                .cloned()
                .collect();
            edges.sort_by(|a, b| {
                a.target_id
                    .cmp(&b.target_id)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            });
            dag.insert(node, edges);
        }

        Ok(LineagePaths::over_dag(from, to, dag))
    }
}

/// Lazy iterator over minimal-hop lineage paths.
///
/// Backed by a depth-first walk of the pruned shortest-path DAG; the
/// stack holds one frame per hop of the path under construction.
#[derive(Debug)]
pub struct LineagePaths {
    start: UnitId,
    target: UnitId,
    dag: HashMap<UnitId, Vec<Relation>>,
    // (node, index of the next edge of `node` to try)
    stack: Vec<(UnitId, usize)>,
    steps: Vec<LineageStep>,
    trivial: Option<LineagePath>,
    done: bool,
}

impl LineagePaths {
    fn empty(start: UnitId) -> Self {
        Self {
            start,
            target: start,
            dag: HashMap::new(),
            stack: Vec::new(),
            steps: Vec::new(),
            trivial: None,
            done: true,
        }
    }

    fn single(path: LineagePath) -> Self {
        Self {
            start: path.start,
            target: path.start,
            dag: HashMap::new(),
            stack: Vec::new(),
            steps: Vec::new(),
            trivial: Some(path),
            done: true,
        }
    }

    fn over_dag(start: UnitId, target: UnitId, dag: HashMap<UnitId, Vec<Relation>>) -> Self {
        Self {
            start,
            target,
            dag,
            stack: vec![(start, 0)],
            steps: Vec::new(),
            trivial: None,
            done: false,
        }
    }
}

impl Iterator for LineagePaths {
    type Item = LineagePath;

    fn next(&mut self) -> Option<LineagePath> {
        if let Some(path) = self.trivial.take() {
            return Some(path);
        }
        if self.done {
            return None;
        }

        while let Some((node, edge_idx)) = self.stack.last_mut() {
            let edges = self.dag.get(node).map_or(&[][..], Vec::as_slice);
            if *edge_idx >= edges.len() {
                self.stack.pop();
                self.steps.pop();
                continue;
            }

            let edge = edges[*edge_idx].clone();
            *edge_idx += 1;
            let next = edge.target_id;
            self.steps.push(LineageStep {
                relation: edge,
                to: next,
            });

            if next == self.target {
                let path = LineagePath {
                    start: self.start,
                    steps: self.steps.clone(),
                };
                self.steps.pop();
                return Some(path);
            }
            self.stack.push((next, 0));
        }

        self.done = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn setup(n: usize) -> (RelationGraph, Vec<UnitId>) {
        let mut graph = RelationGraph::new();
        let mut ids: Vec<UnitId> = (0..n).map(|_| Uuid::new_v4()).collect();
        ids.sort();
        for id in &ids {
            graph.register_unit(*id);
        }
        (graph, ids)
    }

    fn link(graph: &mut RelationGraph, a: UnitId, b: UnitId, rt: RelationType) {
        graph.add_edge(Relation::new(a, b, rt, "chain")).unwrap();
    }

    #[test]
    fn single_chain_is_found() {
        let (mut graph, ids) = setup(3);
        link(&mut graph, ids[0], ids[1], RelationType::DerivesFrom);
        link(&mut graph, ids[1], ids[2], RelationType::Extends);

        let paths: Vec<_> = LineageTracer::new()
            .trace(&graph, ids[0], ids[2])
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].hops(), 2);
        assert_eq!(paths[0].node_ids(), ids);
    }

    #[test]
    fn only_minimal_hop_paths_are_reported() {
        // Direct edge plus a two-hop detour; only the direct edge counts.
        let (mut graph, ids) = setup(3);
        link(&mut graph, ids[0], ids[2], RelationType::Refines);
        link(&mut graph, ids[0], ids[1], RelationType::Refines);
        link(&mut graph, ids[1], ids[2], RelationType::Refines);

        let paths: Vec<_> = LineageTracer::new()
            .trace(&graph, ids[0], ids[2])
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].hops(), 1);
    }

    #[test]
    fn diamond_yields_both_paths_in_lexical_order() {
        let (mut graph, ids) = setup(4);
        // ids[0] -> {ids[1], ids[2]} -> ids[3]
        link(&mut graph, ids[0], ids[2], RelationType::Extends);
        link(&mut graph, ids[0], ids[1], RelationType::Extends);
        link(&mut graph, ids[1], ids[3], RelationType::Extends);
        link(&mut graph, ids[2], ids[3], RelationType::Extends);

        let paths: Vec<_> = LineageTracer::new()
            .trace(&graph, ids[0], ids[3])
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 2);
        // Lexical order of node-id sequences: the path through the
        // smaller middle id comes first.
        assert_eq!(paths[0].node_ids(), vec![ids[0], ids[1], ids[3]]);
        assert_eq!(paths[1].node_ids(), vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn non_lineage_edges_are_ignored() {
        let (mut graph, ids) = setup(2);
        link(&mut graph, ids[0], ids[1], RelationType::Supports);

        let mut paths = LineageTracer::new().trace(&graph, ids[0], ids[1]).unwrap();
        assert!(paths.next().is_none());
    }

    #[test]
    fn custom_type_filter_is_honored() {
        let (mut graph, ids) = setup(2);
        link(&mut graph, ids[0], ids[1], RelationType::Supports);

        let tracer = LineageTracer::new().with_types(vec![RelationType::Supports]);
        let paths: Vec<_> = tracer.trace(&graph, ids[0], ids[1]).unwrap().collect();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn depth_cap_bounds_the_search() {
        let (mut graph, ids) = setup(4);
        link(&mut graph, ids[0], ids[1], RelationType::Extends);
        link(&mut graph, ids[1], ids[2], RelationType::Extends);
        link(&mut graph, ids[2], ids[3], RelationType::Extends);

        let tracer = LineageTracer::new().with_max_depth(2);
        let mut paths = tracer.trace(&graph, ids[0], ids[3]).unwrap();
        assert!(paths.next().is_none());

        let tracer = LineageTracer::new().with_max_depth(3);
        let paths: Vec<_> = tracer.trace(&graph, ids[0], ids[3]).unwrap().collect();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn cycles_terminate() {
        let (mut graph, ids) = setup(3);
        link(&mut graph, ids[0], ids[1], RelationType::Extends);
        link(&mut graph, ids[1], ids[0], RelationType::Extends);
        link(&mut graph, ids[1], ids[2], RelationType::Extends);

        let paths: Vec<_> = LineageTracer::new()
            .trace(&graph, ids[0], ids[2])
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].hops(), 2);
    }

    #[test]
    fn same_start_and_end_yields_empty_path() {
        let (graph, ids) = setup(1);
        let paths: Vec<_> = LineageTracer::new()
            .trace(&graph, ids[0], ids[0])
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].hops(), 0);
        assert_eq!(paths[0].ends_at(), ids[0]);
    }

    #[test]
    fn unknown_endpoint_is_an_error() {
        let (graph, ids) = setup(1);
        let unknown = Uuid::new_v4();
        let err = LineageTracer::new()
            .trace(&graph, ids[0], unknown)
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownUnit { id } if id == unknown));
    }

    #[test]
    fn iterator_is_lazy_after_first_path() {
        let (mut graph, ids) = setup(4);
        link(&mut graph, ids[0], ids[1], RelationType::Extends);
        link(&mut graph, ids[0], ids[2], RelationType::Extends);
        link(&mut graph, ids[1], ids[3], RelationType::Extends);
        link(&mut graph, ids[2], ids[3], RelationType::Extends);

        let mut paths = LineageTracer::new().trace(&graph, ids[0], ids[3]).unwrap();
        assert!(paths.next().is_some());
        // The remaining path is still pending, not dropped.
        assert!(paths.next().is_some());
        assert!(paths.next().is_none());
    }
}
