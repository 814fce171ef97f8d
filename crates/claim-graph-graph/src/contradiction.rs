//! Contradiction surfacing: explicit edges plus a semantic heuristic.

use tracing::debug;

use claim_graph_core::error::CoreResult;
use claim_graph_core::traits::VectorStore;
use claim_graph_core::types::{AtomicUnit, Relation, RelationType, UnitId};

use crate::relation_graph::{Direction, RelationGraph};

/// Why a unit was flagged as conflicting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContradictionReason {
    /// A `contradicts` or `refutes` relation links the two units.
    ExplicitEdge,
    /// The units are semantically close but take opposing stances.
    SemanticConflict,
}

impl ContradictionReason {
    /// Short human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExplicitEdge => "explicit contradiction edge",
            Self::SemanticConflict => "high similarity with conflicting confidence or stance",
        }
    }
}

/// One flagged conflict against a subject unit.
#[derive(Debug, Clone)]
pub struct ContradictionFinding {
    /// The conflicting unit.
    pub unit: AtomicUnit,
    /// How the conflict was detected.
    pub reason: ContradictionReason,
    /// Cosine similarity to the subject (1.0 for explicit edges).
    pub score: f32,
    /// The edge that declared the conflict, if explicit.
    pub relation: Option<Relation>,
}

/// Finds units that contradict a subject unit.
///
/// Two detection passes. Explicit conflicts read `contradicts` and
/// `refutes` edges from the graph in both directions. Semantic
/// conflicts run a similarity search and flag close candidates whose
/// confidence differs by more than the configured margin, or whose
/// text disagrees with the subject on negation markers (one side says
/// "not"-like words the other does not).
#[derive(Debug, Clone)]
pub struct ContradictionDetector {
    confidence_margin: f32,
    semantic_k: usize,
}

const CONFLICT_EDGE_TYPES: [RelationType; 2] = [RelationType::Contradicts, RelationType::Refutes];

const NEGATION_MARKERS: [&str; 8] = [
    "not", "no", "never", "cannot", "can't", "without", "false", "isn't",
];

impl Default for ContradictionDetector {
    fn default() -> Self {
        Self::new(0.25, 16)
    }
}

impl ContradictionDetector {
    /// Detector with the given confidence margin and semantic candidate
    /// pool size.
    pub fn new(confidence_margin: f32, semantic_k: usize) -> Self {
        Self {
            confidence_margin,
            semantic_k,
        }
    }

    /// Conflict edges touching `unit_id`, in either direction.
    ///
    /// Returned as `(other endpoint, relation)` pairs in edge insertion
    /// order.
    pub fn explicit_conflicts(
        &self,
        graph: &RelationGraph,
        unit_id: UnitId,
    ) -> Vec<(UnitId, Relation)> {
        let mut found = Vec::new();
        for edge_type in CONFLICT_EDGE_TYPES {
            for relation in graph.neighbors(unit_id, Direction::Both, Some(edge_type)) {
                if let Some(other) = relation.other_endpoint(unit_id) {
                    found.push((other, relation.clone()));
                }
            }
        }
        found
    }

    /// Semantic pass: similarity candidates above `threshold` that
    /// take an opposing stance to `subject`.
    ///
    /// Units in `exclude` are skipped (the engine passes the ids of
    /// explicitly linked conflicts so the two passes never double
    /// report). Results are sorted by score descending, creation time
    /// ascending.
    pub async fn semantic_conflicts(
        &self,
        store: &dyn VectorStore,
        subject: &AtomicUnit,
        threshold: f32,
        exclude: &[UnitId],
    ) -> CoreResult<Vec<ContradictionFinding>> {
        let candidates = store
            .similarity_search(&subject.embedding, self.semantic_k)
            .await?;

        let subject_negated = has_negation_marker(&subject.content);
        let mut findings = Vec::new();
        for (candidate, score) in candidates {
            if candidate.id == subject.id || exclude.contains(&candidate.id) {
                continue;
            }
            if score < threshold {
                // Search results are score-descending; nothing further
                // can pass the threshold.
                break;
            }

            let confidence_gap = (candidate.confidence - subject.confidence).abs();
            let stance_mismatch = has_negation_marker(&candidate.content) != subject_negated;
            if confidence_gap > self.confidence_margin || stance_mismatch {
                debug!(
                    subject = %subject.id,
                    candidate = %candidate.id,
                    score,
                    confidence_gap,
                    stance_mismatch,
                    "semantic conflict flagged"
                );
                findings.push(ContradictionFinding {
                    unit: candidate,
                    reason: ContradictionReason::SemanticConflict,
                    score,
                    relation: None,
                });
            }
        }
        Ok(findings)
    }
}

/// Whether the text contains a negation marker as a whole word.
fn has_negation_marker(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|word| {
            let word = word.to_lowercase();
            NEGATION_MARKERS.contains(&word.as_str())
        })
}
