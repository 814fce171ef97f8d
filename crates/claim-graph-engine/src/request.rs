//! Mutation request payloads.

use claim_graph_core::types::{RelationType, UnitId};

/// Parameters for ingesting a new unit.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Proposition text. Must be non-empty.
    pub content: String,
    /// Provenance string. May be empty.
    pub source: String,
    /// Confidence override; defaults to the model default when absent.
    pub confidence: Option<f32>,
    /// Categorization tags.
    pub tags: Vec<String>,
    /// Caller-supplied replay key. Absent means no replay protection.
    pub idempotency_key: Option<String>,
}

impl IngestRequest {
    /// Request with content and source, defaults elsewhere.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            confidence: None,
            tags: Vec::new(),
            idempotency_key: None,
        }
    }

    /// Set the confidence score.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Set the idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Parameters for connecting two existing units.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Relation source endpoint. Must be an ingested unit.
    pub source_id: UnitId,
    /// Relation target endpoint. Must be an ingested unit.
    pub target_id: UnitId,
    /// Edge type.
    pub relation_type: RelationType,
    /// Justification text. Must be non-empty.
    pub reasoning: String,
    /// Caller-supplied replay key.
    pub idempotency_key: Option<String>,
}

impl ConnectRequest {
    /// Request connecting `source_id` to `target_id`.
    pub fn new(
        source_id: UnitId,
        target_id: UnitId,
        relation_type: RelationType,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            source_id,
            target_id,
            relation_type,
            reasoning: reasoning.into(),
            idempotency_key: None,
        }
    }

    /// Set the idempotency key.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
