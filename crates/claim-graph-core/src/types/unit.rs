//! Atomic unit: a single scientific proposition with provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Unique identifier for atomic units (UUID v4).
pub type UnitId = Uuid;

/// Embedding vector type.
pub type EmbeddingVector = Vec<f32>;

/// Default embedding dimension (OpenAI text-embedding-3 compatible).
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Mid confidence assigned when the caller omits one.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// An atomic scientific proposition stored in the knowledge graph.
///
/// Units are create-only: `id`, `embedding` and `created_at` are set once
/// at ingestion and never mutated afterward. A unit with the same `id` is
/// never re-embedded.
///
/// # Example
///
/// ```rust
/// use claim_graph_core::types::AtomicUnit;
///
/// let unit = AtomicUnit::new("Mass bends spacetime", "Einstein 1915", vec![0.0; 8])
///     .with_confidence(0.95);
/// assert_eq!(unit.confidence, 0.95);
/// assert!(unit.tags.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicUnit {
    /// Unique identifier, generated at creation, immutable.
    pub id: UnitId,

    /// The proposition text. Non-empty.
    pub content: String,

    /// Provenance string (citation, free text).
    pub source: String,

    /// Confidence score [0.0, 1.0].
    pub confidence: f32,

    /// Dense embedding vector, derived from `content` at ingestion time.
    pub embedding: EmbeddingVector,

    /// Timestamp set once at creation.
    pub created_at: DateTime<Utc>,

    /// Optional categorization tags (deduplicated).
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AtomicUnit {
    /// Create a new unit with a fresh id, the default confidence and no
    /// tags.
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        embedding: EmbeddingVector,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            source: source.into(),
            confidence: DEFAULT_CONFIDENCE,
            embedding,
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// Set the confidence score. Returns self for builder chaining.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the tags, deduplicating while preserving order. Returns self
    /// for builder chaining.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags.clear();
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    /// Add a tag. Duplicates are ignored.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Check whether a tag is present.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Validate unit constraints.
    ///
    /// # Checks (in order)
    /// 1. Content is non-empty (after trimming)
    /// 2. Confidence is in [0.0, 1.0] and not NaN
    /// 3. Embedding dimension matches `expected_dim`
    ///
    /// Returns `Ok(())` if all checks pass, the first failure otherwise.
    pub fn validate(&self, expected_dim: usize) -> CoreResult<()> {
        if self.content.trim().is_empty() {
            return Err(CoreError::validation("content", "must not be empty"));
        }

        if !(0.0..=1.0).contains(&self.confidence) || self.confidence.is_nan() {
            return Err(CoreError::ConfidenceOutOfBounds {
                value: self.confidence,
            });
        }

        if self.embedding.len() != expected_dim {
            return Err(CoreError::DimensionMismatch {
                expected: expected_dim,
                actual: self.embedding.len(),
            });
        }

        Ok(())
    }
}
