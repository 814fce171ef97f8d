//! Vector store trait: durable unit storage with similarity queries.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{AtomicUnit, UnitId};

/// Filter options for listing units.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Only return units carrying this tag.
    pub tag: Option<String>,
}

impl ListFilter {
    /// Filter by tag. Returns self for builder chaining.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Whether a unit passes this filter.
    pub fn accepts(&self, unit: &AtomicUnit) -> bool {
        match &self.tag {
            Some(tag) => unit.has_tag(tag),
            None => true,
        }
    }
}

/// A unit paired with its similarity score.
pub type ScoredUnit = (AtomicUnit, f32);

/// Durable columnar storage of units with fixed-dimension embeddings.
///
/// Implementations must make `put` durable before returning: a write that
/// succeeded survives process restart. Write failures surface as
/// `CoreError::Storage`, never silently dropped.
///
/// The reference implementation is a brute-force linear scan with cosine
/// similarity; an approximate index can replace it later without changing
/// this contract.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persist a unit with its embedding.
    ///
    /// # Errors
    ///
    /// - `CoreError::DuplicateId` if the id already exists
    /// - `CoreError::Storage` on I/O failure (no durable state change)
    async fn put(&self, unit: AtomicUnit) -> CoreResult<()>;

    /// Retrieve a unit by id. Returns `None` if absent.
    async fn get(&self, id: UnitId) -> CoreResult<Option<AtomicUnit>>;

    /// List units in stable insertion order (`created_at`, then id).
    async fn list(
        &self,
        filter: ListFilter,
        limit: usize,
        offset: usize,
    ) -> CoreResult<Vec<AtomicUnit>>;

    /// Return the `k` most similar units to `query`, scored by cosine
    /// similarity, descending. Ties are broken by earlier `created_at`
    /// for determinism.
    async fn similarity_search(&self, query: &[f32], k: usize) -> CoreResult<Vec<ScoredUnit>>;

    /// Total number of stored units.
    async fn count(&self) -> CoreResult<usize>;

    /// Flush buffered writes to stable storage. No-op for in-memory
    /// backends.
    async fn flush(&self) -> CoreResult<()>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 on dimension mismatch or zero-magnitude input rather than
/// propagating NaN into score ordering.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
