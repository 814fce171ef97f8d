//! Stub embedding provider for testing.
//!
//! Generates DETERMINISTIC embeddings based on a content hash:
//!
//! 1. Hash the text with DefaultHasher
//! 2. Seed an LCG PRNG with the hash
//! 3. Fill a vector from the seeded PRNG
//! 4. Normalize to unit length
//!
//! Same text always produces the same vector, different text produces a
//! different one, and all vectors are unit-normalized so cosine scores
//! are valid. Never use a constant vector here: identical embeddings for
//! every unit would make similarity search meaningless in tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::traits::EmbeddingProvider;
use crate::types::DEFAULT_EMBEDDING_DIM;

/// Deterministic hash-based embedding provider.
///
/// # Example
///
/// ```rust
/// use claim_graph_core::stubs::StubEmbeddingProvider;
/// use claim_graph_core::traits::EmbeddingProvider;
///
/// let provider = StubEmbeddingProvider::new();
/// assert_eq!(provider.dimension(), 1536);
/// assert!(provider.is_ready());
/// ```
pub struct StubEmbeddingProvider {
    dimension: usize,
    model_id: String,
}

impl Default for StubEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StubEmbeddingProvider {
    /// Create with the default dimension.
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_EMBEDDING_DIM)
    }

    /// Create with a specific dimension (small dimensions keep tests fast).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: "stub-hash-embedder".to_string(),
        }
    }

    fn hash_seed(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    fn generate(&self, seed: u64) -> Vec<f32> {
        // Numerical Recipes LCG constants; quality is irrelevant here,
        // determinism is the point.
        let mut state = seed;
        let mut vector = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            // Map the top 31 bits into [-1, 1); a one-sided range would
            // push every vector into the same orthant and inflate the
            // cosine score between unrelated texts.
            let value = ((state >> 33) as f32 / (u32::MAX >> 1) as f32) * 2.0 - 1.0;
            vector.push(value);
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(CoreError::Embedding(
                "cannot embed empty text".to_string(),
            ));
        }
        Ok(self.generate(Self::hash_seed(text)))
    }
}
