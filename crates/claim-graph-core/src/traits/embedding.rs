//! Embedding provider trait: opaque text-to-vector function.

use async_trait::async_trait;

use crate::error::CoreResult;

/// External embedding service seam.
///
/// The engine treats failures as retryable by the caller and never
/// substitutes a zero vector for a failed call.
///
/// # Object Safety
///
/// This trait is object-safe and is consumed as `Arc<dyn EmbeddingProvider>`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Fixed embedding dimension for this provider.
    ///
    /// All vectors returned by `embed` have exactly this length.
    fn dimension(&self) -> usize;

    /// Model identifier, used for logging and version consistency.
    fn model_id(&self) -> &str;

    /// Derive a dense embedding vector from text.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Embedding` if the provider is unavailable or
    /// produced a malformed response. Nothing is persisted on failure.
    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>>;

    /// Whether the provider is loaded and ready to serve.
    fn is_ready(&self) -> bool {
        true
    }
}
