//! Deterministic stub implementations for testing.
//!
//! Not for production: the embedder derives vectors from a content hash
//! and the store keeps everything in memory.

mod embedding_stub;
mod vector_store_stub;

pub use embedding_stub::StubEmbeddingProvider;
pub use vector_store_stub::InMemoryVectorStore;
