//! Core trait seams: storage and embedding providers.

mod embedding;
mod vector_store;

pub use embedding::EmbeddingProvider;
pub use vector_store::{cosine_similarity, ListFilter, ScoredUnit, VectorStore};
