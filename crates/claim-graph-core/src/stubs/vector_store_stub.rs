//! In-memory stub implementation of [`VectorStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::traits::{cosine_similarity, ListFilter, ScoredUnit, VectorStore};
use crate::types::{AtomicUnit, UnitId};

/// In-memory unit store for tests and development.
///
/// A HashMap keyed by id plus an insertion-order index, behind a tokio
/// RwLock. Not durable; the RocksDB-backed store is the production
/// implementation.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    units: HashMap<UnitId, AtomicUnit>,
    insertion_order: Vec<UnitId>,
}

impl InMemoryVectorStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn put(&self, unit: AtomicUnit) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        if inner.units.contains_key(&unit.id) {
            return Err(CoreError::DuplicateId { id: unit.id });
        }
        inner.insertion_order.push(unit.id);
        inner.units.insert(unit.id, unit);
        Ok(())
    }

    async fn get(&self, id: UnitId) -> CoreResult<Option<AtomicUnit>> {
        let inner = self.inner.read().await;
        Ok(inner.units.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: ListFilter,
        limit: usize,
        offset: usize,
    ) -> CoreResult<Vec<AtomicUnit>> {
        let inner = self.inner.read().await;
        Ok(inner
            .insertion_order
            .iter()
            .filter_map(|id| inner.units.get(id))
            .filter(|unit| filter.accepts(unit))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn similarity_search(&self, query: &[f32], k: usize) -> CoreResult<Vec<ScoredUnit>> {
        let inner = self.inner.read().await;
        let mut results: Vec<ScoredUnit> = inner
            .units
            .values()
            .map(|unit| {
                let score = cosine_similarity(query, &unit.embedding);
                (unit.clone(), score)
            })
            .collect();

        // Descending score; ties broken by earlier created_at, then id.
        results.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(k);
        Ok(results)
    }

    async fn count(&self) -> CoreResult<usize> {
        let inner = self.inner.read().await;
        Ok(inner.units.len())
    }

    async fn flush(&self) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(content: &str, embedding: Vec<f32>) -> AtomicUnit {
        AtomicUnit::new(content, "test", embedding)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemoryVectorStore::new();
        let u = unit("a", vec![1.0, 0.0]);
        store.put(u.clone()).await.unwrap();
        assert_eq!(store.get(u.id).await.unwrap(), Some(u));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = InMemoryVectorStore::new();
        let u = unit("a", vec![1.0]);
        store.put(u.clone()).await.unwrap();
        assert!(matches!(
            store.put(u).await,
            Err(CoreError::DuplicateId { .. })
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = InMemoryVectorStore::new();
        let first = unit("first", vec![1.0]);
        let second = unit("second", vec![1.0]);
        let third = unit("third", vec![1.0]);
        for u in [&first, &second, &third] {
            store.put(u.clone()).await.unwrap();
        }

        let all = store.list(ListFilter::default(), 10, 0).await.unwrap();
        assert_eq!(
            all.iter().map(|u| u.content.as_str()).collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );

        let page = store.list(ListFilter::default(), 1, 1).await.unwrap();
        assert_eq!(page[0].content, "second");
    }

    #[tokio::test]
    async fn list_applies_tag_filter() {
        let store = InMemoryVectorStore::new();
        let tagged = unit("tagged", vec![1.0]).with_tags(["physics".to_string()]);
        store.put(tagged.clone()).await.unwrap();
        store.put(unit("untagged", vec![1.0])).await.unwrap();

        let hits = store
            .list(ListFilter::default().with_tag("physics"), 10, 0)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, tagged.id);
    }

    #[tokio::test]
    async fn search_ranks_own_embedding_first() {
        let store = InMemoryVectorStore::new();
        let target = unit("target", vec![1.0, 0.0, 0.0]);
        store.put(target.clone()).await.unwrap();
        store.put(unit("near", vec![0.9, 0.1, 0.0])).await.unwrap();
        store.put(unit("far", vec![0.0, 0.0, 1.0])).await.unwrap();

        let results = store.similarity_search(&target.embedding, 3).await.unwrap();
        assert_eq!(results[0].0.id, target.id);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        // Descending scores.
        assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[tokio::test]
    async fn search_ties_break_by_created_at() {
        let store = InMemoryVectorStore::new();
        let older = unit("older", vec![1.0, 0.0]);
        let mut newer = unit("newer", vec![1.0, 0.0]);
        newer.created_at = older.created_at + chrono::Duration::seconds(5);
        // Insert newer first to show ordering is not insertion-based.
        store.put(newer.clone()).await.unwrap();
        store.put(older.clone()).await.unwrap();

        let results = store.similarity_search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].0.content, "older");
        assert_eq!(results[1].0.content, "newer");
    }
}
