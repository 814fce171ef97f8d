//! End-to-end engine behavior over real storage in a temp directory.

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use claim_graph_core::config::EngineConfig;
use claim_graph_core::error::{CoreError, CoreResult};
use claim_graph_core::stubs::StubEmbeddingProvider;
use claim_graph_core::traits::{EmbeddingProvider, ListFilter};
use claim_graph_core::types::{IdempotentReply, RelationType};
use claim_graph_engine::{ConnectRequest, EngineError, IngestRequest, KnowledgeGraphEngine};
use claim_graph_graph::ContradictionReason;

const DIM: usize = 32;

fn test_config(dir: &TempDir) -> EngineConfig {
    let mut config = EngineConfig::at_data_dir(dir.path());
    config.embedding.dimension = DIM;
    config.storage.sync_writes = false;
    config
}

fn open_engine(dir: &TempDir) -> KnowledgeGraphEngine {
    KnowledgeGraphEngine::open(
        test_config(dir),
        Arc::new(StubEmbeddingProvider::with_dimension(DIM)),
    )
    .unwrap()
}

#[tokio::test]
async fn ingest_then_get_returns_the_same_unit() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let unit = engine
        .ingest(
            IngestRequest::new("Water expands when it freezes", "physics text")
                .with_confidence(0.9)
                .with_tags(vec!["physics".to_string()]),
        )
        .await
        .unwrap();

    let fetched = engine.get_unit(unit.id).await.unwrap();
    assert_eq!(fetched, Some(unit));
}

#[tokio::test]
async fn empty_content_is_rejected_before_any_write() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let err = engine
        .ingest(IngestRequest::new("   ", "nowhere"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(engine.stats().await.unwrap().units, 0);
}

#[tokio::test]
async fn idempotent_replay_returns_first_result_without_growth() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let first = engine
        .ingest(IngestRequest::new("Sound needs a medium", "acoustics").with_idempotency_key("k1"))
        .await
        .unwrap();
    let stats_after_first = engine.stats().await.unwrap();

    // Different arguments, same key: the recorded payload wins.
    let replayed = engine
        .ingest(
            IngestRequest::new("completely different text", "other")
                .with_confidence(0.1)
                .with_idempotency_key("k1"),
        )
        .await
        .unwrap();

    assert_eq!(replayed, first);
    assert_eq!(engine.stats().await.unwrap(), stats_after_first);
}

#[tokio::test]
async fn idempotency_keys_are_scoped_per_operation() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let a = engine
        .ingest(IngestRequest::new("claim a", "src").with_idempotency_key("shared"))
        .await
        .unwrap();
    let b = engine
        .ingest(IngestRequest::new("claim b", "src"))
        .await
        .unwrap();

    // The same caller key on connect does not collide with the ingest key.
    let relation = engine
        .connect(
            ConnectRequest::new(a.id, b.id, RelationType::Supports, "same key, new scope")
                .with_idempotency_key("shared"),
        )
        .await
        .unwrap();
    assert_eq!(relation.source_id, a.id);
}

#[tokio::test]
async fn connect_rejects_unknown_endpoints() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let known = engine
        .ingest(IngestRequest::new("known claim", "src"))
        .await
        .unwrap();
    let unknown = uuid::Uuid::new_v4();

    let err = engine
        .connect(ConnectRequest::new(
            known.id,
            unknown,
            RelationType::Supports,
            "dangling",
        ))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        EngineError::Core(CoreError::UnknownUnit { id }) if id == unknown
    ));
    assert_eq!(engine.stats().await.unwrap().relations, 0);
}

#[tokio::test]
async fn search_ranks_a_unit_first_against_its_own_text() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let target = engine
        .ingest(IngestRequest::new("Entropy never decreases", "thermo"))
        .await
        .unwrap();
    engine
        .ingest(IngestRequest::new("Cells divide by mitosis", "bio"))
        .await
        .unwrap();

    let results = engine.search("Entropy never decreases", 5).await.unwrap();
    assert_eq!(results[0].0.id, target.id);
    assert!((results[0].1 - 1.0).abs() < 1e-5);
    assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));

    let err = engine.search("anything", 0).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn explicit_contradicts_edge_is_always_reported() {
    // Ingest A ("Mass bends spacetime") and B ("Spacetime is flat"),
    // connect B -contradicts-> A, then ask for contradictions of A.
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let a = engine
        .ingest(
            IngestRequest::new("Mass bends spacetime", "Einstein 1915").with_confidence(0.95),
        )
        .await
        .unwrap();
    let b = engine
        .ingest(IngestRequest::new("Spacetime is flat", "Newtonian view").with_confidence(0.6))
        .await
        .unwrap();
    engine
        .connect(ConnectRequest::new(
            b.id,
            a.id,
            RelationType::Contradicts,
            "competing models",
        ))
        .await
        .unwrap();

    let findings = engine.find_contradictions(a.id, 0.0).await.unwrap();
    let explicit: Vec<_> = findings
        .iter()
        .filter(|f| f.reason == ContradictionReason::ExplicitEdge)
        .collect();
    assert_eq!(explicit.len(), 1);
    assert_eq!(explicit[0].unit.id, b.id);
    assert_eq!(explicit[0].reason.as_str(), "explicit contradiction edge");
    assert!(explicit[0].relation.is_some());
}

#[tokio::test]
async fn lineage_trace_terminates_on_cycles() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let mut ids = Vec::new();
    for content in ["first claim", "second claim", "third claim"] {
        ids.push(engine.ingest(IngestRequest::new(content, "src")).await.unwrap().id);
    }
    for (s, t) in [(0, 1), (1, 0), (1, 2)] {
        engine
            .connect(ConnectRequest::new(
                ids[s],
                ids[t],
                RelationType::Extends,
                "chain",
            ))
            .await
            .unwrap();
    }

    let paths: Vec<_> = engine.trace_lineage(ids[0], ids[2], None).unwrap().collect();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].hops(), 2);
    let nodes = paths[0].node_ids();
    let mut deduped = nodes.clone();
    deduped.dedup();
    assert_eq!(nodes, deduped);
}

#[tokio::test]
async fn fresh_data_dir_starts_empty_without_error() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);

    let listed = engine.list_units(ListFilter::default(), 10, 0).await.unwrap();
    assert!(listed.is_empty());
    assert_eq!(
        engine.stats().await.unwrap(),
        claim_graph_engine::EngineStats {
            units: 0,
            relations: 0,
            idempotency_entries: 0
        }
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_ingest_on_one_fresh_key_stores_one_unit() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(open_engine(&dir));

    let e1 = Arc::clone(&engine);
    let e2 = Arc::clone(&engine);
    let t1 = tokio::spawn(async move {
        e1.ingest(IngestRequest::new("variant one", "src").with_idempotency_key("race"))
            .await
    });
    let t2 = tokio::spawn(async move {
        e2.ingest(IngestRequest::new("variant two", "src").with_idempotency_key("race"))
            .await
    });

    let u1 = t1.await.unwrap().unwrap();
    let u2 = t2.await.unwrap().unwrap();
    assert_eq!(u1, u2);
    assert_eq!(engine.stats().await.unwrap().units, 1);
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = TempDir::new().unwrap();

    let (a_id, b_id) = {
        let engine = open_engine(&dir);
        let a = engine
            .ingest(IngestRequest::new("parent claim", "src"))
            .await
            .unwrap();
        let b = engine
            .ingest(IngestRequest::new("derived claim", "src"))
            .await
            .unwrap();
        engine
            .connect(ConnectRequest::new(
                b.id,
                a.id,
                RelationType::DerivesFrom,
                "derivation",
            ))
            .await
            .unwrap();
        engine.flush().await.unwrap();
        (a.id, b.id)
    };

    let engine = open_engine(&dir);
    let stats = engine.stats().await.unwrap();
    assert_eq!(stats.units, 2);
    assert_eq!(stats.relations, 1);

    let paths: Vec<_> = engine.trace_lineage(b_id, a_id, None).unwrap().collect();
    assert_eq!(paths.len(), 1);
}

#[tokio::test]
async fn failed_idempotency_record_leaves_no_stored_unit() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);
    // The cache file cannot be renamed over a directory, so recording
    // the idempotency entry fails while the unit store stays healthy.
    let cache_path = dir.path().join("idempotency.json");
    std::fs::create_dir(&cache_path).unwrap();

    let err = engine
        .ingest(IngestRequest::new("orphan candidate", "src").with_idempotency_key("k1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Ledger(_)));
    assert_eq!(engine.stats().await.unwrap().units, 0);

    // Once the ledger is writable again the same key succeeds cleanly.
    std::fs::remove_dir(&cache_path).unwrap();
    engine
        .ingest(IngestRequest::new("orphan candidate", "src").with_idempotency_key("k1"))
        .await
        .unwrap();
    assert_eq!(engine.stats().await.unwrap().units, 1);
}

#[tokio::test]
async fn failed_idempotency_record_retracts_the_relation() {
    let dir = TempDir::new().unwrap();
    let engine = open_engine(&dir);
    let a = engine
        .ingest(IngestRequest::new("claim a", "src"))
        .await
        .unwrap();
    let b = engine
        .ingest(IngestRequest::new("claim b", "src"))
        .await
        .unwrap();

    let cache_path = dir.path().join("idempotency.json");
    std::fs::create_dir(&cache_path).unwrap();

    let err = engine
        .connect(
            ConnectRequest::new(a.id, b.id, RelationType::Supports, "will not commit")
                .with_idempotency_key("k1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Ledger(_)));
    assert_eq!(engine.stats().await.unwrap().relations, 0);

    std::fs::remove_dir(&cache_path).unwrap();
    engine
        .connect(
            ConnectRequest::new(a.id, b.id, RelationType::Supports, "commits this time")
                .with_idempotency_key("k1"),
        )
        .await
        .unwrap();
    assert_eq!(engine.stats().await.unwrap().relations, 1);
}

#[tokio::test]
async fn corrupt_idempotency_cache_fails_open() {
    let dir = TempDir::new().unwrap();
    {
        let _engine = open_engine(&dir);
    }

    // A cached ingest reply naming a unit the store does not hold.
    let phantom = claim_graph_core::types::AtomicUnit::new("phantom", "nowhere", vec![0.0; DIM]);
    let cache = std::collections::BTreeMap::from([(
        "ingest/ghost".to_string(),
        IdempotentReply::Unit(phantom),
    )]);
    std::fs::write(
        dir.path().join("idempotency.json"),
        serde_json::to_vec_pretty(&cache).unwrap(),
    )
    .unwrap();

    let err = KnowledgeGraphEngine::open(
        test_config(&dir),
        Arc::new(StubEmbeddingProvider::with_dimension(DIM)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        EngineError::IdempotencyCorrupted { key } if key == "ingest/ghost"
    ));
}

#[tokio::test]
async fn provider_dimension_mismatch_fails_open() {
    let dir = TempDir::new().unwrap();
    let err = KnowledgeGraphEngine::open(
        test_config(&dir),
        Arc::new(StubEmbeddingProvider::with_dimension(DIM + 1)),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::DimensionMismatch { .. })
    ));
}

struct StalledProvider;

#[async_trait]
impl EmbeddingProvider for StalledProvider {
    fn dimension(&self) -> usize {
        DIM
    }

    fn model_id(&self) -> &str {
        "stalled"
    }

    async fn embed(&self, _text: &str) -> CoreResult<Vec<f32>> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Ok(vec![0.0; DIM])
    }
}

#[tokio::test]
async fn slow_embedding_surfaces_as_timeout() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.embedding.timeout_ms = 20;

    let engine = KnowledgeGraphEngine::open(config, Arc::new(StalledProvider)).unwrap();
    let err = engine
        .ingest(IngestRequest::new("will never embed", "src"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Timeout { operation: "embed", .. }));
    assert_eq!(engine.stats().await.unwrap().units, 0);
}
