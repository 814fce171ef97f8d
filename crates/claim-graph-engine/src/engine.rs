//! The engine façade: the single owner of graph and ledger state.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use claim_graph_core::config::EngineConfig;
use claim_graph_core::error::{CoreError, CoreResult};
use claim_graph_core::traits::{EmbeddingProvider, ListFilter, ScoredUnit, VectorStore};
use claim_graph_core::types::{AtomicUnit, IdempotentReply, OperationKind, Relation, UnitId};
use claim_graph_graph::{
    ContradictionDetector, ContradictionFinding, ContradictionReason, LineagePaths, LineageTracer,
    RelationGraph,
};
use claim_graph_storage::{PersistenceLedger, RocksVectorStore};

use crate::error::{EngineError, EngineResult};
use crate::request::{ConnectRequest, IngestRequest};

/// Unit and relation counts for a running engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Units in the durable store.
    pub units: usize,
    /// Relations in the graph (equal to the ledger length).
    pub relations: usize,
    /// Recorded idempotency entries.
    pub idempotency_entries: usize,
}

/// Single-process knowledge-graph engine.
///
/// Owns the vector store, the persistence ledger and the in-memory
/// relation graph. Mutations (`ingest`, `connect`) serialize on one
/// `tokio::sync::Mutex` spanning the idempotency check, the durable
/// writes and the in-memory graph update, so concurrent callers racing
/// on a fresh idempotency key cannot both pass the check. Reads take
/// graph snapshots under a `parking_lot::RwLock` and run concurrently.
///
/// Embedding and storage calls are bounded by the configured timeouts;
/// an elapsed deadline surfaces as [`EngineError::Timeout`].
pub struct KnowledgeGraphEngine {
    config: EngineConfig,
    store: Arc<RocksVectorStore>,
    provider: Arc<dyn EmbeddingProvider>,
    graph: RwLock<RelationGraph>,
    ledger: Mutex<PersistenceLedger>,
    detector: ContradictionDetector,
}

impl std::fmt::Debug for KnowledgeGraphEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeGraphEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl KnowledgeGraphEngine {
    /// Open the engine at `config.data_dir`.
    ///
    /// Startup order: open the store, load the ledger, verify the
    /// idempotency cache against stored state, rebuild the graph from
    /// the relation log. Any inconsistency between ledger and store
    /// fails the open; the in-memory graph is never built from state
    /// the ledger and store disagree on.
    ///
    /// # Errors
    ///
    /// - `CoreError::Config` for invalid configuration
    /// - `CoreError::DimensionMismatch` if the provider's dimension
    ///   differs from the configured one
    /// - `StorageError` / `LedgerError` on unreadable state
    /// - `GraphError::RebuildAborted` if the relation log references
    ///   units absent from the store
    /// - `EngineError::IdempotencyCorrupted` if a cached reply
    ///   references state the store or ledger does not hold
    pub fn open(
        config: EngineConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> EngineResult<Self> {
        config.validate().map_err(EngineError::Core)?;
        if provider.dimension() != config.embedding.dimension {
            return Err(CoreError::DimensionMismatch {
                expected: config.embedding.dimension,
                actual: provider.dimension(),
            }
            .into());
        }

        let store = RocksVectorStore::open(
            &config.data_dir.join("store"),
            config.embedding.dimension,
            config.storage.sync_writes,
        )?;
        let ledger = PersistenceLedger::open(&config.data_dir)?;
        let unit_ids = store.unit_ids()?;

        verify_idempotency_cache(&ledger, &unit_ids)?;

        let graph = RelationGraph::rebuild_from(unit_ids, ledger.relations())?;
        info!(
            data_dir = %config.data_dir.display(),
            units = graph.unit_count(),
            relations = graph.relation_count(),
            model = provider.model_id(),
            "engine opened"
        );

        let detector = ContradictionDetector::new(
            config.contradiction.confidence_margin,
            config.contradiction.semantic_k,
        );
        Ok(Self {
            config,
            store: Arc::new(store),
            provider,
            graph: RwLock::new(graph),
            ledger: Mutex::new(ledger),
            detector,
        })
    }

    /// The configuration this engine was opened with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ingest a new unit: embed, validate, store, record.
    ///
    /// A previously seen idempotency key returns the recorded unit
    /// verbatim; nothing is re-embedded or re-stored and no state
    /// grows. The whole operation holds the mutation lock, so two
    /// concurrent calls on the same fresh key produce exactly one
    /// stored unit.
    pub async fn ingest(&self, request: IngestRequest) -> EngineResult<AtomicUnit> {
        if request.content.trim().is_empty() {
            return Err(CoreError::validation("content", "must not be empty").into());
        }

        let mut ledger = self.ledger.lock().await;
        if let Some(key) = &request.idempotency_key {
            if let Some(reply) = ledger.lookup(OperationKind::Ingest, key) {
                let unit = reply
                    .as_unit()
                    .ok_or_else(|| EngineError::IdempotencyCorrupted { key: key.clone() })?;
                info!(key, unit_id = %unit.id, "ingest replayed from idempotency cache");
                return Ok(unit.clone());
            }
        }

        let embedding = self
            .with_timeout(
                "embed",
                self.config.embedding.timeout_ms,
                self.provider.embed(&request.content),
            )
            .await?;

        let mut unit = AtomicUnit::new(request.content, request.source, embedding)
            .with_tags(request.tags);
        if let Some(confidence) = request.confidence {
            unit = unit.with_confidence(confidence);
        }
        unit.validate(self.config.embedding.dimension)
            .map_err(EngineError::Core)?;

        self.with_timeout(
            "store put",
            self.config.storage.timeout_ms,
            self.store.put(unit.clone()),
        )
        .await?;
        if let Some(key) = &request.idempotency_key {
            if let Err(err) = ledger.record_idempotency(
                OperationKind::Ingest,
                key,
                IdempotentReply::Unit(unit.clone()),
            ) {
                // Undo the put: a failed operation must not leave a
                // durably stored unit behind an unrecorded key.
                if let Err(undo) = self.store.remove_unit(&unit) {
                    warn!(
                        unit_id = %unit.id,
                        %undo,
                        "stored unit could not be removed after idempotency record failure"
                    );
                }
                return Err(err.into());
            }
        }
        self.graph.write().register_unit(unit.id);

        info!(unit_id = %unit.id, confidence = unit.confidence, "ingested unit");
        Ok(unit)
    }

    /// Connect two existing units with a typed, justified relation.
    ///
    /// Endpoint existence is checked against the store before anything
    /// is written. Follows the same idempotency discipline as
    /// [`ingest`](Self::ingest).
    pub async fn connect(&self, request: ConnectRequest) -> EngineResult<Relation> {
        let mut ledger = self.ledger.lock().await;
        if let Some(key) = &request.idempotency_key {
            if let Some(reply) = ledger.lookup(OperationKind::Connect, key) {
                let relation = reply
                    .as_relation()
                    .ok_or_else(|| EngineError::IdempotencyCorrupted { key: key.clone() })?;
                info!(key, relation_id = %relation.id, "connect replayed from idempotency cache");
                return Ok(relation.clone());
            }
        }

        for id in [request.source_id, request.target_id] {
            let found = self
                .with_timeout(
                    "endpoint lookup",
                    self.config.storage.timeout_ms,
                    self.store.get(id),
                )
                .await?;
            if found.is_none() {
                return Err(CoreError::UnknownUnit { id }.into());
            }
        }

        let relation = Relation::new(
            request.source_id,
            request.target_id,
            request.relation_type,
            request.reasoning,
        );
        relation.validate().map_err(EngineError::Core)?;

        ledger.append_relation(relation.clone())?;
        if let Some(key) = &request.idempotency_key {
            if let Err(err) = ledger.record_idempotency(
                OperationKind::Connect,
                key,
                IdempotentReply::Relation(relation.clone()),
            ) {
                // Undo the append so a retry of the failed operation
                // does not duplicate the relation.
                if let Err(undo) = ledger.retract_relation(relation.id) {
                    warn!(
                        relation_id = %relation.id,
                        %undo,
                        "ledgered relation could not be retracted after idempotency record failure"
                    );
                }
                return Err(err.into());
            }
        }
        if let Err(err) = self.graph.write().add_edge(relation.clone()) {
            // The ledger already holds the relation; startup replay
            // repairs the graph. Do not trust in-memory state here.
            warn!(relation_id = %relation.id, %err, "graph update failed after ledger append");
            return Err(err.into());
        }

        info!(
            relation_id = %relation.id,
            relation_type = relation.relation_type.as_str(),
            "connected units"
        );
        Ok(relation)
    }

    /// Semantic retrieval: embed the query text and rank stored units
    /// by cosine similarity, descending.
    pub async fn search(&self, query: &str, k: usize) -> EngineResult<Vec<ScoredUnit>> {
        if k == 0 {
            return Err(CoreError::validation("k", "must be at least 1").into());
        }
        let query_embedding = self
            .with_timeout(
                "embed",
                self.config.embedding.timeout_ms,
                self.provider.embed(query),
            )
            .await?;
        self.with_timeout(
            "similarity search",
            self.config.storage.timeout_ms,
            self.store.similarity_search(&query_embedding, k),
        )
        .await
    }

    /// Fetch a single unit by id.
    pub async fn get_unit(&self, id: UnitId) -> EngineResult<Option<AtomicUnit>> {
        self.with_timeout(
            "unit lookup",
            self.config.storage.timeout_ms,
            self.store.get(id),
        )
        .await
    }

    /// List units in creation order.
    pub async fn list_units(
        &self,
        filter: ListFilter,
        limit: usize,
        offset: usize,
    ) -> EngineResult<Vec<AtomicUnit>> {
        self.with_timeout(
            "unit listing",
            self.config.storage.timeout_ms,
            self.store.list(filter, limit, offset),
        )
        .await
    }

    /// Enumerate minimal-hop lineage paths from `from` to `to`.
    ///
    /// `max_depth` overrides the configured bound for this call. The
    /// returned iterator is computed against a consistent snapshot of
    /// the graph and stays valid after later mutations.
    pub fn trace_lineage(
        &self,
        from: UnitId,
        to: UnitId,
        max_depth: Option<usize>,
    ) -> EngineResult<LineagePaths> {
        let tracer = LineageTracer::new()
            .with_max_depth(max_depth.unwrap_or(self.config.lineage.max_depth));
        let graph = self.graph.read();
        Ok(tracer.trace(&graph, from, to)?)
    }

    /// Candidate contradictions of `unit_id`.
    ///
    /// Explicitly linked conflicts come first and are always included;
    /// semantic candidates above `threshold` follow, similarity
    /// descending. A heuristic candidate list, not a proof.
    pub async fn find_contradictions(
        &self,
        unit_id: UnitId,
        threshold: f32,
    ) -> EngineResult<Vec<ContradictionFinding>> {
        let subject = self
            .get_unit(unit_id)
            .await?
            .ok_or(CoreError::UnknownUnit { id: unit_id })?;

        let explicit_edges = {
            let graph = self.graph.read();
            self.detector.explicit_conflicts(&graph, unit_id)
        };

        let mut findings = Vec::with_capacity(explicit_edges.len());
        let mut exclude = vec![unit_id];
        for (other_id, relation) in explicit_edges {
            let unit = self
                .get_unit(other_id)
                .await?
                .ok_or(CoreError::UnknownUnit { id: other_id })?;
            exclude.push(other_id);
            findings.push(ContradictionFinding {
                unit,
                reason: ContradictionReason::ExplicitEdge,
                score: 1.0,
                relation: Some(relation),
            });
        }

        let semantic = self
            .detector
            .semantic_conflicts(self.store.as_ref(), &subject, threshold, &exclude)
            .await
            .map_err(EngineError::Core)?;
        findings.extend(semantic);
        Ok(findings)
    }

    /// Current unit, relation and idempotency-entry counts.
    pub async fn stats(&self) -> EngineResult<EngineStats> {
        let units = self
            .with_timeout("unit count", self.config.storage.timeout_ms, self.store.count())
            .await?;
        let relations = self.graph.read().relation_count();
        let idempotency_entries = self.ledger.lock().await.idempotency_entries().len();
        Ok(EngineStats {
            units,
            relations,
            idempotency_entries,
        })
    }

    /// Flush buffered store writes.
    pub async fn flush(&self) -> EngineResult<()> {
        self.with_timeout("flush", self.config.storage.timeout_ms, self.store.flush())
            .await
    }

    async fn with_timeout<T>(
        &self,
        operation: &'static str,
        timeout_ms: u64,
        fut: impl Future<Output = CoreResult<T>>,
    ) -> EngineResult<T> {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
            Ok(result) => result.map_err(EngineError::Core),
            Err(_) => Err(EngineError::Timeout {
                operation,
                timeout_ms,
            }),
        }
    }
}

/// Check every cached reply against the state it claims was written.
///
/// A `Unit` reply must name a stored unit; a `Relation` reply must name
/// a ledgered relation. A reply filed under the wrong operation kind is
/// also corruption.
fn verify_idempotency_cache(
    ledger: &PersistenceLedger,
    unit_ids: &[UnitId],
) -> EngineResult<()> {
    let stored_units: HashSet<UnitId> = unit_ids.iter().copied().collect();
    let ledgered_relations: HashSet<uuid::Uuid> =
        ledger.relations().iter().map(|r| r.id).collect();

    for (key, reply) in ledger.idempotency_entries() {
        let consistent = match reply {
            IdempotentReply::Unit(unit) => {
                key.starts_with("ingest/") && stored_units.contains(&unit.id)
            }
            IdempotentReply::Relation(relation) => {
                key.starts_with("connect/") && ledgered_relations.contains(&relation.id)
            }
        };
        if !consistent {
            return Err(EngineError::IdempotencyCorrupted { key: key.clone() });
        }
    }
    Ok(())
}
