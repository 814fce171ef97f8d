//! Persistence ledger: the durable source of truth for relations and the
//! idempotency cache.
//!
//! Both files are rewritten through a temp-file, flush, fsync, atomic
//! rename sequence on every append. A crash mid-write leaves the previous
//! file intact; the backing store is never in a partially-written state.
//! This is the most failure-sensitive path in the system.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use claim_graph_core::types::{cache_key, IdempotentReply, OperationKind, Relation, RelationId};

use crate::error::{LedgerError, LedgerResult};

const RELATIONS_FILE: &str = "relations.json";
const IDEMPOTENCY_FILE: &str = "idempotency.json";

/// Append-durable log of relations plus the idempotency-key cache.
///
/// Loaded once at startup; the in-memory mirrors are authoritative for
/// reads between appends. Absent files mean an empty store (first run);
/// malformed files are an error, never skipped.
pub struct PersistenceLedger {
    relations_path: PathBuf,
    idempotency_path: PathBuf,
    relations: Vec<Relation>,
    idempotency: BTreeMap<String, IdempotentReply>,
}

impl PersistenceLedger {
    /// Open the ledger in `dir`, creating the directory if needed and
    /// loading any existing state.
    pub fn open(dir: &Path) -> LedgerResult<Self> {
        std::fs::create_dir_all(dir).map_err(|source| LedgerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let relations_path = dir.join(RELATIONS_FILE);
        let idempotency_path = dir.join(IDEMPOTENCY_FILE);

        let relations: Vec<Relation> = load_or_default(&relations_path)?;
        let idempotency: BTreeMap<String, IdempotentReply> = load_or_default(&idempotency_path)?;

        info!(
            relations = relations.len(),
            idempotency_entries = idempotency.len(),
            dir = %dir.display(),
            "ledger loaded"
        );

        Ok(Self {
            relations_path,
            idempotency_path,
            relations,
            idempotency,
        })
    }

    /// All relations, in append order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Number of recorded relations.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// All idempotency entries, keyed by operation-scoped cache key.
    pub fn idempotency_entries(&self) -> &BTreeMap<String, IdempotentReply> {
        &self.idempotency
    }

    /// Look up a previously recorded result for this operation and key.
    pub fn lookup(&self, kind: OperationKind, key: &str) -> Option<&IdempotentReply> {
        self.idempotency.get(&cache_key(kind, key))
    }

    /// Durably append a relation.
    ///
    /// The relation is committed only once the atomic replace succeeds;
    /// on failure the in-memory mirror is rolled back and the previous
    /// file content is untouched.
    pub fn append_relation(&mut self, relation: Relation) -> LedgerResult<()> {
        self.relations.push(relation);
        if let Err(err) = write_atomic(&self.relations_path, &self.relations) {
            self.relations.pop();
            return Err(err);
        }
        debug!(count = self.relations.len(), "appended relation to ledger");
        Ok(())
    }

    /// Durably remove the most recent relation, if it is `id`.
    ///
    /// Undo path for an append whose enclosing operation failed to
    /// commit. A no-op when `id` is not the newest entry, so a stale
    /// undo can never drop another caller's relation.
    pub fn retract_relation(&mut self, id: RelationId) -> LedgerResult<()> {
        if self.relations.last().map(|r| r.id) != Some(id) {
            return Ok(());
        }
        let removed = self.relations.pop();
        if let Err(err) = write_atomic(&self.relations_path, &self.relations) {
            if let Some(relation) = removed {
                self.relations.push(relation);
            }
            return Err(err);
        }
        debug!(%id, "retracted relation from ledger");
        Ok(())
    }

    /// Durably record the first-seen result for an idempotency key.
    pub fn record_idempotency(
        &mut self,
        kind: OperationKind,
        key: &str,
        reply: IdempotentReply,
    ) -> LedgerResult<()> {
        let cache_key = cache_key(kind, key);
        let previous = self.idempotency.insert(cache_key.clone(), reply);
        if let Err(err) = write_atomic(&self.idempotency_path, &self.idempotency) {
            match previous {
                Some(prev) => {
                    self.idempotency.insert(cache_key, prev);
                }
                None => {
                    self.idempotency.remove(&cache_key);
                }
            }
            return Err(err);
        }
        Ok(())
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> LedgerResult<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| LedgerError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write `value` to `path` atomically: serialize into a temporary file in
/// the same directory, flush and fsync it, then rename over the target.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> LedgerResult<()> {
    let dir = path.parent().ok_or_else(|| LedgerError::Replace {
        path: path.to_path_buf(),
        message: "path has no parent directory".to_string(),
    })?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let bytes = serde_json::to_vec_pretty(value).map_err(|e| LedgerError::Replace {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    temp.write_all(&bytes).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    temp.flush().map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    temp.as_file().sync_all().map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    temp.persist(path).map_err(|e| LedgerError::Replace {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(())
}
