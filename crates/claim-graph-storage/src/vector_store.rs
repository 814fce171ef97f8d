//! RocksDB-backed implementation of the core `VectorStore` trait.

use std::path::Path;

use async_trait::async_trait;
use rocksdb::{ColumnFamily, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use tracing::{debug, info};

use claim_graph_core::error::CoreResult;
use claim_graph_core::traits::{cosine_similarity, ListFilter, ScoredUnit, VectorStore};
use claim_graph_core::types::{AtomicUnit, UnitId};

use crate::column_families::{cf_names, column_family_descriptors};
use crate::error::{StorageError, StorageResult};
use crate::serialization::{deserialize_unit, serialize_unit, temporal_key, unit_id_from_bytes};

/// Durable unit store on RocksDB.
///
/// Column families: `units` holds the full JSON record (embedding
/// included), `temporal` is a created_at-ordered index serving stable
/// listing. Similarity queries are a brute-force cosine scan over the
/// `units` family; the trait contract allows swapping in an approximate
/// index later.
pub struct RocksVectorStore {
    db: DB,
    dimension: usize,
    sync_writes: bool,
}

impl RocksVectorStore {
    /// Open (or create) a store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::OpenFailed` if the database cannot be
    /// opened or created.
    pub fn open(path: &Path, dimension: usize, sync_writes: bool) -> StorageResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&opts, path, column_family_descriptors()).map_err(
            |e| StorageError::OpenFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            },
        )?;

        info!(path = %path.display(), dimension, "opened unit store");
        Ok(Self {
            db,
            dimension,
            sync_writes,
        })
    }

    /// Embedding dimension this store was opened with.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn cf(&self, name: &str) -> StorageResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound {
                name: name.to_string(),
            })
    }

    fn get_unit(&self, id: UnitId) -> StorageResult<Option<AtomicUnit>> {
        let units = self.cf(cf_names::UNITS)?;
        let bytes = self
            .db
            .get_cf(units, id.as_bytes())
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        bytes
            .map(|b| deserialize_unit(id.as_bytes(), &b))
            .transpose()
    }

    fn put_unit(&self, unit: &AtomicUnit) -> StorageResult<()> {
        let units = self.cf(cf_names::UNITS)?;
        if self
            .db
            .get_cf(units, unit.id.as_bytes())
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?
            .is_some()
        {
            return Err(StorageError::DuplicateId { id: unit.id });
        }

        let temporal = self.cf(cf_names::TEMPORAL)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(units, unit.id.as_bytes(), serialize_unit(unit)?);
        batch.put_cf(
            temporal,
            temporal_key(unit.created_at, unit.id),
            unit.id.as_bytes(),
        );

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        debug!(unit_id = %unit.id, "stored unit");
        Ok(())
    }

    /// Delete a unit and its temporal index entry.
    ///
    /// Undo path for a put whose enclosing operation failed to commit.
    /// Not part of the `VectorStore` trait; units are create-only at
    /// the API surface.
    pub fn remove_unit(&self, unit: &AtomicUnit) -> StorageResult<()> {
        let units = self.cf(cf_names::UNITS)?;
        let temporal = self.cf(cf_names::TEMPORAL)?;
        let mut batch = WriteBatch::default();
        batch.delete_cf(units, unit.id.as_bytes());
        batch.delete_cf(temporal, temporal_key(unit.created_at, unit.id));

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        debug!(unit_id = %unit.id, "removed unit");
        Ok(())
    }

    /// All stored unit ids, in key order. Used to seed the in-memory
    /// graph at startup without deserializing full records.
    pub fn unit_ids(&self) -> StorageResult<Vec<UnitId>> {
        let units = self.cf(cf_names::UNITS)?;
        let mut out = Vec::new();
        for entry in self.db.iterator_cf(units, IteratorMode::Start) {
            let (key, _) = entry.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            out.push(unit_id_from_bytes(&key)?);
        }
        Ok(out)
    }

    fn scan_units(&self) -> StorageResult<Vec<AtomicUnit>> {
        let units = self.cf(cf_names::UNITS)?;
        let mut out = Vec::new();
        for entry in self.db.iterator_cf(units, IteratorMode::Start) {
            let (key, value) = entry.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            out.push(deserialize_unit(&key, &value)?);
        }
        Ok(out)
    }

    fn list_units(
        &self,
        filter: &ListFilter,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<AtomicUnit>> {
        let temporal = self.cf(cf_names::TEMPORAL)?;
        let mut out = Vec::new();
        let mut skipped = 0usize;

        for entry in self.db.iterator_cf(temporal, IteratorMode::Start) {
            if out.len() >= limit {
                break;
            }
            let (_, value) = entry.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            let id = unit_id_from_bytes(&value)?;
            let unit = self
                .get_unit(id)?
                .ok_or_else(|| StorageError::Corrupt {
                    key: id.to_string(),
                    message: "temporal index references missing unit".to_string(),
                })?;

            if !filter.accepts(&unit) {
                continue;
            }
            if skipped < offset {
                skipped += 1;
                continue;
            }
            out.push(unit);
        }
        Ok(out)
    }
}

#[async_trait]
impl VectorStore for RocksVectorStore {
    async fn put(&self, unit: AtomicUnit) -> CoreResult<()> {
        self.put_unit(&unit).map_err(Into::into)
    }

    async fn get(&self, id: UnitId) -> CoreResult<Option<AtomicUnit>> {
        self.get_unit(id).map_err(Into::into)
    }

    async fn list(
        &self,
        filter: ListFilter,
        limit: usize,
        offset: usize,
    ) -> CoreResult<Vec<AtomicUnit>> {
        self.list_units(&filter, limit, offset).map_err(Into::into)
    }

    async fn similarity_search(&self, query: &[f32], k: usize) -> CoreResult<Vec<ScoredUnit>> {
        let mut results: Vec<ScoredUnit> = self
            .scan_units()?
            .into_iter()
            .map(|unit| {
                let score = cosine_similarity(query, &unit.embedding);
                (unit, score)
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
        let units = self.cf(cf_names::UNITS)?;
        let mut count = 0usize;
        for entry in self.db.iterator_cf(units, IteratorMode::Start) {
            entry.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    async fn flush(&self) -> CoreResult<()> {
        self.db
            .flush()
            .map_err(|e| StorageError::FlushFailed(e.to_string()))?;
        Ok(())
    }
}
