//! Persistent metadata backend backed by redb.
//!
//! Every write is its own write txn + commit, so an `upsert` that returned
//! `Ok` is durable before the store touches the cache.

use crate::backend::{MetaBackend, MetaRow};
use crate::error::MetaStoreResult;
use crate::tables;
use redb::{Database, ReadableTable, ReadableTableMetadata};
use std::path::Path;
use tracing::debug;

/// Durable backend storing rows in a single redb table
pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open (or create) the redb database at the given path.
    pub fn open(path: impl AsRef<Path>) -> MetaStoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Create the table eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        {
            let _t = write_txn.open_table(tables::META_ROWS)?;
        }
        write_txn.commit()?;

        debug!(path = %path.display(), "Opened metadata database");
        Ok(Self { db })
    }

    /// Total number of rows across all namespaces
    pub fn len(&self) -> MetaStoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(tables::META_ROWS)?;
        Ok(table.len()?)
    }
}

impl MetaBackend for RedbBackend {
    fn upsert(&self, id: &str, namespace: &str, data: &str) -> MetaStoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(tables::META_ROWS)?;
            table.insert((namespace, id), data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_by_id(&self, id: &str, namespace: &str) -> MetaStoreResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(tables::META_ROWS)?;
        Ok(table.get((namespace, id))?.map(|v| v.value().to_string()))
    }

    fn all_for_namespace(&self, namespace: &str, limit: usize) -> MetaStoreResult<Vec<MetaRow>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(tables::META_ROWS)?;
        let mut result = Vec::new();
        if limit == 0 {
            return Ok(result);
        }
        for entry in table.range((namespace, "")..)? {
            let (key, value) = entry?;
            let (ns, id) = key.value();
            if ns != namespace {
                break;
            }
            result.push(MetaRow::new(id, ns, value.value()));
            if result.len() >= limit {
                break;
            }
        }
        Ok(result)
    }

    fn delete(&self, id: &str, namespace: &str) -> MetaStoreResult<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(tables::META_ROWS)?;
            table.remove((namespace, id))?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }

    fn count_for_namespace(&self, namespace: &str) -> MetaStoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(tables::META_ROWS)?;
        let mut count = 0;
        for entry in table.range((namespace, "")..)? {
            let (key, _) = entry?;
            if key.value().0 != namespace {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("meta.redb")).unwrap();
        (dir, backend)
    }

    #[test]
    fn test_upsert_and_get() {
        let (_dir, backend) = open_temp();
        assert_eq!(backend.get_by_id("a", "ns").unwrap(), None);

        backend.upsert("a", "ns", "v1").unwrap();
        backend.upsert("a", "ns", "v2").unwrap();
        backend.upsert("a", "other", "v3").unwrap();

        assert_eq!(backend.get_by_id("a", "ns").unwrap().as_deref(), Some("v2"));
        assert_eq!(backend.get_by_id("a", "other").unwrap().as_deref(), Some("v3"));
        assert_eq!(backend.len().unwrap(), 2);
    }

    #[test]
    fn test_namespace_range_scan() {
        let (_dir, backend) = open_temp();
        for i in 0..20 {
            backend.upsert(&format!("id-{i:02}"), "ns", "d").unwrap();
        }
        backend.upsert("id-00", "n", "d").unwrap();
        backend.upsert("id-00", "ns\u{0}", "d").unwrap();
        backend.upsert("id-00", "nt", "d").unwrap();

        let rows = backend.all_for_namespace("ns", 5).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["id-00", "id-01", "id-02", "id-03", "id-04"]);
        assert!(rows.iter().all(|r| r.namespace == "ns"));

        assert_eq!(backend.all_for_namespace("ns", 1000).unwrap().len(), 20);
        assert_eq!(backend.count_for_namespace("ns").unwrap(), 20);
        assert_eq!(backend.count_for_namespace("nt").unwrap(), 1);
        assert!(backend.all_for_namespace("ns", 0).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (_dir, backend) = open_temp();
        backend.upsert("a", "ns", "v").unwrap();
        assert!(backend.delete("a", "ns").unwrap());
        assert!(!backend.delete("a", "ns").unwrap());
        assert_eq!(backend.get_by_id("a", "ns").unwrap(), None);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("meta.redb");
        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.upsert("a", "ns", "kept").unwrap();
        }
        let backend = RedbBackend::open(&path).unwrap();
        assert_eq!(backend.get_by_id("a", "ns").unwrap().as_deref(), Some("kept"));
    }
}
