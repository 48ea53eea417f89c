//! Durable backend contract and an in-memory implementation
//!
//! Rows are identified by `(id, namespace)`. Within a namespace, bulk reads
//! return rows in ascending id order so that a bounded warm is repeatable.

use crate::error::MetaStoreResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One persisted metadata row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaRow {
    pub id: String,
    pub namespace: String,
    /// Encoded `timestampMeta` data string
    pub data: String,
}

impl MetaRow {
    pub fn new(
        id: impl Into<String>,
        namespace: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
            data: data.into(),
        }
    }
}

/// Key-value contract the metadata store needs from durable storage
///
/// Implementations must be internally synchronized. Errors propagate to the
/// caller unchanged.
pub trait MetaBackend: Send + Sync {
    /// Insert the row, or overwrite the data of an existing `(id, namespace)`
    fn upsert(&self, id: &str, namespace: &str, data: &str) -> MetaStoreResult<()>;

    /// Data string stored for `(id, namespace)`
    fn get_by_id(&self, id: &str, namespace: &str) -> MetaStoreResult<Option<String>>;

    /// Up to `limit` rows of `namespace`, in ascending id order
    fn all_for_namespace(&self, namespace: &str, limit: usize) -> MetaStoreResult<Vec<MetaRow>>;

    /// Remove a row, returning whether it existed
    fn delete(&self, id: &str, namespace: &str) -> MetaStoreResult<bool>;

    /// Number of rows stored for `namespace`
    fn count_for_namespace(&self, namespace: &str) -> MetaStoreResult<usize>;
}

impl<B: MetaBackend + ?Sized> MetaBackend for Arc<B> {
    fn upsert(&self, id: &str, namespace: &str, data: &str) -> MetaStoreResult<()> {
        (**self).upsert(id, namespace, data)
    }

    fn get_by_id(&self, id: &str, namespace: &str) -> MetaStoreResult<Option<String>> {
        (**self).get_by_id(id, namespace)
    }

    fn all_for_namespace(&self, namespace: &str, limit: usize) -> MetaStoreResult<Vec<MetaRow>> {
        (**self).all_for_namespace(namespace, limit)
    }

    fn delete(&self, id: &str, namespace: &str) -> MetaStoreResult<bool> {
        (**self).delete(id, namespace)
    }

    fn count_for_namespace(&self, namespace: &str) -> MetaStoreResult<usize> {
        (**self).count_for_namespace(namespace)
    }
}

/// Volatile backend, for tests and embedders without persistence
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: RwLock<BTreeMap<(String, String), String>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows across all namespaces
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl MetaBackend for MemoryBackend {
    fn upsert(&self, id: &str, namespace: &str, data: &str) -> MetaStoreResult<()> {
        self.rows
            .write()
            .insert((namespace.to_string(), id.to_string()), data.to_string());
        Ok(())
    }

    fn get_by_id(&self, id: &str, namespace: &str) -> MetaStoreResult<Option<String>> {
        Ok(self
            .rows
            .read()
            .get(&(namespace.to_string(), id.to_string()))
            .cloned())
    }

    fn all_for_namespace(&self, namespace: &str, limit: usize) -> MetaStoreResult<Vec<MetaRow>> {
        let rows = self.rows.read();
        Ok(rows
            .range((namespace.to_string(), String::new())..)
            .take_while(|((ns, _), _)| ns == namespace)
            .take(limit)
            .map(|((ns, id), data)| MetaRow::new(id.clone(), ns.clone(), data.clone()))
            .collect())
    }

    fn delete(&self, id: &str, namespace: &str) -> MetaStoreResult<bool> {
        Ok(self
            .rows
            .write()
            .remove(&(namespace.to_string(), id.to_string()))
            .is_some())
    }

    fn count_for_namespace(&self, namespace: &str) -> MetaStoreResult<usize> {
        let rows = self.rows.read();
        Ok(rows
            .range((namespace.to_string(), String::new())..)
            .take_while(|((ns, _), _)| ns == namespace)
            .count())
    }
}
