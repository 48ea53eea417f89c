//! Two-tier metadata store
//!
//! Reads go cache first, then the durable backend. Writes go backend first,
//! then cache: if the process dies between the two, the backend holds the
//! newer value and the cache is at worst missing it. A read that misses the
//! cache does not fill it; only [`Metastore::warm`] and
//! [`Metastore::put_meta`] populate the cache.
//!
//! Operations on the same id are serialized through a striped lock chosen
//! by the record's cache key, so a reader never sees a backend write
//! without its cache write. Different ids proceed in parallel unless they
//! share a stripe.

use crate::backend::MetaBackend;
use crate::cache::{LruCache, MemCache};
use crate::error::MetaStoreResult;
use crate::redb_backend::RedbBackend;
use parking_lot::{Mutex, MutexGuard};
use synk_codec::Meta;
use synk_common::{CacheKey, KeyHasher, MetastoreConfig, Xxh3Hasher};
use tracing::{debug, info};

/// Default number of lock stripes
pub const DEFAULT_LOCK_STRIPES: usize = 64;

/// Metadata store interface exposed to the merge/sync layer
pub trait MetaStore: Send + Sync {
    /// Pre-populate the cache with up to `max_size` rows of the namespace;
    /// returns the number of rows loaded
    fn warm(&self) -> MetaStoreResult<usize>;

    /// Meta for `id`, from the cache or the durable backend
    fn get_meta(&self, id: &str) -> MetaStoreResult<Option<Meta>>;

    /// Persist `meta` for `id`, then cache it
    fn put_meta(&self, id: &str, meta: &Meta) -> MetaStoreResult<()>;
}

/// Metadata store for one namespace over a backend and a cache
pub struct Metastore<B = RedbBackend, C = LruCache> {
    namespace: String,
    backend: B,
    cache: C,
    hasher: Box<dyn KeyHasher>,
    locks: Box<[Mutex<()>]>,
}

impl<B: MetaBackend, C: MemCache> Metastore<B, C> {
    /// Create a store with the default hasher and lock striping
    ///
    /// The namespace is used verbatim; [`MetastoreConfig::validate`] is the
    /// place that rejects namespaces containing `':'`.
    pub fn new(namespace: impl Into<String>, backend: B, cache: C) -> Self {
        Self {
            namespace: namespace.into(),
            backend,
            cache,
            hasher: Box::new(Xxh3Hasher),
            locks: stripes(DEFAULT_LOCK_STRIPES),
        }
    }

    /// Use a different cache key hasher
    #[must_use]
    pub fn with_hasher(mut self, hasher: Box<dyn KeyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Use a different number of lock stripes (at least one)
    #[must_use]
    pub fn with_lock_stripes(mut self, count: usize) -> Self {
        self.locks = stripes(count);
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Cache key of `id` within this store's namespace
    pub fn cache_key(&self, id: &str) -> CacheKey {
        self.hasher.key_for(&self.namespace, id)
    }

    fn lock(&self, key: CacheKey) -> MutexGuard<'_, ()> {
        self.locks[key.stripe(self.locks.len())].lock()
    }

    /// Load up to `cache.max_size()` rows of the namespace into the cache
    ///
    /// Holds every stripe for the duration, so no put can interleave with
    /// the bulk fill and be overwritten by an older row.
    pub fn warm(&self) -> MetaStoreResult<usize> {
        let _guards: Vec<MutexGuard<'_, ()>> = self.locks.iter().map(|lock| lock.lock()).collect();

        let rows = self
            .backend
            .all_for_namespace(&self.namespace, self.cache.max_size())?;
        let loaded = rows.len();
        for row in rows {
            let key = self.hasher.key_for(&row.namespace, &row.id);
            self.cache.put(key, row.data);
        }

        info!(
            namespace = %self.namespace,
            loaded,
            max_size = self.cache.max_size(),
            "Warmed metadata cache"
        );
        Ok(loaded)
    }

    /// Meta for `id`: cache hit, else backend, else `None`
    pub fn get_meta(&self, id: &str) -> MetaStoreResult<Option<Meta>> {
        let key = self.cache_key(id);
        let _guard = self.lock(key);

        if let Some(data) = self.cache.get(&key) {
            debug!(namespace = %self.namespace, id, "Metadata cache hit");
            return Ok(Some(Meta::from_data_string(&data)?));
        }

        match self.backend.get_by_id(id, &self.namespace)? {
            Some(data) => {
                debug!(namespace = %self.namespace, id, "Metadata cache miss, read from backend");
                Ok(Some(Meta::from_data_string(&data)?))
            }
            None => {
                debug!(namespace = %self.namespace, id, "Metadata not found");
                Ok(None)
            }
        }
    }

    /// Upsert `meta` for `id` in the backend, then in the cache
    pub fn put_meta(&self, id: &str, meta: &Meta) -> MetaStoreResult<()> {
        let data = meta.to_data_string()?;
        let key = self.cache_key(id);
        let _guard = self.lock(key);

        self.backend.upsert(id, &self.namespace, &data)?;
        self.cache.put(key, data);

        debug!(namespace = %self.namespace, id, fields = meta.len(), "Stored metadata");
        Ok(())
    }

    /// Delete `id` from the backend and drop its cache entry
    ///
    /// Returns whether the backend held a row.
    pub fn delete_meta(&self, id: &str) -> MetaStoreResult<bool> {
        let key = self.cache_key(id);
        let _guard = self.lock(key);

        let existed = self.backend.delete(id, &self.namespace)?;
        self.cache.remove(&key);

        debug!(namespace = %self.namespace, id, existed, "Deleted metadata");
        Ok(existed)
    }
}

impl Metastore<RedbBackend, LruCache> {
    /// Open a redb-backed store from configuration, warming it if configured
    pub fn open(config: &MetastoreConfig) -> MetaStoreResult<Self> {
        config.validate()?;

        let backend = RedbBackend::open(&config.data_path)?;
        let cache = LruCache::new(config.cache.max_entries);
        let store = Self::new(config.namespace.clone(), backend, cache)
            .with_hasher(config.hasher.build())
            .with_lock_stripes(config.lock_stripes);

        info!(
            namespace = %config.namespace,
            path = %config.data_path.display(),
            hasher = config.hasher.as_str(),
            max_entries = config.cache.max_entries,
            "Opened metadata store"
        );

        if config.warm_on_open {
            store.warm()?;
        }
        Ok(store)
    }
}

impl<B: MetaBackend, C: MemCache> MetaStore for Metastore<B, C> {
    fn warm(&self) -> MetaStoreResult<usize> {
        Metastore::warm(self)
    }

    fn get_meta(&self, id: &str) -> MetaStoreResult<Option<Meta>> {
        Metastore::get_meta(self, id)
    }

    fn put_meta(&self, id: &str, meta: &Meta) -> MetaStoreResult<()> {
        Metastore::put_meta(self, id, meta)
    }
}

fn stripes(count: usize) -> Box<[Mutex<()>]> {
    (0..count.max(1)).map(|_| Mutex::new(())).collect()
}

impl<B, C> std::fmt::Debug for Metastore<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metastore")
            .field("namespace", &self.namespace)
            .field("lock_stripes", &self.locks.len())
            .finish_non_exhaustive()
    }
}
