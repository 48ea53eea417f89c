//! Async adapter over a blocking metadata store
//!
//! Backend I/O may block, so each call runs on tokio's blocking pool.

use crate::error::MetaStoreResult;
use crate::store::MetaStore;
use std::sync::Arc;
use synk_codec::Meta;

/// Runs [`MetaStore`] operations via `tokio::task::spawn_blocking`
pub struct AsyncMetastore<S> {
    inner: Arc<S>,
}

impl<S> Clone for AsyncMetastore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: MetaStore + 'static> AsyncMetastore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wrap a store that is shared with blocking callers
    pub const fn from_arc(inner: Arc<S>) -> Self {
        Self { inner }
    }

    /// The wrapped blocking store
    pub fn blocking(&self) -> &S {
        &self.inner
    }

    pub async fn warm(&self) -> MetaStoreResult<usize> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.warm()).await?
    }

    pub async fn get_meta(&self, id: impl Into<String>) -> MetaStoreResult<Option<Meta>> {
        let inner = Arc::clone(&self.inner);
        let id = id.into();
        tokio::task::spawn_blocking(move || inner.get_meta(&id)).await?
    }

    pub async fn put_meta(&self, id: impl Into<String>, meta: Meta) -> MetaStoreResult<()> {
        let inner = Arc::clone(&self.inner);
        let id = id.into();
        tokio::task::spawn_blocking(move || inner.put_meta(&id, &meta)).await?
    }

    /// Run any other blocking call against the store on the blocking pool
    pub async fn run<R, F>(&self, f: F) -> MetaStoreResult<R>
    where
        F: FnOnce(&S) -> MetaStoreResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner)).await?
    }
}
