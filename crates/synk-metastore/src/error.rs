//! Error types for metadata store operations

use synk_codec::CodecError;

/// Error type for metadata store operations
///
/// Backend failures are surfaced as-is; the store never retries and never
/// substitutes a cached value for a failed durable read or write.
#[derive(Debug, thiserror::Error)]
pub enum MetaStoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::DatabaseError),
    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("redb transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("configuration error: {0}")]
    Config(#[from] synk_common::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<redb::TransactionError> for MetaStoreError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Transaction(Box::new(e))
    }
}

impl MetaStoreError {
    /// Create an error for a third-party backend adapter
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Check if a stored value failed to decode
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Codec(_))
    }
}

pub type MetaStoreResult<T> = Result<T, MetaStoreError>;
