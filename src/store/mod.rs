//! Store Module
//!
//! The transactional keyed-storage boundary the cache is built on.
//!
//! A store holds named collections of `String -> bytes` pairs. All reads and
//! writes go through a [`Transaction`]; nothing a transaction writes becomes
//! visible until [`Transaction::commit`] succeeds, and dropping a transaction
//! without committing discards its writes.

mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use memory::MemoryStore;

// == Store Error ==
/// Failures raised by a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A wait on the store exceeded the operation timeout
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The transaction lost a race with another writer
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The store could not be reached or refused the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The operation was aborted through its cancellation token
    #[error("store operation cancelled")]
    Cancelled,

    /// A stored value could not be decoded by an update function
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Lock Mode ==
/// How a read treats the key's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Read the committed value without holding a lock
    #[default]
    Default,
    /// Take the key's exclusive lock until the transaction ends
    Update,
}

// == Operation Context ==
/// Timeout and cancellation threaded through every store call.
#[derive(Debug, Clone)]
pub struct OpContext {
    /// Upper bound for any single wait inside the store
    pub timeout: Duration,
    /// Aborts in-flight waits when cancelled
    pub token: CancellationToken,
}

impl OpContext {
    /// Creates a context with the given timeout and token.
    pub fn new(timeout: Duration, token: CancellationToken) -> Self {
        Self { timeout, token }
    }

    /// Fails fast when the token is already cancelled.
    pub fn check(&self) -> StoreResult<()> {
        if self.token.is_cancelled() {
            Err(StoreError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// == Collection Handle ==
/// Proof that a named collection exists in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionHandle {
    name: Arc<str>,
}

impl CollectionHandle {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: Arc::from(name) }
    }

    /// The collection's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Computes the replacement for an existing value in `add_or_update`.
pub type UpdateFn = Box<dyn FnOnce(&[u8]) -> StoreResult<Vec<u8>> + Send>;

// == Traits ==
/// A store of named collections with transactional access.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Looks up an existing collection.
    async fn collection(&self, name: &str) -> StoreResult<Option<CollectionHandle>>;

    /// Looks up a collection, creating it empty if absent.
    async fn collection_or_create(&self, name: &str) -> StoreResult<CollectionHandle>;

    /// Opens a new transaction.
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;
}

/// A unit of atomic work against a [`StateStore`].
#[async_trait]
pub trait Transaction: Send {
    /// Reads the value for `key`, if any.
    async fn try_get(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        lock: LockMode,
        ctx: &OpContext,
    ) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the value for `key` only if it currently equals `expected`.
    async fn try_update(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        value: Vec<u8>,
        expected: &[u8],
        ctx: &OpContext,
    ) -> StoreResult<bool>;

    /// Inserts `insert` if `key` is absent, otherwise stores `update(existing)`.
    async fn add_or_update(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        insert: Vec<u8>,
        update: UpdateFn,
        ctx: &OpContext,
    ) -> StoreResult<()>;

    /// Removes `key`, returning whether it was present.
    async fn try_remove(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        ctx: &OpContext,
    ) -> StoreResult<bool>;

    /// Atomically applies every write made in this transaction.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
