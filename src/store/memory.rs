//! In-Memory Store
//!
//! A process-local [`StateStore`] with per-key exclusive locks, buffered
//! writes and all-or-nothing commits.
//!
//! Writers take the key's lock on first touch and keep it until the
//! transaction ends. Reads in [`LockMode::Default`] see the last committed
//! value (or the transaction's own pending write). Lock waits honour the
//! context's timeout and cancellation token.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex as KeyLock, OwnedMutexGuard};

use super::{
    CollectionHandle, LockMode, OpContext, StateStore, StoreError, StoreResult, Transaction,
    UpdateFn,
};

type Cell = (Arc<str>, String);
type Collections = HashMap<String, HashMap<String, Vec<u8>>>;

#[derive(Debug, Default)]
struct Shared {
    collections: Mutex<Collections>,
    locks: Mutex<HashMap<Cell, Arc<KeyLock<()>>>>,
    offline: AtomicBool,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Memory Store ==
/// Transactional in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Offline Switch ==
    /// While offline, opening collections or transactions fails with
    /// [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    // == Inspection ==
    /// Returns the committed value for `key`, bypassing transactions.
    pub fn peek(&self, collection: &str, key: &str) -> Option<Vec<u8>> {
        guard(&self.shared.collections)
            .get(collection)
            .and_then(|entries| entries.get(key))
            .cloned()
    }

    /// Returns true if the named collection exists.
    pub fn has_collection(&self, name: &str) -> bool {
        guard(&self.shared.collections).contains_key(name)
    }

    /// Number of committed entries in a collection (0 if it does not exist).
    pub fn len(&self, collection: &str) -> usize {
        guard(&self.shared.collections)
            .get(collection)
            .map_or(0, HashMap::len)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.shared.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn collection(&self, name: &str) -> StoreResult<Option<CollectionHandle>> {
        self.ensure_online()?;
        let collections = guard(&self.shared.collections);
        Ok(collections
            .contains_key(name)
            .then(|| CollectionHandle::new(name)))
    }

    async fn collection_or_create(&self, name: &str) -> StoreResult<CollectionHandle> {
        self.ensure_online()?;
        guard(&self.shared.collections)
            .entry(name.to_string())
            .or_default();
        Ok(CollectionHandle::new(name))
    }

    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        self.ensure_online()?;
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            held: HashMap::new(),
            writes: HashMap::new(),
        }))
    }
}

// == Memory Transaction ==
struct MemoryTransaction {
    shared: Arc<Shared>,
    held: HashMap<Cell, OwnedMutexGuard<()>>,
    /// Pending writes; `None` marks a removal.
    writes: HashMap<Cell, Option<Vec<u8>>>,
}

impl MemoryTransaction {
    fn cell(collection: &CollectionHandle, key: &str) -> Cell {
        (Arc::from(collection.name()), key.to_string())
    }

    async fn lock(&mut self, cell: &Cell, ctx: &OpContext) -> StoreResult<()> {
        if self.held.contains_key(cell) {
            return Ok(());
        }

        let key_lock = Arc::clone(guard(&self.shared.locks).entry(cell.clone()).or_default());

        let acquired = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => return Err(StoreError::Cancelled),
            acquired = tokio::time::timeout(ctx.timeout, key_lock.lock_owned()) => acquired,
        };
        let key_guard = acquired.map_err(|_| StoreError::Timeout(ctx.timeout))?;

        self.held.insert(cell.clone(), key_guard);
        Ok(())
    }

    fn current(&self, cell: &Cell) -> Option<Vec<u8>> {
        if let Some(pending) = self.writes.get(cell) {
            return pending.clone();
        }
        guard(&self.shared.collections)
            .get(cell.0.as_ref())
            .and_then(|entries| entries.get(&cell.1))
            .cloned()
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn try_get(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        lock: LockMode,
        ctx: &OpContext,
    ) -> StoreResult<Option<Vec<u8>>> {
        ctx.check()?;
        let cell = Self::cell(collection, key);
        if lock == LockMode::Update {
            self.lock(&cell, ctx).await?;
        }
        Ok(self.current(&cell))
    }

    async fn try_update(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        value: Vec<u8>,
        expected: &[u8],
        ctx: &OpContext,
    ) -> StoreResult<bool> {
        ctx.check()?;
        let cell = Self::cell(collection, key);
        self.lock(&cell, ctx).await?;

        match self.current(&cell) {
            Some(existing) if existing == expected => {
                self.writes.insert(cell, Some(value));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_or_update(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        insert: Vec<u8>,
        update: UpdateFn,
        ctx: &OpContext,
    ) -> StoreResult<()> {
        ctx.check()?;
        let cell = Self::cell(collection, key);
        self.lock(&cell, ctx).await?;

        let value = match self.current(&cell) {
            Some(existing) => update(&existing)?,
            None => insert,
        };
        self.writes.insert(cell, Some(value));
        Ok(())
    }

    async fn try_remove(
        &mut self,
        collection: &CollectionHandle,
        key: &str,
        ctx: &OpContext,
    ) -> StoreResult<bool> {
        ctx.check()?;
        let cell = Self::cell(collection, key);
        self.lock(&cell, ctx).await?;

        let existed = self.current(&cell).is_some();
        if existed {
            self.writes.insert(cell, None);
        }
        Ok(existed)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = self;
        if this.shared.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store went offline before commit".to_string()));
        }

        let mut collections = guard(&this.shared.collections);
        for ((collection, key), value) in this.writes.drain() {
            let entries = collections.entry(collection.to_string()).or_default();
            match value {
                Some(bytes) => {
                    entries.insert(key, bytes);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        let released: Vec<Cell> = self.held.drain().map(|(cell, _)| cell).collect();
        let mut locks = guard(&self.shared.locks);
        for cell in released {
            // Only the table still references an idle lock.
            if locks.get(&cell).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                locks.remove(&cell);
            }
        }
    }
}
