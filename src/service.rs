//! Cache Service Module
//!
//! The request-facing façade over [`CacheStorage`]. Every call runs with the
//! service's default timeout and its shared cancellation token; no retries
//! and no batching happen here.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::cache::{CacheNamespace, CacheStorage, EntryOptions};
use crate::error::Result;
use crate::store::{OpContext, StateStore};

/// Operation timeout applied when none is configured.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

// == Cache Service ==
/// Get/refresh/delete/set addressed by key, tenant and client.
///
/// Clones share the storage engine and the cancellation token; shutting
/// down one clone aborts in-flight work on all of them.
#[derive(Debug)]
pub struct CacheService<S> {
    storage: CacheStorage<S>,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl<S> Clone for CacheService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            timeout: self.timeout,
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<S: StateStore> CacheService<S> {
    // == Constructor ==
    /// Creates a service with [`DEFAULT_OPERATION_TIMEOUT`].
    pub fn new(store: Arc<S>) -> Self {
        Self::with_timeout(store, DEFAULT_OPERATION_TIMEOUT)
    }

    /// Creates a service with a custom operation timeout.
    pub fn with_timeout(store: Arc<S>, timeout: Duration) -> Self {
        trace!("cache service created with timeout {:?}", timeout);
        Self {
            storage: CacheStorage::new(store),
            timeout,
            shutdown: CancellationToken::new(),
        }
    }

    /// The operation timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The storage engine behind this service.
    pub fn storage(&self) -> &CacheStorage<S> {
        &self.storage
    }

    // == Shutdown ==
    /// Cancels the shared token; in-flight and later calls fail with
    /// `CacheError::Cancelled`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn context(&self) -> OpContext {
        OpContext::new(self.timeout, self.shutdown.clone())
    }

    // == Operations ==
    /// Fetches a payload; `Ok(None)` is a miss.
    pub async fn get(&self, key: &str, tenant_id: &str, client_id: &str) -> Result<Option<Vec<u8>>> {
        trace!("Getting cache item with key '{}' ...", key);
        let namespace = CacheNamespace::new(tenant_id, client_id);
        let result = self.storage.get(key, &namespace, &self.context()).await;
        trace!("Getting cache item with key '{}' done!", key);
        result
    }

    /// Refreshes the last access time of an entry.
    pub async fn refresh(&self, key: &str, tenant_id: &str, client_id: &str) -> Result<()> {
        trace!("Refreshing cache item with key '{}' ...", key);
        let namespace = CacheNamespace::new(tenant_id, client_id);
        let result = self.storage.refresh(key, &namespace, &self.context()).await;
        trace!("Refreshing cache item with key '{}' done!", key);
        result
    }

    /// Deletes an entry; deleting a missing entry succeeds.
    pub async fn delete(&self, key: &str, tenant_id: &str, client_id: &str) -> Result<()> {
        trace!("Deleting cache item with key '{}' ...", key);
        let namespace = CacheNamespace::new(tenant_id, client_id);
        let result = self.storage.delete(key, &namespace, &self.context()).await;
        trace!("Deleting cache item with key '{}' done!", key);
        result
    }

    /// Stores a payload with the given expiration options.
    pub async fn set(
        &self,
        key: &str,
        value: &[u8],
        options: &EntryOptions,
        tenant_id: &str,
        client_id: &str,
    ) -> Result<()> {
        trace!("Setting cache item with key '{}' ...", key);
        let namespace = CacheNamespace::new(tenant_id, client_id);
        let result = self
            .storage
            .set(key, value, options, &namespace, &self.context())
            .await;
        trace!("Setting cache item with key '{}' done!", key);
        result
    }
}
