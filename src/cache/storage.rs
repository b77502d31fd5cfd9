//! Cache Storage Module
//!
//! The storage engine: get, refresh, delete and set for a key inside a
//! namespace, built only from the transactions of a [`StateStore`].
//!
//! Each namespace owns a metadata collection and a data collection. Locks
//! are always taken in the order metadata key, registry entry, data key, so
//! concurrent writers cannot wait on each other in a cycle.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, trace, warn};

use crate::cache::{policy, registry, CacheEntryMetadata, CacheNamespace, EntryOptions};
use crate::error::Result;
use crate::store::{CollectionHandle, LockMode, OpContext, StateStore, StoreError};

// == Cache Storage ==
/// Storage engine over an injected store.
#[derive(Debug)]
pub struct CacheStorage<S> {
    store: Arc<S>,
}

impl<S> Clone for CacheStorage<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: StateStore> CacheStorage<S> {
    // == Constructor ==
    /// Creates an engine sharing `store` with every namespace.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // == Get ==
    /// Returns the payload for `key`, or `None` on a miss.
    ///
    /// An expired entry is deleted in a separate transaction and reported as
    /// a miss. A live entry gets its `last_accessed` refreshed before the
    /// payload is returned.
    pub async fn get(
        &self,
        key: &str,
        namespace: &CacheNamespace,
        ctx: &OpContext,
    ) -> Result<Option<Vec<u8>>> {
        ctx.check()?;
        let Some(metadata) = self.store.collection(&namespace.metadata_collection()).await? else {
            return Ok(None);
        };
        let Some(data) = self.store.collection(&namespace.data_collection()).await? else {
            return Ok(None);
        };

        let mut txn = self.store.begin().await?;
        let Some(raw_meta) = txn.try_get(&metadata, key, LockMode::Default, ctx).await? else {
            return Ok(None);
        };
        let meta = decode(&raw_meta)?;

        if policy::is_expired(&meta)? {
            drop(txn);
            debug!(namespace = %namespace, key, "entry expired, removing");
            self.delete(key, namespace, ctx).await?;
            return Ok(None);
        }

        let Some(payload) = txn.try_get(&data, key, LockMode::Default, ctx).await? else {
            warn!(namespace = %namespace, key, "metadata without payload, treating as miss");
            return Ok(None);
        };
        txn.commit().await?;

        self.touch(key, &metadata, &meta, &raw_meta, ctx).await;
        Ok(Some(payload))
    }

    // == Refresh ==
    /// Moves `last_accessed` of an existing entry to now. Missing keys are
    /// ignored and the payload is never read.
    pub async fn refresh(
        &self,
        key: &str,
        namespace: &CacheNamespace,
        ctx: &OpContext,
    ) -> Result<()> {
        ctx.check()?;
        let Some(metadata) = self.store.collection(&namespace.metadata_collection()).await? else {
            return Ok(());
        };

        let mut txn = self.store.begin().await?;
        let raw_meta = txn.try_get(&metadata, key, LockMode::Default, ctx).await?;
        txn.commit().await?;

        if let Some(raw_meta) = raw_meta {
            let meta = decode(&raw_meta)?;
            self.touch(key, &metadata, &meta, &raw_meta, ctx).await;
        }
        Ok(())
    }

    // == Delete ==
    /// Removes `key` from both collections in one transaction. Idempotent.
    pub async fn delete(
        &self,
        key: &str,
        namespace: &CacheNamespace,
        ctx: &OpContext,
    ) -> Result<()> {
        ctx.check()?;
        let metadata = self.store.collection(&namespace.metadata_collection()).await?;
        let data = self.store.collection(&namespace.data_collection()).await?;
        if metadata.is_none() && data.is_none() {
            return Ok(());
        }

        let mut txn = self.store.begin().await?;
        if let Some(metadata) = &metadata {
            txn.try_remove(metadata, key, ctx).await?;
        }
        if let Some(data) = &data {
            txn.try_remove(data, key, ctx).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    // == Set ==
    /// Writes `value` under `key`, together with its metadata and the
    /// namespace's registry entry, in one transaction.
    ///
    /// Fails with a configuration error, before anything is written, when
    /// the resulting absolute expiration is not after the entry's creation.
    pub async fn set(
        &self,
        key: &str,
        value: &[u8],
        options: &EntryOptions,
        namespace: &CacheNamespace,
        ctx: &OpContext,
    ) -> Result<()> {
        ctx.check()?;
        let now = Utc::now();
        let size = value.len() as u64;
        let metadata_name = namespace.metadata_collection();

        let metadata = match self.store.collection(&metadata_name).await? {
            Some(handle) => handle,
            None => {
                policy::validate(&CacheEntryMetadata::new(options, size, now))?;
                self.store.collection_or_create(&metadata_name).await?
            }
        };

        let mut txn = self.store.begin().await?;
        let next = match txn.try_get(&metadata, key, LockMode::Update, ctx).await? {
            Some(raw) => decode(&raw)?.merged(options, size, now),
            None => CacheEntryMetadata::new(options, size, now),
        };
        policy::validate(&next)?;

        registry::register_activity(self.store.as_ref(), namespace, txn.as_mut(), now, ctx)
            .await?;

        let data = self
            .store
            .collection_or_create(&namespace.data_collection())
            .await?;
        let replacement = value.to_vec();
        txn.add_or_update(
            &data,
            key,
            value.to_vec(),
            Box::new(move |_| Ok(replacement)),
            ctx,
        )
        .await?;

        let options = options.clone();
        txn.add_or_update(
            &metadata,
            key,
            serde_json::to_vec(&next)?,
            Box::new(move |existing| {
                let stored: CacheEntryMetadata = serde_json::from_slice(existing)
                    .map_err(|e| StoreError::Corrupt(format!("entry metadata: {e}")))?;
                serde_json::to_vec(&stored.merged(&options, size, now))
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
            }),
            ctx,
        )
        .await?;

        txn.commit().await?;
        trace!(namespace = %namespace, key, size, "entry written");
        Ok(())
    }

    // == Optimistic Last-Access Update ==
    /// Advisory refresh of `last_accessed`. Losing a race or failing is
    /// logged and otherwise ignored.
    async fn touch(
        &self,
        key: &str,
        metadata: &CollectionHandle,
        stored: &CacheEntryMetadata,
        raw_stored: &[u8],
        ctx: &OpContext,
    ) {
        match self.try_touch(key, metadata, stored, raw_stored, ctx).await {
            Ok(true) => trace!(key, "last access refreshed"),
            Ok(false) => debug!(key, "last access refresh lost a race, skipped"),
            Err(e) => debug!(key, error = %e, "last access refresh abandoned"),
        }
    }

    async fn try_touch(
        &self,
        key: &str,
        metadata: &CollectionHandle,
        stored: &CacheEntryMetadata,
        raw_stored: &[u8],
        ctx: &OpContext,
    ) -> Result<bool> {
        let touched = serde_json::to_vec(&stored.touched(Utc::now()))?;
        let mut txn = self.store.begin().await?;
        let swapped = txn
            .try_update(metadata, key, touched, raw_stored, ctx)
            .await?;
        txn.commit().await?;
        Ok(swapped)
    }
}

fn decode(raw: &[u8]) -> Result<CacheEntryMetadata> {
    Ok(serde_json::from_slice(raw)?)
}
