//! Namespace Registry Module
//!
//! Records which namespaces have been written to and when. The registry is
//! bookkeeping only; reads and writes of cache entries never consult it.

use chrono::{DateTime, Utc};

use crate::cache::{CacheNamespace, NamespaceRegistryEntry, REGISTRY_COLLECTION};
use crate::error::Result;
use crate::store::{OpContext, StateStore, StoreError, Transaction};

// == Register Activity ==
/// Upserts the registry entry for `namespace` inside `txn`.
///
/// Creates the entry on first use; afterwards only `last_access` moves.
/// The change commits or rolls back together with the rest of `txn`.
pub async fn register_activity<S: StateStore + ?Sized>(
    store: &S,
    namespace: &CacheNamespace,
    txn: &mut dyn Transaction,
    now: DateTime<Utc>,
    ctx: &OpContext,
) -> Result<()> {
    let registry = store.collection_or_create(REGISTRY_COLLECTION).await?;

    let fresh = NamespaceRegistryEntry {
        tenant_id: namespace.tenant_id().to_string(),
        client_id: namespace.client_id().to_string(),
        last_access: now,
    };
    let insert = serde_json::to_vec(&fresh)?;

    txn.add_or_update(
        &registry,
        &namespace.registry_key(),
        insert,
        Box::new(move |existing| {
            let mut entry: NamespaceRegistryEntry = serde_json::from_slice(existing)
                .map_err(|e| StoreError::Corrupt(format!("registry entry: {e}")))?;
            entry.last_access = now;
            serde_json::to_vec(&entry).map_err(|e| StoreError::Corrupt(e.to_string()))
        }),
        ctx,
    )
    .await?;

    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeDelta;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> OpContext {
        OpContext::new(Duration::from_secs(1), CancellationToken::new())
    }

    fn read_entry(store: &MemoryStore, ns: &CacheNamespace) -> Option<NamespaceRegistryEntry> {
        store
            .peek(REGISTRY_COLLECTION, &ns.registry_key())
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_first_activity_creates_entry() {
        let store = MemoryStore::new();
        let ns = CacheNamespace::new("acme", "web");
        let now = Utc::now();

        let mut txn = store.begin().await.unwrap();
        register_activity(&store, &ns, txn.as_mut(), now, &ctx())
            .await
            .unwrap();
        txn.commit().await.unwrap();

        let entry = read_entry(&store, &ns).unwrap();
        assert_eq!(entry.tenant_id, "acme");
        assert_eq!(entry.client_id, "web");
        assert_eq!(entry.last_access, now);
    }

    #[tokio::test]
    async fn test_later_activity_updates_last_access() {
        let store = MemoryStore::new();
        let ns = CacheNamespace::new("acme", "web");
        let first = Utc::now();
        let second = first + TimeDelta::seconds(30);

        for now in [first, second] {
            let mut txn = store.begin().await.unwrap();
            register_activity(&store, &ns, txn.as_mut(), now, &ctx())
                .await
                .unwrap();
            txn.commit().await.unwrap();
        }

        assert_eq!(read_entry(&store, &ns).unwrap().last_access, second);
        assert_eq!(store.len(REGISTRY_COLLECTION), 1);
    }

    #[tokio::test]
    async fn test_activity_rolls_back_with_transaction() {
        let store = MemoryStore::new();
        let ns = CacheNamespace::new("acme", "web");

        {
            let mut txn = store.begin().await.unwrap();
            register_activity(&store, &ns, txn.as_mut(), Utc::now(), &ctx())
                .await
                .unwrap();
        }

        assert!(read_entry(&store, &ns).is_none());
    }
}
