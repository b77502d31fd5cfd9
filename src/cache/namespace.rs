//! Cache Namespace Module
//!
//! A namespace isolates the keys of one (tenant, client) pair. Its
//! collections are found by name, so the naming scheme below is persisted
//! and must stay stable.

use std::fmt;

use crate::partition::partition_key_str;

// == Naming Scheme ==
/// Collection holding one registry entry per namespace.
pub const REGISTRY_COLLECTION: &str = "cache";

const REGISTRY_PREFIX: &str = "C";
const METADATA_PREFIX: &str = "M";
const DATA_PREFIX: &str = "D";

// == Cache Namespace ==
/// Identifies an isolated cache scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace {
    tenant_id: String,
    client_id: String,
}

impl CacheNamespace {
    // == Constructor ==
    pub fn new(tenant_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    // == Derived Names ==
    /// Key of this namespace inside [`REGISTRY_COLLECTION`].
    pub fn registry_key(&self) -> String {
        self.derive(REGISTRY_PREFIX)
    }

    /// Name of the collection holding entry metadata.
    pub fn metadata_collection(&self) -> String {
        self.derive(METADATA_PREFIX)
    }

    /// Name of the collection holding payloads.
    pub fn data_collection(&self) -> String {
        self.derive(DATA_PREFIX)
    }

    /// Partition key used to route this namespace to a store partition.
    pub fn partition_key(&self) -> u32 {
        partition_key_str(&self.registry_key())
    }

    fn derive(&self, prefix: &str) -> String {
        format!(
            "{prefix}:T{}:C{}",
            escape(&self.tenant_id),
            escape(&self.client_id)
        )
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.client_id)
    }
}

/// Escapes `\` and `:` so an unescaped `:` is always a delimiter.
fn escape(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        if ch == '\\' || ch == ':' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_plain_ids_use_legacy_names() {
        let ns = CacheNamespace::new("acme", "web");
        assert_eq!(ns.registry_key(), "C:Tacme:Cweb");
        assert_eq!(ns.metadata_collection(), "M:Tacme:Cweb");
        assert_eq!(ns.data_collection(), "D:Tacme:Cweb");
    }

    #[test]
    fn test_delimiters_are_escaped() {
        let ns = CacheNamespace::new("a:b", "c\\d");
        assert_eq!(ns.data_collection(), "D:Ta\\:b:Cc\\\\d");
    }

    #[test]
    fn test_crafted_ids_do_not_collide() {
        let pairs = [
            ("a:Cb", "c"),
            ("a", "b:Cc"),
            ("a\\", ":Cb"),
            ("a", "\\:Cb"),
            ("a:", "Cb"),
            ("", "a"),
            ("a", ""),
        ];
        let names: HashSet<String> = pairs
            .iter()
            .map(|(t, c)| CacheNamespace::new(*t, *c).data_collection())
            .collect();
        assert_eq!(names.len(), pairs.len());
    }

    #[test]
    fn test_collections_are_distinct_per_namespace() {
        let ns = CacheNamespace::new("t", "c");
        assert_ne!(ns.metadata_collection(), ns.data_collection());
        assert_ne!(ns.metadata_collection(), REGISTRY_COLLECTION);
    }

    #[test]
    fn test_partition_key_is_stable() {
        let ns = CacheNamespace::new("acme", "web");
        assert_eq!(ns.partition_key(), CacheNamespace::new("acme", "web").partition_key());
        assert_eq!(ns.partition_key(), partition_key_str("C:Tacme:Cweb"));
    }
}
