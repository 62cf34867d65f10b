//! Cache key definitions.
//!
//! A [`WorkerCacheKey`] identifies one worker's cache slot and doubles as the
//! token for that worker's per-key lock.

use std::fmt;

const NAMESPACE: &str = "worker_cookies::workers";

/// Namespaced cache key derived 1:1 from a worker uuid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerCacheKey(String);

impl WorkerCacheKey {
    pub fn for_uuid(uuid: &str) -> Self {
        Self(format!("{NAMESPACE}_worker_{uuid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;

    fn hash_value<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn same_uuid_yields_equal_keys() {
        let key1 = WorkerCacheKey::for_uuid("8f0c2a");
        let key2 = WorkerCacheKey::for_uuid("8f0c2a");
        assert_eq!(key1, key2);
        assert_eq!(hash_value(&key1), hash_value(&key2));
    }

    #[test]
    fn distinct_uuids_never_collide() {
        assert_ne!(
            WorkerCacheKey::for_uuid("agent-1"),
            WorkerCacheKey::for_uuid("agent-10")
        );
        assert_ne!(WorkerCacheKey::for_uuid(""), WorkerCacheKey::for_uuid(" "));
    }

    #[test]
    fn key_is_namespaced() {
        let key = WorkerCacheKey::for_uuid("abc");
        assert_eq!(key.as_str(), "worker_cookies::workers_worker_abc");
        assert_eq!(key.to_string(), key.as_str());
    }
}
