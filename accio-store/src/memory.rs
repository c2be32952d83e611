//! Unbounded in-memory store.

use std::sync::Arc;

use accio_core::CacheKey;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{CacheEntry, CacheStore, DeleteStatus, Lookup, MakeEntry};

/// Unbounded in-memory store backed by [`DashMap`].
///
/// Cheap to clone: clones share the same map. Nothing is ever evicted except
/// by an explicit [`delete`](CacheStore::delete), which is what the
/// coalescing engine does on failed resolutions.
///
/// [`get_or_insert_with`](CacheStore::get_or_insert_with) holds the shard lock
/// between the lookup and the insert, so coalescing also holds when
/// controllers are driven from several threads.
pub struct MemoryStore<Res> {
    entries: Arc<DashMap<CacheKey, CacheEntry<Res>>>,
}

impl<Res> MemoryStore<Res> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored entries, pending ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<Res> Clone for MemoryStore<Res> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<Res> Default for MemoryStore<Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res> std::fmt::Debug for MemoryStore<Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<Res> CacheStore<Res> for MemoryStore<Res>
where
    Res: Clone + Send + Sync,
{
    fn has(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry<Res>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<Res>) {
        self.entries.insert(key, entry);
    }

    fn delete(&self, key: &CacheKey) -> DeleteStatus {
        match self.entries.remove(key) {
            Some(_) => DeleteStatus::Deleted,
            None => DeleteStatus::Missing,
        }
    }

    fn get_or_insert_with(&self, key: &CacheKey, make: MakeEntry<'_, Res>) -> Lookup<Res> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) => Lookup::Hit(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let entry = make();
                vacant.insert(entry.clone());
                Lookup::Inserted(entry)
            }
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CacheKey {
        CacheKey::new(s)
    }

    #[test]
    fn set_get_delete() {
        let store = MemoryStore::<u32>::new();
        assert!(!store.has(&key("a")));
        assert!(store.get(&key("a")).is_none());

        store.set(key("a"), CacheEntry::Settled(1));
        assert!(store.has(&key("a")));
        assert_eq!(store.get(&key("a")).and_then(CacheEntry::into_settled), Some(1));

        store.set(key("a"), CacheEntry::Settled(2));
        assert_eq!(store.get(&key("a")).and_then(CacheEntry::into_settled), Some(2));

        assert_eq!(store.delete(&key("a")), DeleteStatus::Deleted);
        assert_eq!(store.delete(&key("a")), DeleteStatus::Missing);
        assert!(store.is_empty());
    }

    #[test]
    fn get_or_insert_builds_once() {
        let store = MemoryStore::<u32>::new();
        let mut built = 0;

        let first = store.get_or_insert_with(
            &key("a"),
            Box::new(|| {
                built += 1;
                CacheEntry::Settled(1)
            }),
        );
        assert!(matches!(first, Lookup::Inserted(CacheEntry::Settled(1))));

        let second = store.get_or_insert_with(&key("a"), Box::new(|| CacheEntry::Settled(2)));
        assert!(matches!(second, Lookup::Hit(CacheEntry::Settled(1))));
        assert_eq!(built, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::<u32>::new();
        let clone = store.clone();
        clone.set(key("a"), CacheEntry::Settled(1));
        assert!(store.has(&key("a")));
        store.clear();
        assert!(clone.is_empty());
    }
}
