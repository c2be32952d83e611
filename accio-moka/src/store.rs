//! Moka store implementation.

use accio_core::CacheKey;
use accio_store::{CacheEntry, CacheStore, DeleteStatus, Lookup, MakeEntry};
use moka::sync::Cache;
use tracing::trace;

use crate::builder::MokaStoreBuilder;

/// Capacity-bounded store powered by Moka.
///
/// Clones share the same underlying cache.
///
/// # Caveats
///
/// - Data is **not persisted** and **not shared** across processes
/// - Eviction is **best-effort**: entries above capacity may briefly remain
///   readable until Moka's maintenance runs
#[derive(Clone)]
pub struct MokaStore<Res> {
    pub(crate) cache: Cache<CacheKey, CacheEntry<Res>>,
    pub(crate) name: &'static str,
}

impl MokaStore<()> {
    /// Creates a builder for a store holding at most `max_capacity` entries.
    pub fn builder(max_capacity: u64) -> MokaStoreBuilder {
        MokaStoreBuilder::new(max_capacity)
    }
}

impl<Res> MokaStore<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Returns the underlying Moka cache.
    pub fn cache(&self) -> &Cache<CacheKey, CacheEntry<Res>> {
        &self.cache
    }
}

impl<Res> std::fmt::Debug for MokaStore<Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore").field("name", &self.name).finish()
    }
}

impl<Res> CacheStore<Res> for MokaStore<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    fn has(&self, key: &CacheKey) -> bool {
        self.cache.contains_key(key)
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry<Res>> {
        self.cache.get(key)
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<Res>) {
        self.cache.insert(key, entry);
    }

    fn delete(&self, key: &CacheKey) -> DeleteStatus {
        match self.cache.remove(key) {
            Some(_) => DeleteStatus::Deleted,
            None => DeleteStatus::Missing,
        }
    }

    fn get_or_insert_with(&self, key: &CacheKey, make: MakeEntry<'_, Res>) -> Lookup<Res> {
        let entry = self.cache.entry_by_ref(key).or_insert_with(make);
        if entry.is_fresh() {
            trace!(store = self.name, %key, "entry inserted");
            Lookup::Inserted(entry.into_value())
        } else {
            Lookup::Hit(entry.into_value())
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}
