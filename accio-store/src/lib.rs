//! Cache stores for accio.
//!
//! A [`CacheStore`] is the shared key→entry map controllers coalesce through.
//! It is created once per [`CacheScope`] and shared by every controller in
//! that scope. Controllers only hold a non-owning reference to it.
//!
//! Implement [`CacheStore`] to plug in your own storage; [`MemoryStore`] is the
//! unbounded default and `accio-moka` provides a capacity-bounded one.

mod entry;
mod memory;
mod scope;

use std::sync::Arc;

use accio_core::CacheKey;

pub use entry::{CacheEntry, InFlight, Resolution, Subscription};
pub use memory::MemoryStore;
pub use scope::{CacheScope, ScopeError, StorageKind};

/// Status of deleting result.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted,
    /// Record already missing.
    Missing,
}

/// Result of [`CacheStore::get_or_insert_with`].
#[derive(Debug)]
pub enum Lookup<Res> {
    /// An entry was already stored under the key.
    Hit(CacheEntry<Res>),
    /// The key was vacant; the freshly built entry has been stored.
    Inserted(CacheEntry<Res>),
}

impl<Res> Lookup<Res> {
    /// Returns the entry regardless of how it was obtained.
    pub fn into_entry(self) -> CacheEntry<Res> {
        match self {
            Lookup::Hit(entry) | Lookup::Inserted(entry) => entry,
        }
    }
}

/// Constructor passed to [`CacheStore::get_or_insert_with`].
pub type MakeEntry<'a, Res> = Box<dyn FnOnce() -> CacheEntry<Res> + 'a>;

/// Shared key→entry store.
///
/// Every method is synchronous: a lookup followed by an insert never crosses
/// a suspension point, which is what lets concurrent misses converge on one
/// pending entry. The store does not order concurrent writers itself; a later
/// `set` simply overwrites an earlier one.
pub trait CacheStore<Res>: Send + Sync {
    /// Returns `true` when an entry is stored under `key`.
    fn has(&self, key: &CacheKey) -> bool;

    /// Returns a clone of the entry stored under `key`.
    fn get(&self, key: &CacheKey) -> Option<CacheEntry<Res>>;

    /// Stores `entry` under `key`, replacing any previous entry.
    fn set(&self, key: CacheKey, entry: CacheEntry<Res>);

    /// Removes the entry stored under `key`.
    fn delete(&self, key: &CacheKey) -> DeleteStatus;

    /// Returns the entry under `key`, storing the one built by `make` when
    /// the key is vacant.
    ///
    /// The default implementation composes [`get`](Self::get) and
    /// [`set`](Self::set). Stores shared between threads should override it
    /// with an atomic variant.
    fn get_or_insert_with(&self, key: &CacheKey, make: MakeEntry<'_, Res>) -> Lookup<Res>
    where
        Res: Clone,
    {
        if let Some(entry) = self.get(key) {
            return Lookup::Hit(entry);
        }
        let entry = make();
        self.set(key.clone(), entry.clone());
        Lookup::Inserted(entry)
    }

    /// Returns the name of this store, used in logs.
    fn name(&self) -> &str {
        "store"
    }
}

impl<Res, S> CacheStore<Res> for Arc<S>
where
    S: CacheStore<Res> + ?Sized,
    Res: Clone,
{
    fn has(&self, key: &CacheKey) -> bool {
        (**self).has(key)
    }

    fn get(&self, key: &CacheKey) -> Option<CacheEntry<Res>> {
        (**self).get(key)
    }

    fn set(&self, key: CacheKey, entry: CacheEntry<Res>) {
        (**self).set(key, entry)
    }

    fn delete(&self, key: &CacheKey) -> DeleteStatus {
        (**self).delete(key)
    }

    fn get_or_insert_with(&self, key: &CacheKey, make: MakeEntry<'_, Res>) -> Lookup<Res> {
        (**self).get_or_insert_with(key, make)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
