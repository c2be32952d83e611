//! Cache scopes.
//!
//! A [`CacheScope`] owns one store and hands out non-owning references to
//! the controllers nested in it. Dropping the scope drops the store; a
//! controller whose scope is gone runs uncached.

use std::str::FromStr;
use std::sync::{Arc, Weak};

use thiserror::Error;

use crate::{CacheStore, MemoryStore};

/// Kind of storage backing a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Process memory, lost when the scope is dropped.
    #[default]
    Memory,
    /// Durable storage surviving the process (not supported).
    Persistent,
}

impl FromStr for StorageKind {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StorageKind::Memory),
            "persistent" | "localStorage" => Ok(StorageKind::Persistent),
            other => Err(ScopeError::UnknownStorage(other.to_owned())),
        }
    }
}

/// Error creating a [`CacheScope`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The storage kind exists but cannot back a scope.
    #[error("{0:?} storage is not supported, use memory storage instead")]
    Unsupported(StorageKind),
    /// The storage kind name is not recognised.
    #[error("unknown storage kind {0:?}")]
    UnknownStorage(String),
}

/// Owner of the store shared by every controller in one scope.
pub struct CacheScope<Res> {
    store: Arc<dyn CacheStore<Res>>,
}

impl<Res> CacheScope<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Creates a scope backed by a fresh [`MemoryStore`].
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Creates a scope for the given storage kind.
    pub fn configure(kind: StorageKind) -> Result<Self, ScopeError> {
        match kind {
            StorageKind::Memory => Ok(Self::new()),
            StorageKind::Persistent => Err(ScopeError::Unsupported(kind)),
        }
    }

    /// Creates a scope backed by a custom store.
    pub fn with_store<S>(store: S) -> Self
    where
        S: CacheStore<Res> + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<Res> CacheScope<Res> {
    /// Returns the owned store.
    pub fn store(&self) -> &Arc<dyn CacheStore<Res>> {
        &self.store
    }

    /// Returns a non-owning handle for controllers in this scope.
    pub fn handle(&self) -> Weak<dyn CacheStore<Res>> {
        Arc::downgrade(&self.store)
    }
}

impl<Res> Default for CacheScope<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Res> std::fmt::Debug for CacheScope<Res> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheScope")
            .field("store", &self.store.name())
            .finish()
    }
}
