//! Builder for configuring [`MokaStore`].

use std::time::Duration;

use accio_core::CacheKey;
use accio_store::CacheEntry;
use moka::sync::Cache;

use crate::store::MokaStore;

/// Builder for [`MokaStore`].
///
/// Created with [`MokaStore::builder`].
#[derive(Debug, Clone)]
pub struct MokaStoreBuilder {
    max_capacity: u64,
    time_to_idle: Option<Duration>,
    name: &'static str,
}

impl MokaStoreBuilder {
    pub(crate) fn new(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            time_to_idle: None,
            name: "moka",
        }
    }

    /// Drops entries that have not been read or written for `duration`.
    pub fn time_to_idle(mut self, duration: Duration) -> Self {
        self.time_to_idle = Some(duration);
        self
    }

    /// Sets the name reported in logs.
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Builds the store.
    pub fn build<Res>(self) -> MokaStore<Res>
    where
        Res: Clone + Send + Sync + 'static,
    {
        let mut builder = Cache::<CacheKey, CacheEntry<Res>>::builder().max_capacity(self.max_capacity);
        if let Some(duration) = self.time_to_idle {
            builder = builder.time_to_idle(duration);
        }
        MokaStore {
            cache: builder.build(),
            name: self.name,
        }
    }
}
