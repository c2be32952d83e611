//! Request coalescing.
//!
//! Concurrent lookups of one key converge on a single pending entry, so the
//! resolver runs once and every caller observes the same outcome. The pending
//! entry is stored synchronously, before the caller first awaits, which is
//! what keeps near-simultaneous callers from both missing.
//!
//! A successful resolution replaces the pending entry with the settled value.
//! A failed one removes the key, so failures are never served from the store.

use std::sync::{Arc, Weak};

use accio_core::CacheKey;
use accio_store::{CacheEntry, CacheStore, InFlight, Lookup, MakeEntry, Subscription};
use futures::FutureExt;
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::{LookupOutcome, record_lookup, record_resolve};

/// Resolves `key` through `store`, starting a resolution with `resolve` only
/// when nothing is stored under it.
///
/// Without a store, or with `bypass` set, `resolve` is always called and the
/// store is left untouched.
pub fn coalesce<Res, F>(
    store: Option<Arc<dyn CacheStore<Res>>>,
    key: CacheKey,
    bypass: bool,
    resolve: F,
) -> Subscription<Res>
where
    Res: Clone + Send + Sync + 'static,
    F: FnOnce() -> Subscription<Res>,
{
    let store = match store {
        Some(store) if !bypass => store,
        Some(store) => {
            debug!(key = %key, store = store.name(), "cache bypassed");
            record_lookup(LookupOutcome::Bypass, store.name());
            return timed(resolve());
        }
        None => {
            debug!(key = %key, "no cache store, resolving uncached");
            record_lookup(LookupOutcome::Bypass, "none");
            return timed(resolve());
        }
    };

    let handle = Arc::downgrade(&store);
    let settle_key = key.clone();
    let make: MakeEntry<'_, Res> = Box::new(move || {
        CacheEntry::Pending(InFlight::new(settle(handle, settle_key, timed(resolve()))))
    });

    match store.get_or_insert_with(&key, make) {
        Lookup::Hit(entry) => {
            debug!(
                key = %key,
                store = store.name(),
                pending = entry.is_pending(),
                "cache hit"
            );
            record_lookup(LookupOutcome::Hit, store.name());
            entry.resolve()
        }
        Lookup::Inserted(entry) => {
            debug!(key = %key, store = store.name(), "cache miss");
            record_lookup(LookupOutcome::Miss, store.name());
            entry.resolve()
        }
    }
}

/// Writes the outcome of `resolution` back to the store once it finishes.
fn settle<Res>(
    store: Weak<dyn CacheStore<Res>>,
    key: CacheKey,
    resolution: Subscription<Res>,
) -> Subscription<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    async move {
        let outcome = resolution.await;
        // The scope may be gone by now; the outcome still reaches subscribers.
        if let Some(store) = store.upgrade() {
            match &outcome {
                Ok(value) => store.set(key, CacheEntry::Settled(value.clone())),
                Err(error) => {
                    store.delete(&key);
                    debug!(key = %key, store = store.name(), %error, "evicted failed resolution");
                    record_lookup(LookupOutcome::Evicted, store.name());
                }
            }
        }
        outcome
    }
    .boxed()
}

fn timed<Res>(resolution: Subscription<Res>) -> Subscription<Res>
where
    Res: Send + 'static,
{
    async move {
        let started = Instant::now();
        let outcome = resolution.await;
        record_resolve(started.elapsed(), outcome.is_ok());
        outcome
    }
    .boxed()
}
