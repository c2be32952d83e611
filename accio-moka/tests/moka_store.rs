//! Tests for the capacity-bounded store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use accio::{
    CacheEntry, CacheKey, CacheScope, CacheStore, Config, ConfigRegistry, DeleteStatus,
    Descriptor, RequestController, ResolveError, resolver_fn,
};
use accio_moka::MokaStore;
use accio_store::Lookup;
use serde_json::{Value, json};

fn key(id: u32) -> CacheKey {
    CacheKey::new(format!("/items/{id}"))
}

#[test]
fn set_get_delete() {
    let store = MokaStore::builder(16).build::<u32>();
    assert!(!store.has(&key(1)));

    store.set(key(1), CacheEntry::Settled(1));
    assert!(store.has(&key(1)));
    assert_eq!(store.get(&key(1)).and_then(CacheEntry::into_settled), Some(1));

    assert_eq!(store.delete(&key(1)), DeleteStatus::Deleted);
    assert_eq!(store.delete(&key(1)), DeleteStatus::Missing);
    assert!(store.get(&key(1)).is_none());
}

#[test]
fn get_or_insert_builds_once() {
    let store = MokaStore::builder(16).name("items").build::<u32>();
    assert_eq!(store.name(), "items");

    let first = store.get_or_insert_with(&key(1), Box::new(|| CacheEntry::Settled(1)));
    assert!(matches!(first, Lookup::Inserted(CacheEntry::Settled(1))));

    let second = store.get_or_insert_with(&key(1), Box::new(|| CacheEntry::Settled(2)));
    assert!(matches!(second, Lookup::Hit(CacheEntry::Settled(1))));
}

#[test]
fn capacity_is_enforced() {
    let store = MokaStore::builder(3).build::<u32>();
    for id in 0..10 {
        store.set(key(id), CacheEntry::Settled(id));
    }
    store.cache().run_pending_tasks();

    assert!(store.cache().entry_count() <= 3);
}

#[tokio::test]
async fn controllers_coalesce_through_moka() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let registry: ConfigRegistry<Value> = ConfigRegistry::new(
        Config::builder()
            .resolver(resolver_fn(move |endpoint, _, _| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    Ok::<_, ResolveError>(json!({ "endpoint": endpoint }))
                }
            }))
            .build(),
    );
    let scope = CacheScope::with_store(MokaStore::builder(100).build());

    let controllers: Vec<_> = (0..4)
        .map(|_| {
            RequestController::builder(Descriptor::new("/items"), registry.clone())
                .scope(&scope)
                .build()
        })
        .collect();
    futures::future::join_all(controllers.iter().map(|controller| controller.activate())).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    for controller in &controllers {
        assert_eq!(controller.state().response, Some(json!({ "endpoint": "/items" })));
    }
    assert!(
        scope
            .store()
            .get(&CacheKey::new("/items"))
            .is_some_and(|entry| !entry.is_pending())
    );
}
