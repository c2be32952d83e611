//! Request lifecycle controller.
//!
//! A [`RequestController`] drives one request through
//! `idle -> loading -> settled(response | error)` and publishes every
//! transition as a [`LifecycleState`]. Resolutions go through the scope's
//! store, so controllers sharing a scope and a cache key share one resolver
//! call.
//!
//! Every run takes a generation token. Tearing the controller down, or
//! starting a newer run, invalidates the token; continuations holding an
//! invalidated token apply nothing and fire no hooks.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use accio_core::{CacheKey, Descriptor, KeyDeriver, ResolveError, Resolver};
use accio_store::{CacheEntry, CacheScope, CacheStore, Subscription};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{Notify, watch};
use tracing::{debug, warn};

use crate::concurrency::coalesce;
use crate::config::{ConfigRegistry, Preparator, Processor, SharedResolver};
use crate::hooks::Hooks;
use crate::state::{LifecycleState, PreloadStatus, Trigger};

/// Projection of a descriptor compared by [`RequestController::update`].
pub type RefetchKey = Arc<dyn Fn(&Descriptor) -> Value + Send + Sync>;

/// Drives the lifecycle of one request.
///
/// Cheap to clone; clones control the same request.
pub struct RequestController<Res> {
    inner: Arc<Inner<Res>>,
}

impl<Res> Clone for RequestController<Res> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<Res> fmt::Debug for RequestController<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestController")
            .field("descriptor", &*self.inner.read_descriptor())
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .field("torn_down", &self.inner.torn_down.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

pub(crate) struct Inner<Res> {
    descriptor: RwLock<Descriptor>,
    registry: ConfigRegistry<Res>,
    store: Option<Weak<dyn CacheStore<Res>>>,
    resolver: Option<SharedResolver<Res>>,
    hooks: Hooks<Res>,
    key_deriver: KeyDeriver,
    prepare: Option<Preparator>,
    process: Option<Processor<Res>>,
    refetch_key: Option<RefetchKey>,
    state: watch::Sender<LifecycleState<Res>>,
    generation: AtomicU64,
    torn_down: AtomicBool,
    cancel_timer: Notify,
}

impl<Res> RequestController<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Creates a [`ControllerBuilder`] for `descriptor`, falling back to the
    /// defaults held by `registry`.
    pub fn builder(descriptor: Descriptor, registry: ConfigRegistry<Res>) -> ControllerBuilder<Res> {
        ControllerBuilder::new(descriptor, registry)
    }

    /// Runs the request once unless the descriptor is deferred.
    pub async fn activate(&self) {
        let deferred = self.inner.read_descriptor().control.defer;
        if deferred {
            debug!(endpoint = %self.inner.read_descriptor().endpoint, "deferred, waiting for trigger");
            return;
        }
        self.inner.do_work().await;
    }

    /// Runs the request once with the latest descriptor.
    pub async fn trigger(&self) {
        self.inner.do_work().await;
    }

    /// Resolves the request through the store without touching the
    /// lifecycle state.
    ///
    /// The store lookup happens when this is called, not when the returned
    /// future is first polled.
    pub fn fetch(&self) -> Subscription<Res> {
        self.inner.do_fetch()
    }

    /// Resolves the request ahead of time so a later run reads it from the
    /// store.
    ///
    /// Returns the resolved value on success. Returns `None` when no store is
    /// available, when the request is already preloaded or preloading, and
    /// when the attempt fails; a failed attempt allows one more.
    pub async fn preload(&self) -> Option<Res> {
        self.inner.preload().await
    }

    /// Replaces the descriptor, re-running the request when the configured
    /// refetch key differs between the old and the new descriptor.
    pub async fn update(&self, descriptor: Descriptor) {
        // The refetch key may read the controller, so it runs without the lock.
        let refetch = match &self.inner.refetch_key {
            Some(refetch_key) => refetch_key(&self.descriptor()) != refetch_key(&descriptor),
            None => false,
        };
        *self.inner.write_descriptor() = descriptor;
        if refetch {
            debug!(endpoint = %self.inner.read_descriptor().endpoint, "refetch key changed");
            self.inner.do_work().await;
        }
    }

    /// Stops the controller: cancels a pending loading timer and discards the
    /// outcome of every run still in flight.
    pub fn teardown(&self) {
        self.inner.torn_down.store(true, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.cancel_timer.notify_waiters();
    }

    /// Returns `true` once [`teardown`](Self::teardown) was called.
    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    /// Returns the cache key of the current descriptor.
    pub fn cache_key(&self) -> CacheKey {
        self.inner.cache_key(&self.inner.read_descriptor())
    }

    /// Returns a copy of the current descriptor.
    pub fn descriptor(&self) -> Descriptor {
        self.inner.read_descriptor().clone()
    }

    /// Returns a snapshot of the lifecycle state.
    pub fn state(&self) -> LifecycleState<Res> {
        self.inner.state.borrow().clone()
    }

    /// Projects the current lifecycle state for a view.
    pub fn render<T, F>(&self, projection: F) -> T
    where
        F: FnOnce(&LifecycleState<Res>) -> T,
    {
        projection(&self.inner.state.borrow())
    }

    /// Subscribes to lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState<Res>> {
        self.inner.state.subscribe()
    }

    /// Returns a handle re-running this request.
    pub fn trigger_handle(&self) -> Trigger<Res> {
        Trigger(Arc::downgrade(&self.inner))
    }
}

impl<Res> Inner<Res> {
    fn read_descriptor(&self) -> std::sync::RwLockReadGuard<'_, Descriptor> {
        self.descriptor.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_descriptor(&self) -> std::sync::RwLockWriteGuard<'_, Descriptor> {
        self.descriptor.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self) -> Option<Arc<dyn CacheStore<Res>>> {
        self.store.as_ref().and_then(Weak::upgrade)
    }

    fn cache_key(&self, descriptor: &Descriptor) -> CacheKey {
        self.key_deriver.derive(&descriptor.endpoint, &descriptor.options)
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.torn_down.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Applies `update` to the state unless `generation` was superseded.
    fn apply<F>(&self, generation: u64, update: F) -> bool
    where
        F: FnOnce(&mut LifecycleState<Res>),
    {
        if !self.is_current(generation) {
            debug!(generation, "discarding stale continuation");
            return false;
        }
        self.state.send_modify(update);
        true
    }
}

impl<Res> Inner<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Resolves the current descriptor through the store.
    fn do_fetch(&self) -> Subscription<Res> {
        let descriptor = self.read_descriptor().clone();
        let key = self.cache_key(&descriptor);
        let Descriptor {
            endpoint,
            control,
            mut options,
            context,
        } = descriptor;

        options.method.get_or_insert_with(|| self.registry.method());
        let prepare = self.prepare.clone().or_else(|| self.registry.preparator());
        if let Some(prepare) = prepare {
            options.body = options.body.take().map(|body| prepare(body));
        }

        let resolver = self
            .resolver
            .clone()
            .unwrap_or_else(|| self.registry.resolver());
        let resolve = move || -> Subscription<Res> {
            async move { resolver.resolve(&endpoint, &options, &context).await }.boxed()
        };

        coalesce(self.store(), key, control.ignore_cache, resolve)
    }

    fn process(&self, value: Res) -> Res {
        match self.process.clone().or_else(|| self.registry.processor()) {
            Some(process) => process(value),
            None => value,
        }
    }

    fn raise_loading(&self, generation: u64) {
        if self.apply(generation, |state| state.loading = true) {
            self.hooks.show_loading();
        }
    }

    fn complete(&self, generation: u64, value: Res) {
        let response = self.process(value);
        let applied = self.apply(generation, |state| {
            state.loading = false;
            state.response = Some(response.clone());
            state.error = None;
            state.preload_error = None;
        });
        if applied {
            self.hooks.complete(&response);
        }
    }

    fn fail(&self, generation: u64, error: ResolveError) {
        let applied = self.apply(generation, |state| {
            state.loading = false;
            state.error = Some(error.clone());
            state.preload_error = None;
        });
        if applied {
            self.hooks.error(&error);
        }
    }

    /// Returns the settled value stored for a preloaded request.
    fn preloaded(&self) -> Option<Res> {
        if self.state.borrow().preload_status != PreloadStatus::Preloaded {
            return None;
        }
        let store = self.store()?;
        let key = self.cache_key(&self.read_descriptor());
        store.get(&key).and_then(CacheEntry::into_settled)
    }

    pub(crate) async fn do_work(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(value) = self.preloaded() {
            debug!(generation, "serving preloaded response");
            self.complete(generation, value);
            return;
        }

        let timeout = self.read_descriptor().control.timeout;
        self.hooks.start_fetching();
        let mut fetch = self.do_fetch();

        let outcome = match timeout {
            None => {
                self.raise_loading(generation);
                fetch.await
            }
            Some(delay) => {
                tokio::select! {
                    biased;
                    outcome = &mut fetch => outcome,
                    _ = tokio::time::sleep(delay) => {
                        self.raise_loading(generation);
                        fetch.await
                    }
                    _ = self.cancel_timer.notified() => fetch.await,
                }
            }
        };

        match outcome {
            Ok(value) => self.complete(generation, value),
            Err(error) => self.fail(generation, error),
        }
    }

    async fn preload(&self) -> Option<Res> {
        if self.store().is_none() {
            warn!(
                endpoint = %self.read_descriptor().endpoint,
                "preload requested without a cache store, ignoring"
            );
            return None;
        }

        let started = self.state.send_if_modified(|state| {
            if state.preload_status < PreloadStatus::Preloading {
                state.preload_status = PreloadStatus::Preloading;
                true
            } else {
                false
            }
        });
        if !started {
            return None;
        }

        let outcome = self.do_fetch().await;
        if self.torn_down.load(Ordering::SeqCst) {
            return outcome.ok();
        }
        match outcome {
            Ok(value) => {
                self.state.send_modify(|state| {
                    state.preload_status = PreloadStatus::Preloaded;
                    state.preload_error = None;
                });
                Some(value)
            }
            Err(error) => {
                debug!(%error, "preload failed");
                self.state.send_modify(|state| {
                    state.preload_status = PreloadStatus::PreloadError;
                    state.preload_error = Some(error);
                });
                None
            }
        }
    }
}

/// Builder for [`RequestController`].
pub struct ControllerBuilder<Res> {
    descriptor: Descriptor,
    registry: ConfigRegistry<Res>,
    store: Option<Weak<dyn CacheStore<Res>>>,
    resolver: Option<SharedResolver<Res>>,
    hooks: Hooks<Res>,
    key_deriver: KeyDeriver,
    prepare: Option<Preparator>,
    process: Option<Processor<Res>>,
    refetch_key: Option<RefetchKey>,
}

impl<Res> ControllerBuilder<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Creates a builder for an uncached controller.
    pub fn new(descriptor: Descriptor, registry: ConfigRegistry<Res>) -> Self {
        Self {
            descriptor,
            registry,
            store: None,
            resolver: None,
            hooks: Hooks::new(),
            key_deriver: KeyDeriver::default(),
            prepare: None,
            process: None,
            refetch_key: None,
        }
    }

    /// Resolves through the store of `scope`.
    pub fn scope(self, scope: &CacheScope<Res>) -> Self {
        self.store(scope.handle())
    }

    /// Resolves through the store behind `store`.
    pub fn store(mut self, store: Weak<dyn CacheStore<Res>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the registry's resolver for this controller.
    pub fn resolver<R>(mut self, resolver: R) -> Self
    where
        R: Resolver<Res> + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets the lifecycle hooks.
    pub fn hooks(mut self, hooks: Hooks<Res>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets how cache keys are derived.
    pub fn key_deriver(mut self, key_deriver: KeyDeriver) -> Self {
        self.key_deriver = key_deriver;
        self
    }

    /// Overrides the registry's request body transform for this controller.
    pub fn prepare<F>(mut self, prepare: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.prepare = Some(Arc::new(prepare));
        self
    }

    /// Overrides the registry's response transform for this controller.
    pub fn process<F>(mut self, process: F) -> Self
    where
        F: Fn(Res) -> Res + Send + Sync + 'static,
    {
        self.process = Some(Arc::new(process));
        self
    }

    /// Re-runs the request on [`update`](RequestController::update) whenever
    /// `refetch_key` maps the old and new descriptors to different values.
    pub fn refetch_key<F>(mut self, refetch_key: F) -> Self
    where
        F: Fn(&Descriptor) -> Value + Send + Sync + 'static,
    {
        self.refetch_key = Some(Arc::new(refetch_key));
        self
    }

    /// Builds the controller. Nothing is fetched until it is activated or
    /// triggered.
    pub fn build(self) -> RequestController<Res> {
        let inner = Arc::new_cyclic(|this: &Weak<Inner<Res>>| Inner {
            descriptor: RwLock::new(self.descriptor),
            registry: self.registry,
            store: self.store,
            resolver: self.resolver,
            hooks: self.hooks,
            key_deriver: self.key_deriver,
            prepare: self.prepare,
            process: self.process,
            refetch_key: self.refetch_key,
            state: watch::Sender::new(LifecycleState::new(Trigger(this.clone()))),
            generation: AtomicU64::new(0),
            torn_down: AtomicBool::new(false),
            cancel_timer: Notify::new(),
        });
        RequestController { inner }
    }
}
