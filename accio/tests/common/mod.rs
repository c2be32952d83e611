//! Shared test resolver and helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use accio::{
    Config, ConfigRegistry, Context, FetchOptions, Hooks, ResolveError, Resolver,
};
use async_trait::async_trait;
use serde_json::{Value, json};

/// Resolver recording every call, with a configurable delay and failure mode.
///
/// Cheap to clone: clones share the call log.
#[derive(Clone)]
pub struct MockResolver {
    inner: Arc<MockState>,
}

struct MockState {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    response: Mutex<Value>,
    requests: Mutex<Vec<(String, FetchOptions, Context)>>,
}

impl MockResolver {
    /// Resolves every request to `{"foo": "bar"}`.
    pub fn new() -> Self {
        Self::responding(json!({ "foo": "bar" }))
    }

    pub fn responding(response: Value) -> Self {
        Self {
            inner: Arc::new(MockState {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
                delay: Mutex::new(None),
                response: Mutex::new(response),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.inner.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_response(&self, response: Value) {
        *self.inner.response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, FetchOptions, Context)> {
        self.inner.requests.lock().unwrap().clone()
    }

    /// Registry using this resolver as the default.
    pub fn registry(&self) -> ConfigRegistry<Value> {
        ConfigRegistry::new(Config::builder().resolver(self.clone()).build())
    }
}

#[async_trait]
impl Resolver<Value> for MockResolver {
    async fn resolve(
        &self,
        endpoint: &str,
        options: &FetchOptions,
        context: &Context,
    ) -> Result<Value, ResolveError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .requests
            .lock()
            .unwrap()
            .push((endpoint.to_owned(), options.clone(), context.clone()));

        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(ResolveError::message("resolver failed"));
        }
        Ok(self.inner.response.lock().unwrap().clone())
    }
}

/// Ordered record of fired hooks.
#[derive(Clone, Default)]
pub struct HookLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl HookLog {
    pub fn hooks(&self) -> Hooks<Value> {
        let start = self.clone();
        let loading = self.clone();
        let complete = self.clone();
        let error = self.clone();
        Hooks::new()
            .on_start_fetching(move || start.push("start"))
            .on_show_loading(move || loading.push("loading"))
            .on_complete(move |response: &Value| complete.push(format!("complete {response}")))
            .on_error(move |err: &ResolveError| error.push(format!("error {err}")))
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("accio=debug")
        .with_test_writer()
        .try_init();
}
