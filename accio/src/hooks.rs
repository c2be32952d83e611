//! Lifecycle hooks.

use std::fmt;
use std::sync::Arc;

use accio_core::ResolveError;

type Notify = Arc<dyn Fn() + Send + Sync>;
type OnComplete<Res> = Arc<dyn Fn(&Res) + Send + Sync>;
type OnError = Arc<dyn Fn(&ResolveError) + Send + Sync>;

/// Host callbacks fired at lifecycle transitions.
///
/// Every hook is optional. During one `do_work` run they fire in this order:
/// start-fetching, then show-loading (unless the request settles before its
/// loading timeout), then exactly one of complete or error. Hooks are never
/// fired for a run that was superseded or torn down.
pub struct Hooks<Res> {
    on_start_fetching: Option<Notify>,
    on_show_loading: Option<Notify>,
    on_complete: Option<OnComplete<Res>>,
    on_error: Option<OnError>,
}

impl<Res> Hooks<Res> {
    /// Creates an empty set of hooks.
    pub fn new() -> Self {
        Self {
            on_start_fetching: None,
            on_show_loading: None,
            on_complete: None,
            on_error: None,
        }
    }

    /// Fired before the resolver is invoked.
    pub fn on_start_fetching<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_start_fetching = Some(Arc::new(hook));
        self
    }

    /// Fired when the loading indicator should become visible.
    pub fn on_show_loading<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_show_loading = Some(Arc::new(hook));
        self
    }

    /// Fired with the processed response after a successful run.
    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Res) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(hook));
        self
    }

    /// Fired with the resolver error after a failed run.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ResolveError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn start_fetching(&self) {
        if let Some(hook) = &self.on_start_fetching {
            tracing::trace!("firing start-fetching hook");
            hook();
        }
    }

    pub(crate) fn show_loading(&self) {
        if let Some(hook) = &self.on_show_loading {
            tracing::trace!("firing show-loading hook");
            hook();
        }
    }

    pub(crate) fn complete(&self, response: &Res) {
        if let Some(hook) = &self.on_complete {
            tracing::trace!("firing complete hook");
            hook(response);
        }
    }

    pub(crate) fn error(&self, error: &ResolveError) {
        if let Some(hook) = &self.on_error {
            tracing::trace!(%error, "firing error hook");
            hook(error);
        }
    }
}

impl<Res> Default for Hooks<Res> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Res> Clone for Hooks<Res> {
    fn clone(&self) -> Self {
        Self {
            on_start_fetching: self.on_start_fetching.clone(),
            on_show_loading: self.on_show_loading.clone(),
            on_complete: self.on_complete.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<Res> fmt::Debug for Hooks<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_start_fetching", &self.on_start_fetching.is_some())
            .field("on_show_loading", &self.on_show_loading.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
