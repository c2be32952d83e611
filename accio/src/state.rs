//! Lifecycle state published by a controller.

use std::fmt;
use std::sync::Weak;

use accio_core::ResolveError;

use crate::controller::Inner;

/// Preload progress of a controller.
///
/// Ordered so that every status below [`Preloading`](PreloadStatus::Preloading)
/// allows a new preload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum PreloadStatus {
    /// The last preload failed; one more attempt is allowed.
    PreloadError = -1,
    /// No preload was requested.
    #[default]
    Idle = 0,
    /// A preload is outstanding.
    Preloading = 1,
    /// The response is in the store.
    Preloaded = 2,
}

/// Snapshot of one request's lifecycle.
///
/// Written only by the owning controller. `response` survives a later failed
/// run; `error` is cleared by a later successful one.
#[derive(Clone)]
pub struct LifecycleState<Res> {
    /// Whether the loading indicator is visible.
    pub loading: bool,
    /// Last processed response.
    pub response: Option<Res>,
    /// Error of the last run, if it failed.
    pub error: Option<ResolveError>,
    /// Preload progress.
    pub preload_status: PreloadStatus,
    /// Error of the last failed preload. Never reported to the error hook.
    pub preload_error: Option<ResolveError>,
    /// Re-runs the request on the owning controller.
    pub trigger: Trigger<Res>,
}

impl<Res> LifecycleState<Res> {
    pub(crate) fn new(trigger: Trigger<Res>) -> Self {
        Self {
            loading: false,
            response: None,
            error: None,
            preload_status: PreloadStatus::Idle,
            preload_error: None,
            trigger,
        }
    }
}

impl<Res: fmt::Debug> fmt::Debug for LifecycleState<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleState")
            .field("loading", &self.loading)
            .field("response", &self.response)
            .field("error", &self.error)
            .field("preload_status", &self.preload_status)
            .field("preload_error", &self.preload_error)
            .finish_non_exhaustive()
    }
}

/// Handle re-running the request of the controller that published it.
///
/// Does not keep the controller alive; firing it after the controller is
/// dropped does nothing.
pub struct Trigger<Res>(pub(crate) Weak<Inner<Res>>);

impl<Res> Trigger<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Runs the request once, like
    /// [`RequestController::trigger`](crate::RequestController::trigger).
    pub async fn fire(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.do_work().await;
        }
    }
}

impl<Res> Clone for Trigger<Res> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<Res> fmt::Debug for Trigger<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}
