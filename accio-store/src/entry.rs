//! Cache entries: pending handles and settled values.
//!
//! A store never holds failures. An entry is either
//!
//! - [`CacheEntry::Pending`] - an outstanding resolution every caller can
//!   [`subscribe`](InFlight::subscribe) to, or
//! - [`CacheEntry::Settled`] - the resolved value.
//!
//! The transition from pending to settled happens once per resolution. On
//! failure the entry is removed instead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use accio_core::ResolveError;
use futures::future::{BoxFuture, FutureExt, Shared};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Outcome of a resolution.
pub type Resolution<Res> = Result<Res, ResolveError>;

/// Future returned by [`InFlight::subscribe`] and [`CacheEntry::resolve`].
pub type Subscription<Res> = BoxFuture<'static, Resolution<Res>>;

/// Handle to an outstanding resolution shared by every subscriber.
///
/// The wrapped future is driven by whichever subscriber polls it; all
/// subscribers observe the same outcome and the resolver runs once.
pub struct InFlight<Res> {
    id: u64,
    shared: Shared<BoxFuture<'static, Resolution<Res>>>,
}

impl<Res> InFlight<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Wraps `future` into a shareable handle.
    pub fn new(future: BoxFuture<'static, Resolution<Res>>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            shared: future.shared(),
        }
    }

    /// Returns a future resolving to the shared outcome.
    pub fn subscribe(&self) -> Subscription<Res> {
        self.shared.clone().boxed()
    }

    /// Returns the outcome if the resolution already finished.
    pub fn peek(&self) -> Option<&Resolution<Res>> {
        self.shared.peek()
    }
}

impl<Res> InFlight<Res> {
    /// Process-unique identifier of this resolution.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl<Res> Clone for InFlight<Res>
where
    Res: Clone,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            shared: self.shared.clone(),
        }
    }
}

impl<Res> fmt::Debug for InFlight<Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight").field("id", &self.id).finish()
    }
}

/// Value stored under a cache key.
#[derive(Debug)]
pub enum CacheEntry<Res> {
    /// Resolution still outstanding.
    Pending(InFlight<Res>),
    /// Resolved value.
    Settled(Res),
}

impl<Res> Clone for CacheEntry<Res>
where
    Res: Clone,
{
    fn clone(&self) -> Self {
        match self {
            CacheEntry::Pending(handle) => CacheEntry::Pending(handle.clone()),
            CacheEntry::Settled(value) => CacheEntry::Settled(value.clone()),
        }
    }
}

impl<Res> CacheEntry<Res> {
    /// Returns `true` while the resolution is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, CacheEntry::Pending(_))
    }

    /// Returns the settled value, if any.
    pub fn settled(&self) -> Option<&Res> {
        match self {
            CacheEntry::Settled(value) => Some(value),
            CacheEntry::Pending(_) => None,
        }
    }

    /// Consumes the entry and returns the settled value, if any.
    pub fn into_settled(self) -> Option<Res> {
        match self {
            CacheEntry::Settled(value) => Some(value),
            CacheEntry::Pending(_) => None,
        }
    }
}

impl<Res> CacheEntry<Res>
where
    Res: Clone + Send + Sync + 'static,
{
    /// Resolves the entry, subscribing to it when still pending.
    pub fn resolve(self) -> Subscription<Res> {
        match self {
            CacheEntry::Pending(handle) => handle.subscribe(),
            CacheEntry::Settled(value) => futures::future::ready(Ok(value)).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn subscribers_share_one_resolution() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let handle = InFlight::new(
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ResolveError>(7u32)
            }
            .boxed(),
        );
        let entry = CacheEntry::Pending(handle.clone());

        let (a, b) = futures::join!(handle.subscribe(), entry.resolve());

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
        assert!(matches!(handle.peek(), Some(Ok(7))));
    }

    #[tokio::test]
    async fn failure_reaches_every_subscriber() {
        let handle = InFlight::<u32>::new(async { Err(ResolveError::message("boom")) }.boxed());
        let (a, b) = futures::join!(handle.subscribe(), handle.subscribe());
        assert_eq!(a.unwrap_err().to_string(), "boom");
        assert_eq!(b.unwrap_err().to_string(), "boom");
    }

    #[tokio::test]
    async fn settled_resolves_immediately() {
        let entry = CacheEntry::Settled("cached");
        assert!(!entry.is_pending());
        assert_eq!(entry.settled(), Some(&"cached"));
        assert_eq!(entry.resolve().await.unwrap(), "cached");
    }

    #[test]
    fn ids_are_unique() {
        let a = InFlight::<u8>::new(async { Ok(1) }.boxed());
        let b = InFlight::<u8>::new(async { Ok(1) }.boxed());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
