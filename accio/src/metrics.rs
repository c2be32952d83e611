//! Metrics declaration and recording helpers.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

use std::time::Duration;

#[cfg(feature = "metrics")]
lazy_static! {
    // Coalescing metrics

    /// Track number of lookups answered by a stored entry.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "accio_cache_hit_total",
            "Total number of lookups answered by a stored entry, pending or settled."
        );
        "accio_cache_hit_total"
    };
    /// Track number of lookups that started a resolution.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "accio_cache_miss_total",
            "Total number of lookups that started a resolution."
        );
        "accio_cache_miss_total"
    };
    /// Track number of resolutions that skipped the store.
    pub static ref CACHE_BYPASS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "accio_cache_bypass_total",
            "Total number of resolutions that skipped the store."
        );
        "accio_cache_bypass_total"
    };
    /// Track number of entries removed after a failed resolution.
    pub static ref CACHE_EVICTED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "accio_cache_evicted_total",
            "Total number of entries removed after a failed resolution."
        );
        "accio_cache_evicted_total"
    };

    // Latency metrics

    /// Histogram of resolver call duration.
    pub static ref RESOLVE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "accio_resolve_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of resolver calls in seconds."
        );
        "accio_resolve_duration_seconds"
    };
}

/// Outcome of a store lookup, used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// An entry was stored under the key.
    Hit,
    /// The key was vacant and a resolution was started.
    Miss,
    /// The store was absent or skipped.
    Bypass,
    /// A failed resolution removed its entry.
    Evicted,
}

/// Record a store lookup outcome for the store named `store`.
///
/// When the `metrics` feature is disabled, this function is a no-op.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_lookup(outcome: LookupOutcome, store: &str) {
    let name = match outcome {
        LookupOutcome::Hit => *CACHE_HIT_COUNTER,
        LookupOutcome::Miss => *CACHE_MISS_COUNTER,
        LookupOutcome::Bypass => *CACHE_BYPASS_COUNTER,
        LookupOutcome::Evicted => *CACHE_EVICTED_COUNTER,
    };
    metrics::counter!(name, "store" => store.to_string()).increment(1);
}

/// Record a store lookup outcome for the store named `store`.
///
/// When the `metrics` feature is disabled, this function is a no-op.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_lookup(_outcome: LookupOutcome, _store: &str) {}

/// Record the duration of one resolver call.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_resolve(duration: Duration, success: bool) {
    let status = if success { "ok" } else { "error" };
    metrics::histogram!(*RESOLVE_DURATION, "status" => status).record(duration.as_secs_f64());
}

/// Record the duration of one resolver call.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_resolve(_duration: Duration, _success: bool) {}
