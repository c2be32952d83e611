#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Request coalescing through a cache store.
///
/// [`coalesce`](concurrency::coalesce) stores one pending entry per key so
/// concurrent lookups share a single resolver call, replaces it with the
/// settled value on success and removes it on failure.
pub mod concurrency;

/// Defaults registry.
///
/// Defines [`Config`], its typestate [`ConfigBuilder`] and the shared
/// [`ConfigRegistry`] handle with validated assignment.
pub mod config;

/// Request lifecycle controller.
pub mod controller;

/// Error types.
///
/// Re-exports [`ResolveError`] and defines [`ConfigError`] for rejected
/// defaults assignments.
pub mod error;

/// Lifecycle hooks fired by controllers.
pub mod hooks;

/// Metrics collection for coalescing observability.
///
/// When the `metrics` feature is enabled, this module provides counters for
/// cache hits, misses, bypasses and evictions and a histogram of resolver
/// call durations.
pub mod metrics;

/// Lifecycle state and preload status.
pub mod state;

pub use config::{
    Config, ConfigBuilder, ConfigRegistry, DefaultValue, NotSet, Preparator, Processor,
    SharedResolver,
};
pub use controller::{ControllerBuilder, RefetchKey, RequestController};
pub use error::ConfigError;
pub use hooks::Hooks;
pub use state::{LifecycleState, PreloadStatus, Trigger};

pub use accio_core::{
    CacheKey, Context, ControlOptions, Descriptor, FetchOptions, KeyDeriver, KeyDigest,
    KeySerialization, Method, ResolveError, Resolver, UnsupportedMethod, derive_key, resolver_fn,
};
pub use accio_store::{
    CacheEntry, CacheScope, CacheStore, DeleteStatus, InFlight, MemoryStore, ScopeError,
    StorageKind,
};
