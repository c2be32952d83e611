#![warn(missing_docs)]
//! # accio-core
//!
//! Core traits and types for the accio request orchestration framework.
//!
//! This crate holds the pieces every other accio crate agrees on:
//!
//! - **Describe** a request ([`Descriptor`], [`FetchOptions`], [`ControlOptions`])
//! - **Identify** it for deduplication ([`CacheKey`], [`KeyDeriver`])
//! - **Resolve** it over some transport ([`Resolver`])
//! - **Fail** opaquely ([`ResolveError`])
//!
//! Controllers and stores live in `accio` and `accio-store`; the default
//! HTTP transport lives in `accio-reqwest`.

pub mod error;
pub mod key;
pub mod request;
pub mod resolver;

pub use error::{ResolveError, UnsupportedMethod};
pub use key::{CacheKey, KeyDeriver, KeyDigest, KeySerialization, derive_key};
pub use request::{Context, ControlOptions, Descriptor, FetchOptions, Method};
pub use resolver::{FnResolver, Resolver, resolver_fn};
#[doc(hidden)]
pub use smol_str::SmolStr;
