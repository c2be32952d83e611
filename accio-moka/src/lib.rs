//! Capacity-bounded in-memory cache store for accio.
//!
//! [`MokaStore`] keeps at most a configured number of entries. When the
//! capacity is exceeded the least recently used entries are dropped, and a
//! later lookup of a dropped key is simply a miss. Pending entries can be
//! dropped too; callers already subscribed to them are not affected.
//!
//! ```
//! use accio_moka::MokaStore;
//! use accio_store::CacheScope;
//! use serde_json::Value;
//!
//! let scope: CacheScope<Value> = CacheScope::with_store(MokaStore::builder(1_000).build());
//! # let _ = scope;
//! ```

mod builder;
mod store;

pub use builder::MokaStoreBuilder;
pub use store::MokaStore;
