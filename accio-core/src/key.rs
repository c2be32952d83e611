//! Cache key types and derivation.
//!
//! A cache key is the sole identity used to deduplicate requests. It is
//! derived from the endpoint and, when present, the serialized payload:
//!
//! ```
//! use accio_core::{FetchOptions, derive_key};
//! use serde_json::json;
//!
//! let options = FetchOptions {
//!     body: Some(json!({"id": 42})),
//!     ..FetchOptions::default()
//! };
//! assert_eq!(derive_key("/users", &options).as_str(), r#"/users{"id":42}"#);
//!
//! // No payload: the endpoint alone.
//! assert_eq!(derive_key("/users", &FetchOptions::default()).as_str(), "/users");
//! ```
//!
//! Headers, method, extra transport fields and the resolver context never
//! take part in the key. Two requests differing only in those fields share
//! one cache entry.
//!
//! ## Field order
//!
//! [`KeySerialization::Insertion`] (the default) serializes objects in the
//! order their fields were inserted, so `{"a":1,"b":2}` and `{"b":2,"a":1}`
//! produce different keys. [`KeySerialization::Canonical`] sorts object keys
//! recursively and makes both collide.
//!
//! ## Digests
//!
//! [`KeyDigest::Sha256`] replaces the plain key with its hex-encoded SHA-256
//! digest, keeping keys short for large payloads.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::request::FetchOptions;

/// A cache key identifying one logical request.
///
/// `CacheKey` wraps its string in [`Arc`], making `clone()` an O(1)
/// operation. Keys are cloned into every in-flight handle and store write.
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<str>,
}

impl CacheKey {
    /// Creates a key from an already derived string.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self {
            inner: Arc::from(key.as_ref()),
        }
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

/// How payload objects are serialized into the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeySerialization {
    /// Object fields in insertion order.
    #[default]
    Insertion,
    /// Object fields sorted by name, recursively.
    Canonical,
}

/// Final encoding of the derived key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDigest {
    /// Endpoint followed by the serialized payload.
    #[default]
    Plain,
    /// Hex-encoded SHA-256 of the plain key.
    Sha256,
}

/// Pure function from `(endpoint, options)` to [`CacheKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDeriver {
    serialization: KeySerialization,
    digest: KeyDigest,
}

impl KeyDeriver {
    /// Creates a deriver with the given modes.
    pub const fn new(serialization: KeySerialization, digest: KeyDigest) -> Self {
        Self {
            serialization,
            digest,
        }
    }

    /// Returns a copy using `serialization`.
    pub const fn serialization(self, serialization: KeySerialization) -> Self {
        Self {
            serialization,
            ..self
        }
    }

    /// Returns a copy using `digest`.
    pub const fn digest(self, digest: KeyDigest) -> Self {
        Self { digest, ..self }
    }

    /// Derives the cache key for `endpoint` and `options`.
    pub fn derive(&self, endpoint: &str, options: &FetchOptions) -> CacheKey {
        let mut key = String::from(endpoint);
        if let Some(payload) = options.payload() {
            match self.serialization {
                KeySerialization::Insertion => key.push_str(&payload.to_string()),
                KeySerialization::Canonical => key.push_str(&canonicalize(payload).to_string()),
            }
        }
        match self.digest {
            KeyDigest::Plain => CacheKey::new(key),
            KeyDigest::Sha256 => CacheKey::new(hex::encode(Sha256::digest(key.as_bytes()))),
        }
    }
}

/// Derives a key with the default [`KeyDeriver`].
pub fn derive_key(endpoint: &str, options: &FetchOptions) -> CacheKey {
    KeyDeriver::default().derive(endpoint, options)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
