//! Request descriptor types.
//!
//! A [`Descriptor`] is split in two statically declared halves:
//!
//! - [`ControlOptions`] - fields steering the controller (`defer`,
//!   `ignore_cache` or `ignoreCache`, `timeout`). They never reach the
//!   resolver. A `timeout` is either a duration string or a number of
//!   milliseconds.
//! - [`FetchOptions`] - transport fields forwarded to the resolver
//!   (`method`, `body`, `headers` and any extra pass-through field).
//!
//! The `context` is opaque metadata handed to the resolver untouched. It is
//! not part of the cache key.
//!
//! Descriptors deserialize from YAML or JSON:
//!
//! ```
//! use accio_core::{Descriptor, Method};
//! use std::time::Duration;
//!
//! let descriptor: Descriptor = serde_json::from_str(r#"{
//!     "endpoint": "/fetch/foo",
//!     "method": "POST",
//!     "body": {"id": 42},
//!     "timeout": "150ms",
//!     "mode": "cors"
//! }"#).unwrap();
//!
//! assert_eq!(descriptor.options.method, Some(Method::Post));
//! assert_eq!(descriptor.control.timeout, Some(Duration::from_millis(150)));
//! assert_eq!(descriptor.options.extra["mode"], "cors");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::error::UnsupportedMethod;

/// Opaque metadata passed through to the resolver.
pub type Context = Value;

/// Request method supported by the defaults registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Returns the method as an upper-case string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(UnsupportedMethod(SmolStr::new(other))),
        }
    }
}

/// Transport options forwarded to the resolver.
///
/// Only `body` takes part in cache key derivation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Request method. Filled from the defaults registry when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    /// Request payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Any other transport-specific field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FetchOptions {
    /// Returns the payload when one is present.
    ///
    /// JSON `null` counts as no payload.
    pub fn payload(&self) -> Option<&Value> {
        self.body.as_ref().filter(|body| !body.is_null())
    }
}

/// Options steering the controller itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlOptions {
    /// Do not run on activation, wait for an explicit trigger.
    #[serde(default)]
    pub defer: bool,
    /// Bypass the cache store for this request.
    #[serde(default, alias = "ignoreCache")]
    pub ignore_cache: bool,
    /// Delay before the loading signal is raised (e.g., "150ms", "1s", or
    /// `150` milliseconds).
    #[serde(
        default,
        serialize_with = "humantime_serde::serialize",
        deserialize_with = "timeout::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

mod timeout {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timeout {
        Millis(u64),
        Human(#[serde(with = "humantime_serde")] Duration),
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Timeout>::deserialize(deserializer)?.map(|timeout| match timeout {
            Timeout::Millis(millis) => Duration::from_millis(millis),
            Timeout::Human(duration) => duration,
        }))
    }
}

/// Immutable description of one logical request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Endpoint identity, usually a URL or a path.
    pub endpoint: SmolStr,
    /// Control fields. Declared before `options` so they are claimed first
    /// when deserializing from a flat map.
    #[serde(flatten)]
    pub control: ControlOptions,
    /// Pass-through transport fields.
    #[serde(flatten)]
    pub options: FetchOptions,
    /// Opaque resolver metadata.
    #[serde(default = "empty_context")]
    pub context: Context,
}

fn empty_context() -> Context {
    Value::Object(Map::new())
}

impl Descriptor {
    /// Creates a descriptor for `endpoint` with default options.
    pub fn new(endpoint: impl AsRef<str>) -> Self {
        Self {
            endpoint: SmolStr::new(endpoint),
            control: ControlOptions::default(),
            options: FetchOptions::default(),
            context: empty_context(),
        }
    }

    /// Sets the request payload.
    pub fn body(mut self, body: Value) -> Self {
        self.options.body = Some(body);
        self
    }

    /// Sets the request method.
    pub fn method(mut self, method: Method) -> Self {
        self.options.method = Some(method);
        self
    }

    /// Adds a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the resolver context.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Marks the request as deferred.
    pub fn defer(mut self, defer: bool) -> Self {
        self.control.defer = defer;
        self
    }

    /// Bypasses the cache store.
    pub fn ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.control.ignore_cache = ignore_cache;
        self
    }

    /// Delays the loading signal by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.control.timeout = Some(timeout);
        self
    }
}
