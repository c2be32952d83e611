//! HTTP resolver for accio built on [`reqwest`].
//!
//! [`HttpResolver`] sends the descriptor's method, headers and JSON body to
//! the endpoint and parses the response body as JSON. Failures map onto
//! [`ResolveError`]:
//!
//! | failure                         | error                       |
//! |---------------------------------|-----------------------------|
//! | request could not be sent       | [`ResolveError::Transport`] |
//! | non-success response status     | [`ResolveError::Status`]    |
//! | body is not valid JSON          | [`ResolveError::Parse`]     |
//!
//! ```no_run
//! use accio::{ConfigRegistry, Descriptor, RequestController};
//!
//! # async fn run() {
//! let registry = ConfigRegistry::new(accio_reqwest::defaults());
//! let controller =
//!     RequestController::builder(Descriptor::new("https://api.example.com/users/1"), registry)
//!         .build();
//! controller.activate().await;
//! # }
//! ```

mod resolver;

pub use resolver::HttpResolver;

use accio::Config;
use serde_json::Value;

pub use accio_core::ResolveError;

/// Defaults using a plain [`HttpResolver`] and `GET` requests.
pub fn defaults() -> Config<Value> {
    Config::builder().resolver(HttpResolver::new()).build()
}
