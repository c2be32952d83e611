//! Error types shared by resolvers and controllers.

use std::error::Error as StdError;
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

/// Boxed error shared between every subscriber of a failed resolution.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Failure reported by a [`Resolver`](crate::Resolver).
///
/// The orchestration core never interprets these variants. They are carried
/// verbatim into the `on_error` hook and the lifecycle state.
///
/// The type is `Clone` because a single failed resolution fans out to every
/// caller that was coalesced onto it.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The transport call itself failed (connection refused, DNS, ...).
    #[error("network error: {0}")]
    Transport(SharedError),

    /// The transport succeeded but reported a non-success status.
    #[error("unexpected response status {status}")]
    Status {
        /// Status code returned by the remote side.
        status: u16,
    },

    /// The response body could not be parsed.
    #[error("error parsing response: {0}")]
    Parse(SharedError),

    /// Any other resolver-defined failure.
    #[error("{0}")]
    Message(SmolStr),
}

impl ResolveError {
    /// Wraps a transport failure.
    pub fn transport<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Transport(Arc::new(error))
    }

    /// Wraps a body parsing failure.
    pub fn parse<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Parse(Arc::new(error))
    }

    /// Creates a free-form resolver failure.
    pub fn message(message: impl AsRef<str>) -> Self {
        Self::Message(SmolStr::new(message))
    }
}

/// Method outside of the supported `GET`/`POST` set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid method {0}, only GET & POST are supported")]
pub struct UnsupportedMethod(pub SmolStr);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_source() {
        let error = ResolveError::transport(std::io::Error::other("connection reset"));
        let clone = error.clone();
        match (&error, &clone) {
            (ResolveError::Transport(a), ResolveError::Transport(b)) => {
                assert!(Arc::ptr_eq(a, b))
            }
            _ => panic!("expected transport errors"),
        }
        assert_eq!(clone.to_string(), "network error: connection reset");
    }

    #[test]
    fn status_message() {
        let error = ResolveError::Status { status: 503 };
        assert_eq!(error.to_string(), "unexpected response status 503");
    }
}
