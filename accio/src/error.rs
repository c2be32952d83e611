//! Configuration error types.

use smol_str::SmolStr;
use thiserror::Error;

pub use accio_core::{ResolveError, UnsupportedMethod};

/// Error returned by a rejected defaults assignment.
///
/// A rejected assignment never modifies the registry: the previous value
/// stays in effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The value assigned to a field has the wrong runtime type.
    #[error(
        "expected {field} to be a {expected}, but instead got {found}. \
         Check your {field} assignment to accio defaults"
    )]
    InvalidType {
        /// Field being assigned.
        field: SmolStr,
        /// Expected kind of value.
        expected: &'static str,
        /// Kind of value actually assigned.
        found: &'static str,
    },

    /// The assigned method is outside of the supported set.
    #[error("{0}. Check your method assignment to accio defaults")]
    UnsupportedMethod(#[from] UnsupportedMethod),
}
