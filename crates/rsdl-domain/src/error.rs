//! Domain error types for batched loading.

use thiserror::Error;

/// Errors delivered to callers awaiting a batched load.
///
/// Every waiter of a failed batch receives its own copy of the error, so the
/// type is `Clone`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// The fetched items did not cover every requested key.
    #[error("could not find {} for {loader}", .keys.join(", "))]
    MissingKeys { loader: String, keys: Vec<String> },

    /// The batch function broke the one-value-per-key contract.
    #[error("batch function returned {actual} values for {expected} keys")]
    LengthMismatch { expected: usize, actual: usize },

    /// The batch function itself failed.
    #[error("fetch failed: {message}")]
    Fetch { message: String },

    /// The batch function panicked. Only that batch fails.
    #[error("batch function panicked: {message}")]
    Panicked { message: String },

    /// The batch completed without a value for the key.
    #[error("batch produced no value for the key")]
    NoValue,
}

impl LoadError {
    /// Creates a fetch error from anything displayable.
    pub fn fetch(message: impl std::fmt::Display) -> Self {
        LoadError::Fetch {
            message: message.to_string(),
        }
    }
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;
