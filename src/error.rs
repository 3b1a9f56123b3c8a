//! Error types for batch-fetch
//!
//! This module provides the error handling for the library:
//! - [`FetchError`] - failure of the bundled HTTP collaborator for a single id
//! - [`BatchError`] - failure of a whole batch (abort on first error, or cancellation)
//! - [`Error`] - crate-level errors for configuration and setup

use thiserror::Error;

/// Result type alias for batch-fetch setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batch-fetch
///
/// Covers everything that can go wrong outside of running a batch: loading and
/// validating configuration, and building the HTTP collaborator.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_in_flight")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network client could not be built
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Base URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Build a [`Error::Config`] for the given key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Failure reported by [`HttpJsonFetcher`](crate::http::HttpJsonFetcher) for one id
///
/// The runner never inspects these; they are carried unchanged inside
/// [`BatchError::Aborted`] or [`Outcome::Failure`](crate::types::Outcome::Failure).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("request for {id} returned HTTP {status}")]
    Status {
        /// The id whose request failed
        id: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body was not the expected JSON
    #[error("failed to decode response for {id}: {source}")]
    Decode {
        /// The id whose response could not be decoded
        id: String,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// HTTP status code if the failure carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Failure of a whole batch
///
/// Returned by the abort-on-first-error policies and by any policy whose run was
/// cancelled. `E` is the collaborator's error type, passed through unmodified.
#[derive(Debug, Error)]
pub enum BatchError<E> {
    /// An item failed and the batch stopped
    ///
    /// For sequential policies, items after `index` were never dispatched. For the
    /// concurrent policy, items still in flight were dropped without being awaited.
    #[error("batch aborted at item {index} (id {id}): {source}")]
    Aborted {
        /// Position of the failing item in the input sequence
        index: usize,
        /// Display form of the failing id
        id: String,
        /// Number of items dispatched before the batch stopped
        attempted: usize,
        /// The collaborator error, unmodified
        source: E,
    },

    /// The run was cancelled through its cancellation token
    #[error("batch cancelled after {completed} of {total} items")]
    Cancelled {
        /// Items that had finished (successfully or not) when the run stopped
        completed: usize,
        /// Items in the batch
        total: usize,
    },
}

impl<E> BatchError<E> {
    /// Input position of the failing item, if the batch aborted
    pub fn index(&self) -> Option<usize> {
        match self {
            BatchError::Aborted { index, .. } => Some(*index),
            BatchError::Cancelled { .. } => None,
        }
    }

    /// The collaborator error that aborted the batch
    pub fn source_error(&self) -> Option<&E> {
        match self {
            BatchError::Aborted { source, .. } => Some(source),
            BatchError::Cancelled { .. } => None,
        }
    }

    /// Consume the error, returning the collaborator error if there is one
    pub fn into_source(self) -> Option<E> {
        match self {
            BatchError::Aborted { source, .. } => Some(source),
            BatchError::Cancelled { .. } => None,
        }
    }

    /// Returns true if the run was cancelled rather than aborted
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchError::Cancelled { .. })
    }
}
