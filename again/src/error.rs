//! Retry error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Terminal outcomes of a retried request.
///
/// Every variant except [`RetryError::Retry`] is returned from a send. `Retry`
/// only reaches the notify hook, describing the failure that is about to be
/// retried.
#[derive(Debug, Error)]
pub enum RetryError {
    /// The request could not be built, so no attempt was made.
    #[error("failed to build request: {0}")]
    Build(#[source] reqwest::Error),

    /// The request body could not be read before the first attempt.
    #[error("failed to cache request body: {0}")]
    BodyCapture(#[source] reqwest::Error),

    /// The wrapped transport failed to perform an attempt.
    #[error("non-retryable error: {0}")]
    Transport(#[source] anyhow::Error),

    /// Error status outside the whitelist.
    #[error("non-retryable error: {}", status_text(.status))]
    NonRetryable {
        /// Status of the rejected response.
        status: StatusCode,
    },

    /// A retryable response body could not be drained.
    #[error("non-retryable error: failed to drain response body: {0}")]
    Drain(#[source] reqwest::Error),

    /// Whitelisted status persisted through every permitted attempt.
    #[error("final error: {} after {attempts} attempts", status_text(.status))]
    Exhausted {
        /// Status of the last attempt.
        status: StatusCode,
        /// Attempts made.
        attempts: u32,
    },

    /// Whitelisted status that will be retried.
    #[error("retry error: {}", status_text(.status))]
    Retry {
        /// Status of the attempt being retried.
        status: StatusCode,
    },

    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,
}

impl RetryError {
    /// Status of the response behind this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NonRetryable { status }
            | Self::Exhausted { status, .. }
            | Self::Retry { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the loop would try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }

    /// Whether the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Canonical reason phrase for a status, e.g. `Too Many Requests`.
pub fn status_text(status: &StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// Result type for retry operations.
pub type RetryResult<T> = Result<T, RetryError>;
