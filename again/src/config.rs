//! Retry configuration.

use crate::backoff::{ExponentialBackoff, FixedDelay, LinearBackoff};
use crate::error::RetryError;
use crate::policy::StatusWhitelist;
use crate::strategy::{Backoff, NoDelay};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Hook called with the retry error and the computed wait before each wait.
///
/// Observability only: the hook cannot change whether or when the request is
/// retried.
pub type NotifyFn = Arc<dyn Fn(&RetryError, Duration) + Send + Sync>;

/// Configuration for retry behavior.
///
/// Built once and shared read-only by every request sent through a transport.
#[derive(Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Status codes that are retried.
    pub whitelist: StatusWhitelist,
    /// Wait strategy.
    pub backoff: Arc<dyn Backoff>,
    /// Optional notification hook.
    pub notify: Option<NotifyFn>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            whitelist: StatusWhitelist::default(),
            backoff: Arc::new(ExponentialBackoff::default()),
            notify: None,
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("whitelist", &self.whitelist)
            .field("backoff", &self.backoff)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

impl RetryConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the retryable status codes.
    pub fn whitelist(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.whitelist = StatusWhitelist::new(codes);
        self
    }

    /// Set the wait strategy.
    pub fn backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Use exponential backoff.
    pub fn exponential(self, initial: Duration, max: Duration) -> Self {
        self.backoff(
            ExponentialBackoff::builder()
                .initial_delay(initial)
                .max_delay(max)
                .build(),
        )
    }

    /// Use fixed delay.
    pub fn fixed(self, delay: Duration) -> Self {
        self.backoff(FixedDelay::new(delay))
    }

    /// Use linear backoff.
    pub fn linear(self, initial: Duration, increment: Duration, max: Duration) -> Self {
        self.backoff(LinearBackoff::new(initial, increment, max))
    }

    /// Retry without waiting.
    pub fn no_delay(self) -> Self {
        self.backoff(NoDelay)
    }

    /// Set the notification hook.
    pub fn notify<F>(mut self, f: F) -> Self
    where
        F: Fn(&RetryError, Duration) + Send + Sync + 'static,
    {
        self.notify = Some(Arc::new(f));
        self
    }

    /// Create config for API calls with sensible defaults.
    pub fn for_api() -> Self {
        Self::new()
            .max_retries(3)
            .exponential(Duration::from_millis(500), Duration::from_secs(60))
    }

    /// Create config that never retries.
    pub fn no_retry() -> Self {
        Self::new().max_retries(0)
    }

    /// Total attempts allowed for one request.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
