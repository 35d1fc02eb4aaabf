//! Backoff trait.

use std::fmt;
use std::time::Duration;

/// Computes how long to wait before each retry.
///
/// Implementations are stateless with respect to a single request: the retry
/// loop keeps its own counters and passes the retry number in, so one
/// strategy can be shared by any number of concurrent requests.
pub trait Backoff: fmt::Debug + Send + Sync {
    /// Delay before retry number `retry` (1-indexed).
    fn next_delay(&self, retry: u32) -> Duration;
}

impl<B: Backoff + ?Sized> Backoff for std::sync::Arc<B> {
    fn next_delay(&self, retry: u32) -> Duration {
        (**self).next_delay(retry)
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn next_delay(&self, retry: u32) -> Duration {
        (**self).next_delay(retry)
    }
}

/// Strategy that retries immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl NoDelay {
    /// Create a new no-delay strategy.
    pub fn new() -> Self {
        Self
    }
}

impl Backoff for NoDelay {
    fn next_delay(&self, _retry: u32) -> Duration {
        Duration::ZERO
    }
}
