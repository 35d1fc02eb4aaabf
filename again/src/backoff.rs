//! Backoff strategies.

use crate::strategy::Backoff;
use std::time::Duration;

/// Exponential backoff with randomization.
///
/// The delay before retry `n` is `initial_delay * multiplier^(n - 1)`, capped
/// at `max_delay`, then spread by `± jitter` of itself.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Initial delay.
    pub initial_delay: Duration,
    /// Maximum delay before jitter is applied.
    pub max_delay: Duration,
    /// Jitter factor (0.0 to 1.0).
    pub jitter: f64,
    /// Multiplier for each retry.
    pub multiplier: f64,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            jitter: 0.5,
            multiplier: 1.5,
        }
    }
}

impl ExponentialBackoff {
    /// Create a new exponential backoff.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Calculate delay for a retry.
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_delay = (self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent))
            .min(self.max_delay.as_secs_f64());
        let jitter = base_delay * self.jitter * rand_jitter();
        // Caps near `Duration::MAX` do not survive the f64 round trip.
        Duration::try_from_secs_f64((base_delay + jitter).max(0.0)).unwrap_or(self.max_delay)
    }
}

impl Backoff for ExponentialBackoff {
    fn next_delay(&self, retry: u32) -> Duration {
        self.calculate_delay(retry)
    }
}

/// Builder for ExponentialBackoff.
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    jitter: Option<f64>,
    multiplier: Option<f64>,
}

impl ExponentialBackoffBuilder {
    /// Set initial delay.
    #[must_use]
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_delay = Some(d);
        self
    }

    /// Set max delay.
    #[must_use]
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    /// Set jitter factor. Clamped to `0.0..=1.0`.
    #[must_use]
    pub fn jitter(mut self, j: f64) -> Self {
        self.jitter = Some(j.clamp(0.0, 1.0));
        self
    }

    /// Set multiplier.
    #[must_use]
    pub fn multiplier(mut self, m: f64) -> Self {
        self.multiplier = Some(m);
        self
    }

    /// Build the backoff strategy.
    #[must_use]
    pub fn build(self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff::default();
        if let Some(v) = self.initial_delay {
            backoff.initial_delay = v;
        }
        if let Some(v) = self.max_delay {
            backoff.max_delay = v;
        }
        if let Some(v) = self.jitter {
            backoff.jitter = v;
        }
        if let Some(v) = self.multiplier {
            backoff.multiplier = v;
        }
        backoff
    }
}

/// Fixed delay between retries.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    /// Delay between retries.
    pub delay: Duration,
}

impl FixedDelay {
    /// Create a new fixed delay strategy.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Backoff for FixedDelay {
    fn next_delay(&self, _retry: u32) -> Duration {
        self.delay
    }
}

/// Linear backoff.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    /// Initial delay.
    pub initial_delay: Duration,
    /// Increment per retry.
    pub increment: Duration,
    /// Maximum delay.
    pub max_delay: Duration,
}

impl LinearBackoff {
    /// Create a new linear backoff.
    #[must_use]
    pub fn new(initial_delay: Duration, increment: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            increment,
            max_delay,
        }
    }

    /// Calculate delay for a retry.
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        let step = self.increment.saturating_mul(retry.saturating_sub(1));
        self.initial_delay.saturating_add(step).min(self.max_delay)
    }
}

impl Backoff for LinearBackoff {
    fn next_delay(&self, retry: u32) -> Duration {
        self.calculate_delay(retry)
    }
}

/// Generate a random jitter factor between -1.0 and 1.0.
fn rand_jitter() -> f64 {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    rng.gen_range(-1.0..1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff_default() {
        let backoff = ExponentialBackoff::new();
        assert_eq!(backoff.initial_delay, Duration::from_millis(500));
        assert_eq!(backoff.max_delay, Duration::from_secs(60));
        assert_eq!(backoff.multiplier, 1.5);
        assert_eq!(backoff.jitter, 0.5);
    }

    #[test]
    fn test_exponential_backoff_builder() {
        let backoff = ExponentialBackoff::builder()
            .initial_delay(Duration::from_millis(50))
            .max_delay(Duration::from_secs(10))
            .jitter(0.2)
            .build();

        assert_eq!(backoff.initial_delay, Duration::from_millis(50));
        assert_eq!(backoff.max_delay, Duration::from_secs(10));
        assert_eq!(backoff.jitter, 0.2);
    }

    #[test]
    fn test_exponential_backoff_delay() {
        let backoff = ExponentialBackoff::builder()
            .initial_delay(Duration::from_millis(100))
            .multiplier(2.0)
            .jitter(0.0)
            .build();

        // Without jitter, delays should be predictable
        assert_eq!(backoff.next_delay(1), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(2), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_exponential_backoff_jitter_bounds() {
        let backoff = ExponentialBackoff::builder()
            .initial_delay(Duration::from_millis(100))
            .multiplier(1.0)
            .jitter(0.5)
            .build();

        for _ in 0..100 {
            let delay = backoff.next_delay(1);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(150));
        }
    }

    #[test]
    fn test_exponential_backoff_max_delay() {
        let backoff = ExponentialBackoff::builder()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::from_secs(5))
            .multiplier(10.0)
            .jitter(0.0)
            .build();

        // Even with large multiplier, should cap at max
        assert_eq!(backoff.next_delay(5), Duration::from_secs(5));
        assert_eq!(backoff.next_delay(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_exponential_backoff_unbounded_cap() {
        let backoff = ExponentialBackoff::builder()
            .initial_delay(Duration::from_secs(1))
            .max_delay(Duration::MAX)
            .multiplier(1e6)
            .jitter(0.0)
            .build();

        assert_eq!(backoff.next_delay(1), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(5), Duration::MAX);
        assert_eq!(backoff.next_delay(u32::MAX), Duration::MAX);

        let jittered = ExponentialBackoff {
            jitter: 1.0,
            ..backoff
        };
        for _ in 0..100 {
            jittered.next_delay(5);
        }
    }

    #[test]
    fn test_fixed_delay() {
        let delay = FixedDelay::new(Duration::from_secs(1));
        assert_eq!(delay.next_delay(1), Duration::from_secs(1));
        assert_eq!(delay.next_delay(3), Duration::from_secs(1));
    }

    #[test]
    fn test_linear_backoff() {
        let backoff = LinearBackoff::new(
            Duration::from_millis(100),
            Duration::from_millis(100),
            Duration::from_secs(1),
        );

        assert_eq!(backoff.next_delay(1), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(2), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(3), Duration::from_millis(300));

        // Check max delay cap
        assert_eq!(backoff.next_delay(20), Duration::from_secs(1));
    }

    #[test]
    fn test_linear_backoff_saturates() {
        let backoff = LinearBackoff::new(
            Duration::from_millis(1),
            Duration::MAX,
            Duration::from_secs(1),
        );

        assert_eq!(backoff.next_delay(1), Duration::from_millis(1));
        assert_eq!(backoff.next_delay(2), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(u32::MAX), Duration::from_secs(1));

        let uncapped = LinearBackoff::new(Duration::from_secs(1), Duration::MAX, Duration::MAX);
        assert_eq!(uncapped.next_delay(2), Duration::MAX);
    }
}
