//! # again
//!
//! Retrying HTTP transport for reqwest.
//!
//! [`RetryTransport`] wraps any [`Transport`] (a plain [`reqwest::Client`] by
//! default) and retries requests whose response status is on a whitelist,
//! waiting between attempts according to a [`Backoff`] strategy. The request
//! body is captured once and replayed on every attempt, and response bodies
//! that never reach the caller are drained so connections return to the pool.
//!
//! ## Core Concepts
//!
//! - **[`RetryTransport`]**: the retrying decorator
//! - **[`RetryConfig`]**: max retries, whitelist, backoff and notify hook
//! - **[`StatusWhitelist`]**: status codes considered transient
//! - **[`Backoff`]**: how long to wait before each retry
//! - **[`RetryClient`]**: reqwest client with retries built in
//!
//! ## Retry Rules
//!
//! - Status below 400: success, the response is returned
//! - Whitelisted status: retried until `max_retries` is used up
//! - Any other status, transport errors, body read errors: returned at once
//!
//! The default whitelist is 429, 500, 502, 503 and 504.
//!
//! ## Example
//!
//! ```ignore
//! use again::{RetryClient, RetryConfig};
//! use std::time::Duration;
//!
//! let client = RetryClient::with_config(
//!     RetryConfig::new()
//!         .max_retries(3)
//!         .whitelist([429, 503])
//!         .exponential(Duration::from_millis(100), Duration::from_secs(10)),
//! );
//!
//! let response = client.get("https://api.example.com/data").await?;
//! ```
//!
//! ## Wrapping a Transport
//!
//! ```ignore
//! use again::RetryTransport;
//!
//! let transport = RetryTransport::builder()
//!     .transport(reqwest::Client::new())
//!     .max_retries(2)
//!     .notify(|err, wait| tracing::info!(%err, ?wait, "retrying"))
//!     .build();
//!
//! let response = transport.send(request).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backoff;
pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod mock;
pub mod policy;
pub mod strategy;
pub mod transport;

// Re-exports
pub use backoff::{ExponentialBackoff, ExponentialBackoffBuilder, FixedDelay, LinearBackoff};
pub use body::CachedBody;
pub use client::RetryClient;
pub use config::{NotifyFn, RetryConfig};
pub use error::{RetryError, RetryResult};
pub use executor::{AttemptInfo, Phase, RetryState};
pub use policy::{Classification, StatusWhitelist, DEFAULT_WHITELIST};
pub use strategy::{Backoff, NoDelay};
pub use transport::{RetryTransport, RetryTransportBuilder, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Backoff, ExponentialBackoff, RetryClient, RetryConfig, RetryError, RetryResult,
        RetryTransport, StatusWhitelist, Transport,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let config = RetryConfig::new().max_retries(5);
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.whitelist.codes(), &DEFAULT_WHITELIST);
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = ExponentialBackoff::new();
        assert_eq!(backoff.initial_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_fixed_delay() {
        let delay = FixedDelay::new(Duration::from_secs(1));
        assert_eq!(delay.next_delay(5), Duration::from_secs(1));
    }
}
