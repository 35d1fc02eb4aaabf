//! HTTP transport with automatic retries.

use crate::config::RetryConfig;
use crate::error::{RetryError, RetryResult};
use crate::executor::{self, RetryState};
use crate::strategy::Backoff;
use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Performs a single HTTP attempt.
///
/// Implementations have no retry semantics of their own; any error they
/// return is treated as final by [`RetryTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` once.
    async fn round_trip(&self, request: Request) -> anyhow::Result<Response>;
}

#[async_trait]
impl Transport for Client {
    async fn round_trip(&self, request: Request) -> anyhow::Result<Response> {
        Ok(self.execute(request).await?)
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn round_trip(&self, request: Request) -> anyhow::Result<Response> {
        (**self).round_trip(request).await
    }
}

/// Transport decorator that retries whitelisted failures.
///
/// The request body is captured once and replayed on every attempt. Cloning
/// is cheap; clones share the wrapped transport and configuration, and every
/// send keeps its own counters, so one instance can serve concurrent requests.
#[derive(Clone)]
pub struct RetryTransport {
    inner: Arc<dyn Transport>,
    config: Arc<RetryConfig>,
}

impl fmt::Debug for RetryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryTransport {
    /// Wrap `transport` with the given retry config.
    pub fn new(transport: impl Transport + 'static, config: RetryConfig) -> Self {
        Self {
            inner: Arc::new(transport),
            config: Arc::new(config),
        }
    }

    /// Wrap a default reqwest client, retrying the default whitelist.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::new(Client::new(), RetryConfig::new().max_retries(max_retries))
    }

    /// Create a builder.
    pub fn builder() -> RetryTransportBuilder {
        RetryTransportBuilder::new()
    }

    /// Get a reference to the retry config.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Send a request, retrying per the config.
    pub async fn send(&self, request: Request) -> RetryResult<Response> {
        self.send_with_state(request, None).await.0
    }

    /// Send a request, giving up as soon as `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> RetryResult<Response> {
        self.send_with_state(request, Some(cancel)).await.0
    }

    /// Send a request and return the retry state alongside the result.
    pub async fn send_with_state(
        &self,
        request: Request,
        cancel: Option<&CancellationToken>,
    ) -> (RetryResult<Response>, RetryState) {
        executor::run(self.inner.as_ref(), &self.config, request, cancel).await
    }
}

#[async_trait]
impl Transport for RetryTransport {
    async fn round_trip(&self, request: Request) -> anyhow::Result<Response> {
        Ok(self.send(request).await?)
    }
}

/// Builder for creating a retry transport.
#[derive(Default)]
pub struct RetryTransportBuilder {
    transport: Option<Arc<dyn Transport>>,
    config: RetryConfig,
}

impl fmt::Debug for RetryTransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransportBuilder")
            .field("transport", &self.transport.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl RetryTransportBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wrapped transport. Defaults to `reqwest::Client::new()`.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Replace the whole retry config.
    pub fn config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set max retries.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.config = self.config.max_retries(n);
        self
    }

    /// Set the retryable status codes.
    pub fn whitelist(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.config = self.config.whitelist(codes);
        self
    }

    /// Set the wait strategy.
    pub fn backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.config = self.config.backoff(backoff);
        self
    }

    /// Set the notification hook.
    pub fn notify<F>(mut self, f: F) -> Self
    where
        F: Fn(&RetryError, Duration) + Send + Sync + 'static,
    {
        self.config = self.config.notify(f);
        self
    }

    /// Build the retry transport.
    pub fn build(self) -> RetryTransport {
        RetryTransport {
            inner: self
                .transport
                .unwrap_or_else(|| Arc::new(Client::new())),
            config: Arc::new(self.config),
        }
    }
}
