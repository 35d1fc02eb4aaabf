//! HTTP client with retries built in.

use crate::config::RetryConfig;
use crate::error::{RetryError, RetryResult};
use crate::transport::{RetryTransport, Transport};
use reqwest::{Client, IntoUrl, Method, Request, RequestBuilder, Response};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// HTTP client wrapper with automatic retries.
///
/// Requests are built with a plain [`reqwest::Client`] and sent through a
/// [`RetryTransport`], so callers keep using reqwest's request builder.
#[derive(Debug, Clone)]
pub struct RetryClient {
    client: Client,
    transport: RetryTransport,
}

impl RetryClient {
    /// Create a client over a default reqwest client, retrying the default
    /// whitelist up to `max_retries` times.
    pub fn new(max_retries: u32) -> Self {
        Self::with_config(RetryConfig::new().max_retries(max_retries))
    }

    /// Create a client over a default reqwest client.
    pub fn with_config(config: RetryConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create with a custom reqwest client, used both to build and to send.
    pub fn with_client(client: Client, config: RetryConfig) -> Self {
        let transport = RetryTransport::new(client.clone(), config);
        Self { client, transport }
    }

    /// Create with a custom transport; `client` only builds requests.
    pub fn with_transport(
        client: Client,
        transport: impl Transport + 'static,
        config: RetryConfig,
    ) -> Self {
        Self {
            client,
            transport: RetryTransport::new(transport, config),
        }
    }

    /// Create with default API retry settings.
    pub fn for_api() -> Self {
        Self::with_config(RetryConfig::for_api())
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a reference to the retrying transport.
    pub fn transport(&self) -> &RetryTransport {
        &self.transport
    }

    /// Get a reference to the retry config.
    pub fn config(&self) -> &RetryConfig {
        self.transport.config()
    }

    /// Start building a request. Send it with [`RetryClient::execute`].
    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a built request with retries.
    pub async fn send(&self, request: Request) -> RetryResult<Response> {
        debug!(method = %request.method(), url = %request.url(), "Making HTTP request");
        self.transport.send(request).await
    }

    /// Send a built request with retries, stopping when `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> RetryResult<Response> {
        self.transport.send_with_cancel(request, cancel).await
    }

    /// Build `builder` and send it with retries.
    pub async fn execute(&self, builder: RequestBuilder) -> RetryResult<Response> {
        let request = builder.build().map_err(RetryError::Build)?;
        self.send(request).await
    }

    /// Execute a GET request with retries.
    pub async fn get<U: IntoUrl>(&self, url: U) -> RetryResult<Response> {
        self.execute(self.request(Method::GET, url)).await
    }

    /// Execute a DELETE request with retries.
    pub async fn delete<U: IntoUrl>(&self, url: U) -> RetryResult<Response> {
        self.execute(self.request(Method::DELETE, url)).await
    }

    /// Execute a POST request with a JSON body and retries.
    pub async fn post_json<U: IntoUrl, B: Serialize + ?Sized>(
        &self,
        url: U,
        body: &B,
    ) -> RetryResult<Response> {
        self.execute(self.request(Method::POST, url).json(body)).await
    }

    /// Execute a PUT request with a JSON body and retries.
    pub async fn put_json<U: IntoUrl, B: Serialize + ?Sized>(
        &self,
        url: U,
        body: &B,
    ) -> RetryResult<Response> {
        self.execute(self.request(Method::PUT, url).json(body)).await
    }

    /// Execute a PATCH request with a JSON body and retries.
    pub async fn patch_json<U: IntoUrl, B: Serialize + ?Sized>(
        &self,
        url: U,
        body: &B,
    ) -> RetryResult<Response> {
        self.execute(self.request(Method::PATCH, url).json(body)).await
    }
}
