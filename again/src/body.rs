//! Request body capture and replay.
//!
//! A request body can only be read once. Before the first attempt the body is
//! captured into memory, and every attempt then gets a fresh [`Body`] over the
//! same bytes. Responses that never reach the caller are drained with
//! [`discard`] so their connection can go back to the pool.

use crate::error::{RetryError, RetryResult};
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Body, Request, Response};

/// Request body captured once per logical request.
#[derive(Debug, Clone, Default)]
pub struct CachedBody {
    bytes: Bytes,
    present: bool,
}

impl CachedBody {
    /// The captured bytes, empty if the request had no body.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the original request carried a body.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Length of the captured body.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the captured body is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// A new body positioned at the start of the captured bytes.
    fn to_body(&self) -> Option<Body> {
        // Bytes clones share the buffer without copying it.
        self.present.then(|| Body::from(self.bytes.clone()))
    }
}

/// Take the body out of `request` and read it to exhaustion.
///
/// Buffered bodies are copied without polling. Streaming bodies are collected;
/// a stream error fails the capture.
pub async fn capture(request: &mut Request) -> RetryResult<CachedBody> {
    let Some(body) = request.body_mut().take() else {
        return Ok(CachedBody::default());
    };

    let bytes = match body.as_bytes() {
        Some(buffered) => Bytes::copy_from_slice(buffered),
        None => body
            .collect()
            .await
            .map_err(RetryError::BodyCapture)?
            .to_bytes(),
    };

    Ok(CachedBody {
        bytes,
        present: true,
    })
}

/// Build the request for the next attempt.
///
/// Method, URL, headers, version and timeout come from `template`; the body is
/// a new view over `cached`.
pub fn attach(template: &Request, cached: &CachedBody) -> Request {
    let mut request = Request::new(template.method().clone(), template.url().clone());
    *request.headers_mut() = template.headers().clone();
    *request.version_mut() = template.version();
    *request.timeout_mut() = template.timeout().copied();
    *request.body_mut() = cached.to_body();
    request
}

/// Read and drop the rest of a response body, returning the bytes discarded.
pub async fn discard(mut response: Response) -> reqwest::Result<usize> {
    let mut drained = 0;
    while let Some(chunk) = response.chunk().await? {
        drained += chunk.len();
    }
    Ok(drained)
}
