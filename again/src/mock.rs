//! Scripted transport for testing.
//!
//! [`MockTransport`] replays a queue of canned replies and records every
//! request it sees, including the body bytes of each attempt. Response bodies
//! are served as streams so tests can check how much of them was drained.
//!
//! ```rust
//! use again::mock::MockTransport;
//! use again::{RetryConfig, RetryTransport};
//!
//! let mock = MockTransport::new()
//!     .with_status(503)
//!     .with_response(200, "ok");
//! let transport = RetryTransport::new(mock.clone(), RetryConfig::new().no_delay());
//! ```

use crate::transport::Transport;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use reqwest::{Body, Method, Request, Response, Url};
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A canned reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Response with a status and body.
    Response {
        /// Status code.
        status: u16,
        /// Body bytes.
        body: Bytes,
    },
    /// Response whose body fails partway through.
    BrokenBody {
        /// Status code.
        status: u16,
    },
    /// Transport-level failure.
    Error(String),
}

/// A request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
    /// Body bytes, `None` if the request had no body.
    pub body: Option<Bytes>,
}

#[derive(Debug, Default)]
struct Inner {
    replies: Mutex<VecDeque<MockReply>>,
    fallback: Mutex<Option<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    served: AtomicUsize,
    consumed: Arc<AtomicUsize>,
}

/// Transport that answers from a script.
///
/// Replies are used in order; once the queue is empty the repeating reply is
/// used, and without one the mock fails with a transport error.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.inner.replies.lock().push_back(reply);
        self
    }

    /// Queue a response with an empty body.
    pub fn with_status(self, status: u16) -> Self {
        self.with_response(status, Bytes::new())
    }

    /// Queue a response with a body.
    pub fn with_response(self, status: u16, body: impl Into<Bytes>) -> Self {
        self.with_reply(MockReply::Response {
            status,
            body: body.into(),
        })
    }

    /// Queue a transport error.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.with_reply(MockReply::Error(message.into()))
    }

    /// Answer with this reply once the queue is empty.
    pub fn repeat(self, reply: MockReply) -> Self {
        *self.inner.fallback.lock() = Some(reply);
        self
    }

    /// Answer with this status once the queue is empty.
    pub fn repeat_status(self, status: u16) -> Self {
        self.repeat(MockReply::Response {
            status,
            body: Bytes::from_static(b"res body data"),
        })
    }

    /// Number of attempts received.
    pub fn attempts(&self) -> usize {
        self.inner.requests.lock().len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.requests.lock().clone()
    }

    /// Body bytes of every request received, empty for body-less requests.
    pub fn bodies(&self) -> Vec<Bytes> {
        self.inner
            .requests
            .lock()
            .iter()
            .map(|r| r.body.clone().unwrap_or_default())
            .collect()
    }

    /// Total response body bytes handed out.
    pub fn served_bytes(&self) -> usize {
        self.inner.served.load(Ordering::SeqCst)
    }

    /// Response body bytes read by whoever received the responses.
    pub fn consumed_bytes(&self) -> usize {
        self.inner.consumed.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<MockReply> {
        self.inner
            .replies
            .lock()
            .pop_front()
            .or_else(|| self.inner.fallback.lock().clone())
    }

    fn respond(&self, status: u16, body: Body) -> anyhow::Result<Response> {
        let response = http::Response::builder().status(status).body(body)?;
        Ok(Response::from(response))
    }

    fn counted_body(&self, body: Bytes) -> Body {
        self.inner.served.fetch_add(body.len(), Ordering::SeqCst);
        let consumed = self.inner.consumed.clone();
        // Split so a partial read is observable.
        let mid = body.len() / 2;
        let chunks = vec![
            Ok::<_, io::Error>(body.slice(..mid)),
            Ok(body.slice(mid..)),
        ];
        Body::wrap_stream(stream::iter(chunks).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                consumed.fetch_add(bytes.len(), Ordering::SeqCst);
            }
        }))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn round_trip(&self, request: Request) -> anyhow::Result<Response> {
        let body = request
            .body()
            .map(|b| Bytes::copy_from_slice(b.as_bytes().unwrap_or_default()));
        self.inner.requests.lock().push(RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            body,
        });

        match self.next_reply() {
            Some(MockReply::Response { status, body }) => {
                let body = self.counted_body(body);
                self.respond(status, body)
            }
            Some(MockReply::BrokenBody { status }) => {
                let chunks = vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
                ];
                self.respond(status, Body::wrap_stream(stream::iter(chunks)))
            }
            Some(MockReply::Error(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("mock transport has no replies left")),
        }
    }
}
