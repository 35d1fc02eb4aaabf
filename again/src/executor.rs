//! The retry loop behind [`RetryTransport`](crate::RetryTransport).

use crate::body;
use crate::config::RetryConfig;
use crate::error::{RetryError, RetryResult};
use crate::policy::Classification;
use crate::transport::Transport;
use reqwest::{Request, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Where a request is in its retry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Body not yet captured.
    #[default]
    Idle,
    /// An attempt is in flight.
    Attempting,
    /// Waiting before the next attempt.
    RetryWait,
    /// A response below 400 was returned.
    Succeeded,
    /// Stopped on an error that is never retried.
    NonRetryableFailed,
    /// A whitelisted status outlasted the retry budget.
    Exhausted,
    /// The cancellation token fired.
    Cancelled,
}

impl Phase {
    /// Whether the sequence has stopped.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Attempting | Self::RetryWait)
    }
}

/// State of one request's retry sequence.
///
/// Created per send and never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Current attempt number (1-indexed).
    pub attempt: u32,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Current phase.
    pub phase: Phase,
    /// Total time spent waiting.
    pub total_wait_time: Duration,
    /// History of attempts.
    pub history: Vec<AttemptInfo>,
}

/// Information about a single attempt.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Attempt number.
    pub attempt: u32,
    /// Response status, absent when the transport failed.
    pub status: Option<StatusCode>,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Time waited after this attempt.
    pub wait_time: Duration,
}

impl RetryState {
    fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Whether the attempt just made used up the retry budget.
    pub fn is_exhausted(&self) -> bool {
        self.attempt > self.max_retries
    }

    fn record(&mut self, status: Option<StatusCode>, error: Option<&RetryError>, wait_time: Duration) {
        self.history.push(AttemptInfo {
            attempt: self.attempt,
            status,
            success: error.is_none(),
            error: error.map(ToString::to_string),
            wait_time,
        });
    }

    fn fail(mut self, phase: Phase, error: RetryError) -> (RetryResult<Response>, RetryState) {
        warn!(
            attempt = self.attempt,
            error = %error,
            "Retry exhausted or error not retryable"
        );
        self.phase = phase;
        (Err(error), self)
    }
}

/// Run one logical request through `transport` with retries.
pub(crate) async fn run<T>(
    transport: &T,
    config: &RetryConfig,
    mut request: Request,
    cancel: Option<&CancellationToken>,
) -> (RetryResult<Response>, RetryState)
where
    T: Transport + ?Sized,
{
    let mut state = RetryState::new(config.max_retries);

    let cached = match body::capture(&mut request).await {
        Ok(cached) => cached,
        Err(error) => return state.fail(Phase::NonRetryableFailed, error),
    };

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return state.fail(Phase::Cancelled, RetryError::Cancelled);
        }

        state.attempt += 1;
        state.phase = Phase::Attempting;

        debug!(
            attempt = state.attempt,
            max_attempts = config.max_attempts(),
            method = %request.method(),
            url = %request.url(),
            "Executing retry attempt"
        );

        let attempt = body::attach(&request, &cached);
        let outcome = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => None,
                outcome = transport.round_trip(attempt) => Some(outcome),
            },
            None => Some(transport.round_trip(attempt).await),
        };

        let response = match outcome {
            None => {
                state.record(None, Some(&RetryError::Cancelled), Duration::ZERO);
                return state.fail(Phase::Cancelled, RetryError::Cancelled);
            }
            Some(Err(err)) => {
                let error = RetryError::Transport(err);
                state.record(None, Some(&error), Duration::ZERO);
                return state.fail(Phase::NonRetryableFailed, error);
            }
            Some(Ok(response)) => response,
        };

        let status = response.status();
        match config.whitelist.classify(status) {
            Classification::Success => {
                state.record(Some(status), None, Duration::ZERO);
                state.phase = Phase::Succeeded;
                debug!(attempt = state.attempt, status = status.as_u16(), "Request succeeded");
                return (Ok(response), state);
            }
            Classification::Terminal => {
                // The caller only gets the error, so the body is released here.
                if let Err(err) = body::discard(response).await {
                    warn!(status = status.as_u16(), error = %err, "Failed to drain rejected response");
                }
                let error = RetryError::NonRetryable { status };
                state.record(Some(status), Some(&error), Duration::ZERO);
                return state.fail(Phase::NonRetryableFailed, error);
            }
            Classification::Retryable => {
                if let Err(err) = body::discard(response).await {
                    let error = RetryError::Drain(err);
                    state.record(Some(status), Some(&error), Duration::ZERO);
                    return state.fail(Phase::NonRetryableFailed, error);
                }

                if state.is_exhausted() {
                    let error = RetryError::Exhausted {
                        status,
                        attempts: state.attempt,
                    };
                    state.record(Some(status), Some(&error), Duration::ZERO);
                    return state.fail(Phase::Exhausted, error);
                }

                let wait = config.backoff.next_delay(state.attempt);
                let error = RetryError::Retry { status };
                if let Some(notify) = &config.notify {
                    notify(&error, wait);
                }
                state.record(Some(status), Some(&error), wait);
                state.total_wait_time += wait;
                state.phase = Phase::RetryWait;

                debug!(
                    attempt = state.attempt,
                    status = status.as_u16(),
                    wait_ms = wait.as_millis() as u64,
                    "Waiting before retry"
                );

                match cancel {
                    Some(token) => tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            return state.fail(Phase::Cancelled, RetryError::Cancelled);
                        }
                        _ = sleep(wait) => {}
                    },
                    None => sleep(wait).await,
                }
            }
        }
    }
}
