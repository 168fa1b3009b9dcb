//! Retry decoration for the transport capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{Error, Result};
use crate::request::{Options, Request, Response};
use crate::transport::Transport;

/// Attempt budget and failure classification for [`RetryingTransport`].
///
/// Transport-level failures are retryable. Coded (status-carrying) failures
/// are retried only when their status is listed in `retryable_statuses`, and
/// timeouts only when `retry_on_timeout` is set; both default off. Failed
/// attempts are spaced by capped exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first attempt
    pub max_attempts: usize,
    /// Whether a timed-out attempt counts as transient
    pub retry_on_timeout: bool,
    /// Status codes whose coded failures are worth re-issuing
    pub retryable_statuses: Vec<u16>,
    /// Backoff before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
    /// Cap on the backoff growth, in milliseconds
    pub max_backoff_ms: u64,
    /// Backoff growth factor between consecutive retries
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_on_timeout: false,
            retryable_statuses: Vec::new(),
            initial_backoff_ms: 50,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Whether `error` is transient under this policy.
    pub fn is_retryable(&self, error: &Error) -> bool {
        match error {
            Error::Transport(_) | Error::Io(_) => true,
            Error::Timeout(_) => self.retry_on_timeout,
            Error::Application { status, .. } => self.retryable_statuses.contains(&status.as_u16()),
            // No target now means no target on the next attempt either; list
            // refreshes arrive through ServerList::update regardless.
            Error::NoAvailableTarget(_) => false,
            Error::Encoding(_) => false,
        }
    }

    /// Next backoff after waiting `backoff_ms`, capped at `max_backoff_ms`.
    pub fn next_backoff(&self, backoff_ms: u64) -> u64 {
        std::cmp::min(
            (backoff_ms as f64 * self.backoff_multiplier) as u64,
            self.max_backoff_ms,
        )
    }
}

/// Decorates a [`Transport`] with an attempt loop.
///
/// Each retry re-issues the identical request value, so query and body
/// content never change between attempts; a composed load-balancing layer
/// inside this one re-selects the target per attempt. The terminal failure is
/// the most recent one observed, not the first.
pub struct RetryingTransport {
    inner: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(inner: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Transport for RetryingTransport {
    async fn execute(&self, request: &Request, options: &Options) -> Result<Response> {
        let attempts = self.policy.max_attempts.max(1);
        let mut backoff_ms = self.policy.initial_backoff_ms;

        for attempt in 1..=attempts {
            match self.inner.execute(request, options).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    if attempt >= attempts || !self.policy.is_retryable(&error) {
                        return Err(error);
                    }
                    warn!(
                        operation = %request.descriptor().operation,
                        attempt,
                        "attempt failed: {}, retrying in {}ms",
                        error,
                        backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = self.policy.next_backoff(backoff_ms);
                }
            }
        }

        unreachable!("attempt loop always returns a response or a failure")
    }
}
