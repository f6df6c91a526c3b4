use std::time::Duration;

use serde_json::Value;

use crate::{decode::create_error, ClientOptions, JsonDbError};

/// Statuses retried automatically. All other non-2xx statuses are terminal.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Capped exponential backoff without jitter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Wait after the zero-based `attempt` failed: `min(base * 2^attempt, max)`.
    pub fn delay(&self, attempt: usize) -> Duration {
        let exp = attempt.min(31) as u32;
        self.base
            .checked_mul(1u32 << exp)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Result of one transport attempt.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Any HTTP response, with its body read as text.
    Response { status: u16, body: String },
    /// No usable response: connect, DNS, TLS, timeout or body read failure.
    Fault(reqwest::Error),
}

/// What the engine does after an attempt.
#[derive(Debug)]
pub(crate) enum Decision {
    Retry(Duration),
    Succeed(Option<Value>),
    Fail(JsonDbError),
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RetryPolicy {
    max_retries: usize,
    backoff: BackoffPolicy,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: usize, backoff: BackoffPolicy) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub(crate) fn from_options(options: &ClientOptions) -> Self {
        Self::new(
            options.max_retries,
            BackoffPolicy::new(
                Duration::from_millis(options.retry_base_delay_ms),
                Duration::from_millis(options.retry_max_delay_ms),
            ),
        )
    }

    /// Decides the fate of the zero-based `attempt`.
    pub(crate) fn decide(&self, outcome: Outcome, attempt: usize) -> Decision {
        let can_retry = attempt < self.max_retries;
        match outcome {
            Outcome::Fault(err) => {
                if can_retry && is_transient_fault(&err) {
                    Decision::Retry(self.backoff.delay(attempt))
                } else {
                    Decision::Fail(JsonDbError::Transport(err))
                }
            }
            Outcome::Response { status, .. } if can_retry && is_retryable_status(status) => {
                Decision::Retry(self.backoff.delay(attempt))
            }
            Outcome::Response { status: 204, .. } => Decision::Succeed(None),
            Outcome::Response { status, body } => {
                if (200..300).contains(&status) {
                    if body.trim().is_empty() {
                        return Decision::Succeed(None);
                    }
                    return match serde_json::from_str(&body) {
                        Ok(value) => Decision::Succeed(Some(value)),
                        Err(err) => Decision::Fail(JsonDbError::Decode(format!(
                            "invalid response JSON: {err}; body: {body}"
                        ))),
                    };
                }
                let parsed = serde_json::from_str(&body).unwrap_or(Value::Null);
                Decision::Fail(JsonDbError::Api(create_error(status, &parsed)))
            }
        }
    }
}

fn is_transient_fault(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}
