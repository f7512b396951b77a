//! Failure classification and backoff.
//!
//! A failed attempt lands in one of three buckets. The bucket alone picks
//! how long to wait before the next attempt.

use std::error::Error;
use std::fmt;
use std::io;
use std::time::Duration;

use crate::client::CallError;

/// Attempts per combination when none are configured.
pub const DEFAULT_RETRY_COUNT: u32 = 5;

const DEFAULT_NOT_READY_WAIT: Duration = Duration::from_secs(16);
const DEFAULT_WEB_ERROR_WAIT: Duration = Duration::from_secs(8);
const DEFAULT_OTHER_ERROR_WAIT: Duration = Duration::from_secs(4);

/// Why an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The connection ended before any response: the target is most likely
    /// still starting.
    NotReady,
    /// Any other transport-level failure (refused, reset, TLS, timeout).
    TransportError,
    /// The attempt never reached the transport.
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotReady => write!(f, "not-ready"),
            FailureKind::TransportError => write!(f, "web-error"),
            FailureKind::Other => write!(f, "other"),
        }
    }
}

/// Bucket a failed call.
pub fn classify(err: &CallError) -> FailureKind {
    match err {
        CallError::InvalidRequest(_) => FailureKind::Other,
        CallError::Timeout(_) => FailureKind::TransportError,
        CallError::Transport(source) => {
            if is_end_of_stream(&**source) {
                FailureKind::NotReady
            } else {
                FailureKind::TransportError
            }
        }
    }
}

/// Walk the source chain looking for an immediate end-of-stream.
fn is_end_of_stream(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(e) = err.downcast_ref::<hyper::Error>() {
            if e.is_incomplete_message() || e.is_closed() || e.is_canceled() {
                return true;
            }
        }
        if let Some(e) = err.downcast_ref::<io::Error>() {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return true;
            }
        }
        current = err.source();
    }
    false
}

/// Attempt budget and per-bucket backoff table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    not_ready_wait: Duration,
    web_error_wait: Duration,
    other_error_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_COUNT,
            not_ready_wait: DEFAULT_NOT_READY_WAIT,
            web_error_wait: DEFAULT_WEB_ERROR_WAIT,
            other_error_wait: DEFAULT_OTHER_ERROR_WAIT,
        }
    }
}

impl RetryPolicy {
    /// Build from the configured retry count and wait unit (seconds).
    ///
    /// A count of zero or less keeps the default of five attempts. A non-zero
    /// wait `w` gives `2w` for not-ready, `w` for web errors and `w / 2`
    /// (rounded down) for everything else.
    pub fn from_config(retry_count: i32, retry_wait_secs: u64) -> Self {
        let mut policy = Self::default();
        if retry_count > 0 {
            policy.max_attempts = retry_count as u32;
        }
        if retry_wait_secs > 0 {
            policy.not_ready_wait = Duration::from_secs(retry_wait_secs.saturating_mul(2));
            policy.web_error_wait = Duration::from_secs(retry_wait_secs);
            policy.other_error_wait = Duration::from_secs(retry_wait_secs / 2);
        }
        policy
    }

    /// Explicit attempt budget and waits.
    pub fn with_waits(
        max_attempts: u32,
        not_ready_wait: Duration,
        web_error_wait: Duration,
        other_error_wait: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            not_ready_wait,
            web_error_wait,
            other_error_wait,
        }
    }

    /// Attempts allowed per (port, command, protocol).
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before retrying after a failure of the given kind.
    pub fn backoff(&self, kind: FailureKind) -> Duration {
        match kind {
            FailureKind::NotReady => self.not_ready_wait,
            FailureKind::TransportError => self.web_error_wait,
            FailureKind::Other => self.other_error_wait,
        }
    }
}
