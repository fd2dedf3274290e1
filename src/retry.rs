//! Retry with exponential backoff for remote calls.
//!
//! The wrapper is parameterised by a [`RetryPolicy`] (attempt budget and
//! base delay) and a predicate deciding which failures are worth another
//! attempt. Two predicates are offered through [`RetryMode`]: a narrow one
//! that only retries transient HTTP statuses, and a permissive one that
//! retries everything.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::DriveError;

/// HTTP statuses treated as transient.
pub const TRANSIENT_STATUSES: [u16; 6] = [403, 429, 500, 502, 503, 504];

/// 403 reasons that denote a real permission problem rather than a
/// rate-limit hiccup. These are never retried.
pub const PERMANENT_FORBIDDEN_REASONS: [&str; 8] = [
    "insufficientFilePermissions",
    "forbidden",
    "domainPolicy",
    "appNotAuthorizedToFile",
    "cannotDownloadAbusiveFile",
    "exportSizeLimitExceeded",
    "fileNotDownloadable",
    "cannotExportFile",
];

/// Errors that can tell whether the failed call is worth repeating.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

/// Whether a status/reason pair is transient.
pub fn is_transient_status(status: u16, reason: Option<&str>) -> bool {
    if status == 403 {
        return !reason.is_some_and(|r| PERMANENT_FORBIDDEN_REASONS.contains(&r));
    }
    TRANSIENT_STATUSES.contains(&status)
}

impl IsRetryable for DriveError {
    fn is_retryable(&self) -> bool {
        match self {
            DriveError::ApiError { status, reason, .. } => {
                is_transient_status(*status, reason.as_deref())
            }
            DriveError::HttpError(e) => e
                .status()
                .is_some_and(|s| is_transient_status(s.as_u16(), None)),
            _ => false,
        }
    }
}

/// Which failures the wrapper retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryMode {
    /// Retry only errors that report themselves as transient.
    #[default]
    TransientStatus,
    /// Retry every failure, local I/O included.
    AnyError,
}

impl RetryMode {
    pub fn allows<E: IsRetryable>(&self, err: &E) -> bool {
        match self {
            RetryMode::TransientStatus => err.is_retryable(),
            RetryMode::AnyError => true,
        }
    }
}

/// Attempt budget and backoff shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles on each later failure.
    pub base_delay: Duration,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(800),
            mode: RetryMode::TransientStatus,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failure of attempt `attempt` (zero-based):
    /// `base_delay * 2^attempt`, no jitter, no cap.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(1023) as i32);
        Duration::try_from_secs_f64(self.base_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }
}

/// Why a retried operation gave up.
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// The predicate rejected the error; no further attempts were made.
    Fatal(E),
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryFailure<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryFailure::Fatal(e) => e,
            RetryFailure::Exhausted { last, .. } => last,
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `retryable`
/// rejects, or the attempt budget runs out. The operation receives the
/// zero-based attempt index.
pub async fn with_retry<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    retryable: P,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !retryable(&e) => {
                tracing::debug!(error = %e, attempt = attempt + 1, "Non-retryable failure");
                return Err(RetryFailure::Fatal(e));
            }
            Err(e) if attempt + 1 >= max_attempts => {
                tracing::error!(
                    error = %e,
                    attempts = attempt + 1,
                    "Operation failed after all retry attempts exhausted"
                );
                return Err(RetryFailure::Exhausted {
                    attempts: attempt + 1,
                    last: e,
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
