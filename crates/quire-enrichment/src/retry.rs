//! Retry with exponential backoff for provider calls
//!
//! A single provider call is reduced to a tagged [`CallOutcome`]; the loop in
//! [`call_with_retry`] consumes those tags. Transport failures use the
//! configured retry budget. Parse failures get exactly one retry of their own.
//! Fatal failures are never retried.

use quire_core::{
    ClassificationProvider, ClassificationRequest, ClassificationResult, ClassifyError,
    ClassifyResult,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Retries granted to parse failures
pub const PARSE_RETRIES: u32 = 1;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt for transport failures
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any delay
    pub max_delay: Duration,
    /// Exponential backoff multiplier (>= 1)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Default backoff with the given retry budget
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Retry budget with no waiting between attempts
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based)
    ///
    /// Non-decreasing in `retry` and never above `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let multiplier = self.backoff_multiplier.max(1.0);
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = self.base_delay.as_millis() as f64 * multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// One provider call, tagged for the retry loop
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The call produced a result
    Success(ClassificationResult),
    /// Another attempt could succeed
    Retryable(ClassifyError),
    /// Retrying cannot help
    Fatal(ClassifyError),
}

impl From<ClassifyResult<ClassificationResult>> for CallOutcome {
    fn from(result: ClassifyResult<ClassificationResult>) -> Self {
        match result {
            Ok(result) => Self::Success(result),
            Err(e) if e.is_retryable() => Self::Retryable(e),
            Err(e) => Self::Fatal(e),
        }
    }
}

/// Final state of a retried call
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// A result was obtained
    Success {
        /// The result
        result: ClassificationResult,
        /// Calls made
        attempts: u32,
    },
    /// Retries exhausted or a fatal error occurred
    Failed {
        /// The last error
        error: ClassifyError,
        /// Calls made
        attempts: u32,
    },
    /// Cancellation stopped further calls
    Cancelled {
        /// Calls made before cancellation
        attempts: u32,
    },
}

/// Call the provider until it succeeds, fails fatally, or the budget runs out
///
/// Cancellation is checked before every call and during every backoff wait.
/// A call already in flight is allowed to finish.
pub async fn call_with_retry(
    provider: &dyn ClassificationProvider,
    request: &ClassificationRequest,
    config: &RetryConfig,
    cancel: &CancellationToken,
    note_id: &str,
) -> RetryOutcome {
    let mut attempts = 0u32;
    let mut transport_retries = 0u32;
    let mut parse_retries = 0u32;

    loop {
        if cancel.is_cancelled() {
            debug!(note_id, attempts, "Cancelled before provider call");
            return RetryOutcome::Cancelled { attempts };
        }

        attempts += 1;
        let error = match CallOutcome::from(provider.classify(request).await) {
            CallOutcome::Success(result) => {
                if attempts > 1 {
                    info!(note_id, attempts, "Classification succeeded after retry");
                }
                return RetryOutcome::Success { result, attempts };
            }
            CallOutcome::Fatal(error) => {
                error!(note_id, attempts, error = %error, "Classification failed, not retryable");
                return RetryOutcome::Failed { error, attempts };
            }
            CallOutcome::Retryable(error) => error,
        };

        let retry_allowed = if error.is_parse() {
            parse_retries += 1;
            parse_retries <= PARSE_RETRIES
        } else {
            transport_retries += 1;
            transport_retries <= config.max_retries
        };
        if !retry_allowed {
            error!(note_id, attempts, error = %error, "Classification failed, retries exhausted");
            return RetryOutcome::Failed { error, attempts };
        }

        let delay = config.delay_for(attempts);
        warn!(
            note_id,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Classification attempt failed, retrying"
        );

        if !delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(note_id, attempts, "Cancelled during backoff");
                    return RetryOutcome::Cancelled { attempts };
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
