//! Fixed-delay retry policy for failed dispatches.
//!
//! A failed call chain is retried while:
//! - the failure is a transport failure (network, timeout, non-2xx status)
//! - neither its HTTP status nor its business code is non-retryable
//! - the chain's retry count is still below its budget
//!
//! Every retry waits the same configured delay; there is no backoff growth.

use crate::config::NetworkConfig;
use crate::error::CourierError;
use crate::options::ResolvedOptions;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Decides whether a failed dispatch is re-dispatched.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// HTTP statuses and business codes that are never retried.
    non_retryable_codes: HashSet<i64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            non_retryable_codes: NetworkConfig::NON_RETRYABLE_CODES.into_iter().collect(),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the non-retryable code set.
    pub fn with_non_retryable_codes(mut self, codes: impl IntoIterator<Item = i64>) -> Self {
        self.non_retryable_codes = codes.into_iter().collect();
        self
    }

    pub fn is_non_retryable_code(&self, code: i64) -> bool {
        self.non_retryable_codes.contains(&code)
    }

    /// Whether a chain that has already retried `retry_count` times should
    /// try again after `error`.
    pub fn should_retry(
        &self,
        error: &CourierError,
        retry_count: u32,
        options: &ResolvedOptions,
    ) -> bool {
        if !error.is_retryable() {
            debug!("Error is not retryable: {}", error);
            return false;
        }

        let blocked = error
            .status()
            .map(i64::from)
            .into_iter()
            .chain(error.business_code())
            .any(|code| self.is_non_retryable_code(code));
        if blocked {
            debug!("Error carries a non-retryable code: {}", error);
            return false;
        }

        retry_count < options.retry
    }

    /// Delay before the next attempt.
    pub fn next_delay(&self, options: &ResolvedOptions) -> Duration {
        options.retry_delay
    }
}

/// Statistics about a settled call chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryStats {
    /// Transport attempts made, including the first one.
    pub attempts: u32,
    /// Total delay spent waiting between attempts.
    pub total_delay: Duration,
}

impl RetryStats {
    /// Record one attempt followed by `delay` of waiting.
    pub fn record_retry(&mut self, delay: Duration) {
        self.attempts += 1;
        self.total_delay += delay;
    }

    /// Number of retries after the first attempt.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}
