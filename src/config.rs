//! Index engine configuration
//!
//! Controls batch chunking, retry of unprocessed batch items, and default
//! page sizes for queries.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest batch the reference backends accept in a single request
pub const DEFAULT_MAX_BATCH_SIZE: usize = 25;

/// Retry policy for batch items the backend reports as unprocessed
///
/// Resubmission waits `initial_backoff_ms * 2^(attempt-1)`, capped at
/// `max_backoff_ms`. After `max_attempts` submissions with items still
/// pending, the batch fails with [`IndexError::UnprocessedItems`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total submissions per chunk, including the first one
    pub max_attempts: u32,

    /// Delay before the first resubmission (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound for a single delay (milliseconds)
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff_ms: 10,
            max_backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Resubmit immediately, no sleeping (tests and in-process stores)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay to wait before submission number `attempt + 1`
    ///
    /// `attempt` counts submissions already made (so it is at least 1).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        if self.initial_backoff_ms == 0 {
            return Duration::ZERO;
        }

        let shift = attempt.saturating_sub(1).min(20);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Index engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Maximum requests per backend batch write
    pub max_batch_size: usize,

    /// Retry of unprocessed batch items
    pub retry: RetryPolicy,

    /// Page size used when a query does not pass a limit
    pub default_query_limit: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            retry: RetryPolicy::default(),
            default_query_limit: 100,
        }
    }
}

impl IndexConfig {
    /// Configuration for tests: no backoff sleeps
    pub fn for_testing() -> Self {
        Self {
            retry: RetryPolicy::immediate(8),
            ..Default::default()
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_default_query_limit(mut self, limit: usize) -> Self {
        self.default_query_limit = limit;
        self
    }

    /// Reject settings that would make the engine loop or never make progress
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(IndexError::InvalidArgument(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(IndexError::InvalidArgument(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(IndexError::InvalidArgument(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }
        if self.default_query_limit == 0 {
            return Err(IndexError::InvalidArgument(
                "default_query_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
