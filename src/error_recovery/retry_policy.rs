//! Retry policy with backoff and jitter
//!
//! DHT-class sensors fail a large share of reads (timing-sensitive single
//! wire protocol, checksum mismatches). A reading is only reported as failed
//! to the control loop after the policy gives up.

use crate::error::{ClimateError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Backoff strategy
    pub backoff: BackoffStrategy,
    /// Fraction of the delay that is randomised (0.0 disables jitter)
    pub jitter_factor: f64,
}

/// Backoff strategies for retry delays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed,
    /// Delay multiplied by `multiplier` after each attempt
    Exponential { multiplier: f64 },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff: BackoffStrategy::Exponential { multiplier: 2.0 },
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// A single attempt with no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Fixed-delay policy without jitter
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff: BackoffStrategy::Fixed,
            jitter_factor: 0.0,
        }
    }

    /// Calculate the delay to wait after `attempt` (1-based) failed
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_secs = match self.backoff {
            BackoffStrategy::Fixed => self.initial_delay.as_secs_f64(),
            BackoffStrategy::Exponential { multiplier } => {
                let exponent = attempt.saturating_sub(1).min(32) as i32;
                self.initial_delay.as_secs_f64() * multiplier.max(1.0).powi(exponent)
            }
        };

        let capped = Duration::from_secs_f64(base_secs.min(self.max_delay.as_secs_f64()));

        if self.jitter_factor > 0.0 {
            self.apply_jitter(capped)
        } else {
            capped
        }
    }

    /// Equal jitter: keep the lower part of the delay, randomise the rest
    fn apply_jitter(&self, delay: Duration) -> Duration {
        let factor = self.jitter_factor.clamp(0.0, 1.0);
        let fixed = delay.mul_f64(1.0 - factor);
        let spread = delay.mul_f64(factor).as_secs_f64();
        let jitter = rand::thread_rng().gen_range(0.0..=spread);
        fixed + Duration::from_secs_f64(jitter)
    }

    /// Check if error should be retried
    pub fn should_retry(&self, error: &ClimateError) -> bool {
        error.is_retryable()
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is exhausted. The last error is returned.
    pub async fn execute<F, T, Fut>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} attempts", operation_name, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if attempt >= max_attempts {
                        warn!(
                            "{} failed after {} attempts: {}",
                            operation_name, attempt, error
                        );
                        return Err(error);
                    }

                    if !self.should_retry(&error) {
                        debug!("{} failed with non-retryable error: {}", operation_name, error);
                        return Err(error);
                    }

                    let delay = self.calculate_delay(attempt);
                    debug!(
                        "{} attempt {}/{} failed ({}), retrying in {:?}",
                        operation_name, attempt, max_attempts, error, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
