//! Fixed-delay retry for per-candidate work.
//!
//! A candidate's fetch and extraction are retried as one unit. Every attempt
//! waits the same delay after a failure; there is no backoff and no jitter,
//! so a run's worst-case duration is predictable from the config.
//!
//! Only errors for which [`PipelineError::is_retryable`] holds consume the
//! budget. Anything else is returned immediately.

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub max_attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. Returns the last error on exhaustion.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, PipelineError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let attempt_t0 = Instant::now();
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() || attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            retryable = e.is_retryable(),
                            error = %e,
                            "Giving up"
                        );
                        return Err(e);
                    }

                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        delay = ?self.delay,
                        error = %e,
                        "Attempt failed; retrying"
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}
