use tokio::time::Instant;
use tracing::warn;

use crate::errors::ApiError;

use super::{RetryOutcome, plan::RetryPlan};

/// Drives the attempt loop for a single logical request: applies the
/// per-attempt deadline, classifies failures, and sleeps out the backoff
/// schedule between retryable attempts.
pub struct RetryCoordinator {
    plan: RetryPlan,
}

impl RetryCoordinator {
    pub fn new(plan: RetryPlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> RetryPlan {
        self.plan.clone()
    }

    /// Run `op` until it succeeds, fails terminally, or the attempt budget
    /// is exhausted, at which point the last classified error surfaces.
    /// Cancellation is never retried.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut(u8) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ApiError>> + Send,
    {
        let mut attempt: u8 = 1;
        let start = Instant::now();
        loop {
            let attempt_result =
                match tokio::time::timeout(self.plan.attempt_deadline, op(attempt)).await {
                    Ok(result) => result,
                    Err(_) => Err(ApiError::Timeout),
                };
            match attempt_result {
                Ok(value) => {
                    RetryOutcome {
                        operation: operation.to_string(),
                        attempts: attempt,
                        success: true,
                        total_elapsed: start.elapsed(),
                    }
                    .log();
                    return Ok(value);
                }
                Err(err) => {
                    if attempt >= self.plan.max_attempts || !err.is_retryable() {
                        RetryOutcome {
                            operation: operation.to_string(),
                            attempts: attempt,
                            success: false,
                            total_elapsed: start.elapsed(),
                        }
                        .log();
                        return Err(err);
                    }
                    let delay = self.plan.delay_before_attempt(attempt + 1);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.plan.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retry.scheduling"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryCoordinator {
    fn default() -> Self {
        Self::new(RetryPlan::default_plan())
    }
}
