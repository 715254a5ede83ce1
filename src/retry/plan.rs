use std::time::Duration;

/// Shared retry/backoff configuration for backend-bound HTTP operations.
///
/// The schedule is deterministic: no delay before the first attempt, then
/// `base_delay * 2^(n-2)` before attempt `n`, capped at `max_delay`.
#[derive(Clone, Debug)]
pub struct RetryPlan {
    pub max_attempts: u8,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Deadline applied to each individual attempt; an attempt that outlives
    /// it is classified as a retryable timeout.
    pub attempt_deadline: Duration,
}

impl RetryPlan {
    pub fn new(
        max_attempts: u8,
        base_delay: Duration,
        max_delay: Duration,
        attempt_deadline: Duration,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            attempt_deadline,
        }
    }

    pub fn default_plan() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            attempt_deadline: Duration::from_secs(30),
        }
    }

    /// Delay to wait before issuing `attempt` (1-based). The first attempt
    /// is immediate; each later attempt doubles the previous wait.
    pub fn delay_before_attempt(&self, attempt: u8) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exp = 2u32.saturating_pow(u32::from(attempt) - 2);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}
