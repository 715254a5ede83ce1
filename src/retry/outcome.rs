use std::time::Duration;

use tracing::Level;
use tracing::event;

#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub operation: String,
    pub attempts: u8,
    pub success: bool,
    pub total_elapsed: Duration,
}

impl RetryOutcome {
    pub fn log(&self) {
        event!(
            Level::INFO,
            operation = %self.operation,
            attempts = self.attempts,
            success = self.success,
            total_elapsed_ms = self.total_elapsed.as_millis() as u64,
            "retry.outcome"
        );
    }
}
