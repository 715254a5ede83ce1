use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::ApiError;

/// Correlates the tracing events of one refresh attempt under a single id.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn emit_start(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "refresh.start"
        );
    }

    pub fn emit_success(&self) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            "refresh.success"
        );
    }

    pub fn emit_failure(&self, error: &ApiError) {
        event!(
            Level::ERROR,
            attempt_id = %self.attempt_id,
            context = %self.context,
            error = %error,
            "refresh.failure"
        );
    }
}
