use reqwest::StatusCode;

/// Failure taxonomy for everything the client can surface to a caller.
///
/// Every variant carries a display-ready message. The enum is `Clone` so a
/// single failure can be handed to every caller joined on a deduplicated
/// request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The in-flight request was aborted, by this caller or another one
    /// sharing the same pending request. UI layers swallow this silently.
    #[error("Request was cancelled")]
    Cancelled,
    /// HTTP 400; the server's own message when it sent one.
    #[error("{0}")]
    Validation(String),
    #[error("You need to be logged in to access this")]
    Unauthorized,
    #[error("You don't have permission to access this")]
    Forbidden,
    #[error("The requested resource was not found")]
    NotFound,
    /// HTTP 408 or a per-attempt deadline elapsing.
    #[error("The request timed out, please try again")]
    Timeout,
    #[error("Too many requests, please wait a moment and try again")]
    RateLimited,
    /// Any 5xx; the u16 is the exact status observed.
    #[error("Something went wrong on our end, our team has been notified")]
    ServerError(u16),
    /// No HTTP response was obtained at all (DNS, connection reset, ...).
    #[error("Could not reach the server, check your connection")]
    NetworkFailure(String),
    #[error("{0}")]
    Unknown(String),
    /// Construction-time configuration problem, never produced on the
    /// request path.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Classify an HTTP error status, passing the server's message through
    /// where the taxonomy allows it.
    pub fn from_status(status: StatusCode, server_message: Option<String>) -> Self {
        match status.as_u16() {
            400 => ApiError::Validation(
                server_message.unwrap_or_else(|| "Invalid request".to_string()),
            ),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            408 => ApiError::Timeout,
            429 => ApiError::RateLimited,
            code if status.is_server_error() => ApiError::ServerError(code),
            _ => ApiError::Unknown(server_message.unwrap_or_else(|| "Unknown error".to_string())),
        }
    }

    /// Retryable failures are transient by classification: 408, 429, 5xx and
    /// failures that never produced a response. Everything else is terminal;
    /// retrying a 400 or 404 wastes calls and hides real client errors.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout
                | ApiError::RateLimited
                | ApiError::ServerError(_)
                | ApiError::NetworkFailure(_)
        )
    }

    /// The HTTP status this error was classified from, when one was observed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Forbidden => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound => Some(StatusCode::NOT_FOUND),
            ApiError::Timeout => Some(StatusCode::REQUEST_TIMEOUT),
            ApiError::RateLimited => Some(StatusCode::TOO_MANY_REQUESTS),
            ApiError::ServerError(code) => StatusCode::from_u16(*code).ok(),
            _ => None,
        }
    }
}

/// Pull the display message out of an error body shaped `{error?, detail?}`.
/// Bodies that are not parseable JSON yield `None`; classification then
/// falls back to the taxonomy's fixed messages.
pub(crate) fn server_message(body: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        detail: Option<String>,
    }
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.error.or(parsed.detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_error_over_detail() {
        let body = r#"{"error": "bad slug", "detail": "ignored"}"#;
        assert_eq!(server_message(body), Some("bad slug".to_string()));
        assert_eq!(
            server_message(r#"{"detail": "not found"}"#),
            Some("not found".to_string())
        );
        assert_eq!(server_message("<html>gateway</html>"), None);
        assert_eq!(server_message(""), None);
    }

    #[test]
    fn classifies_client_errors_as_terminal() {
        for code in [400u16, 401, 403, 404] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = ApiError::from_status(status, None);
            assert!(!err.is_retryable(), "{code} must be terminal, got {err:?}");
        }
    }

    #[test]
    fn classifies_transient_statuses_as_retryable() {
        for code in [408u16, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = ApiError::from_status(status, None);
            assert!(err.is_retryable(), "{code} must be retryable, got {err:?}");
        }
    }

    #[test]
    fn validation_passes_server_message_through() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            Some("booking_date is required".to_string()),
        );
        assert_eq!(err.to_string(), "booking_date is required");
    }

    #[test]
    fn unclassified_status_without_body_reads_unknown_error() {
        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, None);
        assert_eq!(err, ApiError::Unknown("Unknown error".to_string()));
    }

    #[test]
    fn server_error_keeps_exact_status() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, None);
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
    }
}
