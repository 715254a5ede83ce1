use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::USER_AGENT;
use crate::errors::{ApiError, server_message};
use crate::telemetry::RefreshTelemetry;

use super::claims;
use super::store::{TokenPair, TokenStore};

#[derive(serde::Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Decides whether the stored access token is usable and, when it is not,
/// exchanges the refresh token for a new one. Refreshes are single-flight:
/// a global async lock plus a post-acquisition re-check means N concurrent
/// callers produce exactly one network refresh, all observing its outcome.
pub struct TokenManager {
    store: TokenStore,
    http: reqwest::Client,
    refresh_url: String,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(store: TokenStore, http: reqwest::Client, base_url: &str) -> Self {
        Self {
            store,
            http,
            refresh_url: format!("{base_url}/auth/refresh/"),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Install the pair issued at login/registration.
    pub fn install(&self, access: &str, refresh: &str) {
        self.store.set(access, refresh);
    }

    /// Drop all credentials.
    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn pair(&self) -> Option<TokenPair> {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        match self.store.get() {
            Some(pair) => !pair.refresh_token.is_empty() && !self.store.is_expired(),
            None => false,
        }
    }

    /// Resolve a bearer token fit for an Authorization header. `None` means
    /// "no usable credential": the caller proceeds unauthenticated and the
    /// backend enforces authorization. This never errors; refresh failures
    /// degrade to `None` after clearing the stored pair (fail-closed).
    pub async fn valid_access_token(&self) -> Option<String> {
        let pair = self.store.get()?;
        if !claims::has_valid_format(&pair.access_token) {
            warn!("stored access token is structurally invalid; clearing credentials");
            self.store.clear();
            return None;
        }
        if !self.store.needs_refresh() {
            return Some(pair.access_token);
        }
        self.refresh_access_token().await
    }

    async fn refresh_access_token(&self) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;
        // Another caller may have finished the refresh while we waited.
        if !self.store.needs_refresh() {
            debug!("token refreshed while waiting on the refresh lock");
            return self.store.get().map(|p| p.access_token);
        }
        let refresh_token = self.store.get()?.refresh_token;

        let telemetry = RefreshTelemetry::new("access_token_refresh");
        telemetry.emit_start();
        match self.perform_refresh(&refresh_token).await {
            Ok(access) => {
                // Only the access token rotates; the backend keeps accepting
                // the original refresh token.
                self.store.replace_access(&access);
                telemetry.emit_success();
                Some(access)
            }
            Err(err) => {
                telemetry.emit_failure(&err);
                // Fail closed: an unrefreshable credential is dropped, not
                // retried indefinitely.
                self.store.clear();
                None
            }
        }
    }

    async fn perform_refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(&self.refresh_url)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, server_message(&body)));
        }
        let parsed: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Unknown(format!("malformed refresh response: {e}")))?;
        Ok(parsed.access)
    }
}
