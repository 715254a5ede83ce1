//! Session flows: obtaining, holding, and releasing a token pair.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::warn;

use crate::client::{ApiClient, RequestOptions};
use crate::errors::ApiError;
use crate::types::{AuthResponse, GuestCheckoutData, LoginData, RegisterData, User};

/// Logout is best-effort; don't hold a departing user hostage to a slow
/// blacklist endpoint.
const LOGOUT_DEADLINE: Duration = Duration::from_secs(5);

impl ApiClient {
    /// Authenticate and install the issued token pair.
    pub async fn login(&self, credentials: &LoginData) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self
            .post("/auth/login/", json!(credentials))
            .await?;
        self.token_manager()
            .install(&response.access, &response.refresh);
        Ok(response)
    }

    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.post("/auth/register/", json!(data)).await?;
        self.token_manager()
            .install(&response.access, &response.refresh);
        Ok(response)
    }

    /// Create a temporary account for checkout without registration.
    pub async fn guest_checkout(&self, data: &GuestCheckoutData) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.post("/auth/guest-checkout/", json!(data)).await?;
        self.token_manager()
            .install(&response.access, &response.refresh);
        Ok(response)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get_fresh("/auth/me/").await
    }

    /// End the session. The backend blacklist call is best-effort with a
    /// hard deadline; local credentials are cleared no matter what it does.
    pub async fn logout(&self) {
        let tokens = self.token_manager();
        if let Some(pair) = tokens.pair() {
            let blacklist = self.request::<Value>(
                "/auth/logout/",
                RequestOptions::post(json!({ "refresh": pair.refresh_token })),
            );
            match tokio::time::timeout(LOGOUT_DEADLINE, blacklist).await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => warn!(error = %err, "logout.blacklist_failed"),
                Err(_) => warn!("logout.blacklist_timed_out"),
            }
        }
        tokens.clear();
    }
}
