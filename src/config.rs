//! Resolution of the API base URL.

use crate::errors::ApiError;

/// Environment variable overriding every other resolution step.
pub const ENV_BASE_URL: &str = "TRAVELBOOK_API_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const PRODUCTION_BASE_URL: &str = "https://travelbook-api.up.railway.app/api";
const MANAGED_HOST_MARKERS: &[&str] = &["railway.app", "vercel.app"];

/// Resolved client configuration. The base URL is decided once, at
/// construction, and validated before any network call is made.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: String,
}

impl ApiConfig {
    /// Resolve without a hostname hint (server-rendered context).
    pub fn from_env() -> Result<Self, ApiError> {
        Self::resolve(std::env::var(ENV_BASE_URL).ok(), None)
    }

    /// Resolve with the hostname the application is being served from, so
    /// production deployments and LAN devices can infer their backend.
    pub fn from_env_with_host(hostname: &str) -> Result<Self, ApiError> {
        Self::resolve(std::env::var(ENV_BASE_URL).ok(), Some(hostname))
    }

    /// Use an explicit base URL, bypassing the resolution chain entirely.
    pub fn from_base_url(url: impl Into<String>) -> Result<Self, ApiError> {
        Self::validated(url.into())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolution order: explicit override, then hostname inference
    /// (managed-platform host means production, a bare IPv4 means a LAN
    /// device pointed at a dev backend), then the localhost fallback.
    fn resolve(override_url: Option<String>, hostname: Option<&str>) -> Result<Self, ApiError> {
        if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
            return Self::validated(url);
        }
        let Some(hostname) = hostname else {
            return Self::validated(DEFAULT_BASE_URL.to_string());
        };
        if MANAGED_HOST_MARKERS.iter().any(|m| hostname.contains(m)) {
            return Self::validated(PRODUCTION_BASE_URL.to_string());
        }
        if hostname.parse::<std::net::Ipv4Addr>().is_ok() {
            return Self::validated(format!("http://{hostname}:8000/api"));
        }
        Self::validated(DEFAULT_BASE_URL.to_string())
    }

    fn validated(url: String) -> Result<Self, ApiError> {
        reqwest::Url::parse(&url)
            .map_err(|e| ApiError::Config(format!("invalid API base URL '{url}': {e}")))?;
        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
        })
    }
}
