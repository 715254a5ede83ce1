use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::USER_AGENT;
use crate::cache::ResponseCache;
use crate::config::ApiConfig;
use crate::dedup::RequestCoordinator;
use crate::errors::{ApiError, server_message};
use crate::retry::{RetryCoordinator, RetryPlan};
use crate::token::{MemoryStorage, TokenManager, TokenStorage, TokenStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
}

/// Per-request knobs. Only GET reads are cache- and dedup-eligible; the
/// mutating constructors below set `skip_cache` so a stale copy can never
/// satisfy them.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub skip_cache: bool,
    pub idempotency_key: Option<String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    /// A GET that must never be answered from (or written to) the cache:
    /// availability, pricing, search.
    pub fn get_fresh() -> Self {
        Self {
            skip_cache: true,
            ..Self::default()
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
            skip_cache: true,
            idempotency_key: None,
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
            skip_cache: true,
            idempotency_key: None,
        }
    }

    /// Caller-supplied idempotency header, passed through unchanged on
    /// mutating calls.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// The one client instance a process talks to its backend through.
///
/// `request` composes the resilient pipeline: cache check, join-or-start
/// deduplication, bearer resolution (with transparent refresh), retried
/// transport, JSON parse, cache write. Failures come back as [`ApiError`],
/// never cached, with settle-path cleanup on every exit.
pub struct ApiClient {
    config: ApiConfig,
    http: reqwest::Client,
    cache: ResponseCache,
    coordinator: RequestCoordinator,
    retry: Arc<RetryCoordinator>,
    tokens: Arc<TokenManager>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Self::with_storage(config, Box::new(MemoryStorage::new()))
    }

    pub fn with_storage(
        config: ApiConfig,
        storage: Box<dyn TokenStorage>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;
        let tokens = Arc::new(TokenManager::new(
            TokenStore::new(storage),
            http.clone(),
            config.base_url(),
        ));
        Ok(Self {
            config,
            http,
            cache: ResponseCache::new(),
            coordinator: RequestCoordinator::new(),
            retry: Arc::new(RetryCoordinator::default()),
            tokens,
        })
    }

    /// Replace the retry schedule. Intended for construction time, before
    /// any request is issued.
    pub fn with_retry_plan(mut self, plan: RetryPlan) -> Self {
        self.retry = Arc::new(RetryCoordinator::new(plan));
        self
    }

    /// Replace the cache TTL. Intended for construction time.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = ResponseCache::with_ttl(ttl);
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn token_manager(&self) -> Arc<TokenManager> {
        Arc::clone(&self.tokens)
    }

    /// Issue a request through the full pipeline and decode the JSON body
    /// into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let cache_eligible = options.method == Method::Get && !options.skip_cache;
        if cache_eligible && let Some(hit) = self.cache.get(endpoint) {
            return decode(endpoint, hit);
        }

        let value = if options.method == Method::Get {
            debug!(endpoint, "request.dispatch");
            let execute = self.executor(endpoint, &options);
            self.coordinator.dedupe(endpoint, move |_cancel| execute).await?
        } else {
            // Mutations bypass the pending table entirely; two identical
            // POSTs are two intentional requests.
            debug!(endpoint, method = ?options.method, "request.dispatch");
            self.executor(endpoint, &options).await?
        };

        if cache_eligible {
            self.cache.put(endpoint, value.clone());
        }
        decode(endpoint, value)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn get_fresh<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::get_fresh()).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::post(body)).await
    }

    /// Abort the in-flight request for `endpoint`, rejecting every caller
    /// joined on it with [`ApiError::Cancelled`].
    pub fn cancel_request(&self, endpoint: &str) -> bool {
        self.coordinator.cancel(endpoint)
    }

    pub fn cancel_all_requests(&self) {
        self.coordinator.cancel_all();
    }

    /// Drop every cached response. Not invoked on logout; pair the two in
    /// the embedding application when stale reads after a session change
    /// would matter.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Build the one-logical-request future: resolve a bearer once, then
    /// run the attempt loop under the retry plan. The future is detached
    /// from `&self` so the dedup table can own it.
    fn executor(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> impl std::future::Future<Output = Result<Value, ApiError>> + Send + 'static {
        let http = self.http.clone();
        let retry = Arc::clone(&self.retry);
        let tokens = Arc::clone(&self.tokens);
        let url = format!("{}{}", self.config.base_url(), endpoint);
        let endpoint = endpoint.to_string();
        let options = options.clone();
        async move {
            // Resolved once per logical request, not per attempt: a
            // transient 5xx says nothing about the credential. A 401
            // mid-loop is terminal and surfaces as Unauthorized.
            let bearer = tokens.valid_access_token().await;
            retry
                .execute(&endpoint, |_attempt| {
                    send_and_parse(build_request(&http, &url, &options, bearer.as_deref()))
                })
                .await
        }
    }
}

fn build_request(
    http: &reqwest::Client,
    url: &str,
    options: &RequestOptions,
    bearer: Option<&str>,
) -> reqwest::RequestBuilder {
    let mut request = match options.method {
        Method::Get => http.get(url),
        Method::Post => http.post(url),
        Method::Put => http.put(url),
    };
    request = request
        .header("Content-Type", "application/json")
        .header("User-Agent", USER_AGENT);
    if let Some(token) = bearer {
        request = request.header("Authorization", format!("Bearer {token}"));
    }
    if let Some(key) = &options.idempotency_key {
        request = request.header("Idempotency-Key", key.clone());
    }
    if let Some(body) = &options.body {
        request = request.json(body);
    }
    request
}

async fn send_and_parse(request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
    let resp = request.send().await.map_err(classify_transport_error)?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, server_message(&body)));
    }
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;
    if body.trim().is_empty() {
        // 204s and empty bodies decode as null so `request::<()>` works.
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| ApiError::Unknown(format!("malformed response body: {e}")))
}

fn classify_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::NetworkFailure(err.to_string())
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::Unknown(format!("failed to decode response from {endpoint}: {e}")))
}
