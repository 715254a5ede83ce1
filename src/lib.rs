mod auth;
mod cache;
mod client;
mod config;
mod dedup;
mod endpoints;
mod errors;
mod retry;
mod telemetry;
mod token;
mod types;

pub(crate) const USER_AGENT: &str = "travelbook-client/0.1.0";

pub use cache::{CACHE_TTL, ResponseCache};
pub use client::{ApiClient, Method, RequestOptions};
pub use config::{ApiConfig, ENV_BASE_URL};
pub use dedup::RequestCoordinator;
pub use errors::ApiError;
pub use retry::{RetryCoordinator, RetryOutcome, RetryPlan};
pub use token::{
    FileStorage, MemoryStorage, REFRESH_THRESHOLD, TokenManager, TokenPair, TokenStorage,
    TokenStore,
};
pub use types::*;
