mod claims;
mod manager;
mod store;

pub use manager::TokenManager;
pub use store::{FileStorage, MemoryStorage, REFRESH_THRESHOLD, TokenPair, TokenStorage, TokenStore};
