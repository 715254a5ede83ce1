use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::claims;

/// Refresh proactively once the access token is this close to expiry, so a
/// request never races an about-to-expire credential.
pub const REFRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// An issued access/refresh pair plus the access token's expiry, decoded
/// once at store time and never trusted beyond that decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds from the access token's `exp` claim.
    pub access_expires_at: u64,
}

/// Where the pair persists between processes. The client only needs
/// load/save/clear; everything above it is storage-agnostic.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Option<TokenPair>;
    fn save(&self, pair: &TokenPair);
    fn clear(&self);
}

/// Process-lifetime storage; the default for tests and short-lived tools.
pub struct MemoryStorage {
    slot: Mutex<Option<TokenPair>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Option<TokenPair> {
        self.slot.lock().expect("token slot poisoned").clone()
    }

    fn save(&self, pair: &TokenPair) {
        *self.slot.lock().expect("token slot poisoned") = Some(pair.clone());
    }

    fn clear(&self) {
        *self.slot.lock().expect("token slot poisoned") = None;
    }
}

/// JSON-file-backed storage for credentials that must survive a restart.
/// Storage failures are logged, never propagated; a pair that cannot be
/// persisted degrades to "not logged in" on the next load.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Option<TokenPair> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn save(&self, pair: &TokenPair) {
        let serialized = match serde_json::to_string(pair) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "token.store.serialize_failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), error = %e, "token.store.write_failed");
        }
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "token.store.clear_failed");
        }
    }
}

/// Owns the token pair: writes decode the expiry claim, reads answer the
/// freshness questions the refresher asks.
pub struct TokenStore {
    storage: Box<dyn TokenStorage>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// Persist a freshly issued pair. The expiry is decoded here, once; a
    /// token whose payload cannot be read stores as already expired.
    pub fn set(&self, access: &str, refresh: &str) {
        self.storage.save(&TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            access_expires_at: claims::expires_at_millis(access),
        });
    }

    /// Replace only the access token after a successful refresh. The
    /// refresh token is not rotated; the backend expects the original.
    pub fn replace_access(&self, access: &str) {
        if let Some(mut pair) = self.storage.load() {
            pair.access_token = access.to_string();
            pair.access_expires_at = claims::expires_at_millis(access);
            self.storage.save(&pair);
        }
    }

    pub fn get(&self) -> Option<TokenPair> {
        self.storage.load()
    }

    pub fn clear(&self) {
        self.storage.clear();
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(now_millis())
    }

    fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.storage.load() {
            Some(pair) => now_ms >= pair.access_expires_at,
            None => true,
        }
    }

    fn needs_refresh_at(&self, now_ms: u64) -> bool {
        match self.storage.load() {
            Some(pair) => {
                now_ms
                    >= pair
                        .access_expires_at
                        .saturating_sub(REFRESH_THRESHOLD.as_millis() as u64)
            }
            None => true,
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::claims::test_tokens;

    #[test]
    fn set_decodes_expiry_once_at_store_time() {
        let store = TokenStore::in_memory();
        let access = test_tokens::with_exp(1_900_000_000);
        store.set(&access, "refresh-token");
        let pair = store.get().expect("pair stored");
        assert_eq!(pair.access_expires_at, 1_900_000_000_000);
        assert_eq!(pair.refresh_token, "refresh-token");
    }

    #[test]
    fn malformed_access_token_stores_as_expired() {
        let store = TokenStore::in_memory();
        store.set("garbage", "refresh-token");
        assert!(store.is_expired());
        assert!(store.needs_refresh());
    }

    #[test]
    fn fresh_token_needs_no_refresh() {
        let store = TokenStore::in_memory();
        store.set(&test_tokens::with_exp_offset(3600), "refresh-token");
        assert!(!store.needs_refresh());
        assert!(!store.is_expired());
    }

    #[test]
    fn token_inside_threshold_needs_refresh_but_is_not_expired() {
        // exp two minutes out: inside the five-minute proactive window.
        let store = TokenStore::in_memory();
        store.set(&test_tokens::with_exp_offset(120), "refresh-token");
        assert!(store.needs_refresh());
        assert!(!store.is_expired());
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let store = TokenStore::in_memory();
        store.set(&test_tokens::with_exp(2_000_000), "refresh-token");
        let exp_ms = 2_000_000_000u64;
        let threshold_ms = REFRESH_THRESHOLD.as_millis() as u64;
        assert!(store.needs_refresh_at(exp_ms - threshold_ms));
        assert!(!store.needs_refresh_at(exp_ms - threshold_ms - 1));
        assert!(store.is_expired_at(exp_ms));
        assert!(!store.is_expired_at(exp_ms - 1));
    }

    #[test]
    fn replace_access_keeps_the_refresh_token() {
        let store = TokenStore::in_memory();
        store.set(&test_tokens::with_exp_offset(60), "original-refresh");
        let newer = test_tokens::with_exp_offset(3600);
        store.replace_access(&newer);
        let pair = store.get().expect("pair present");
        assert_eq!(pair.access_token, newer);
        assert_eq!(pair.refresh_token, "original-refresh");
        assert!(!store.needs_refresh());
    }

    #[test]
    fn clear_removes_everything() {
        let store = TokenStore::in_memory();
        store.set(&test_tokens::with_exp_offset(3600), "refresh-token");
        store.clear();
        assert_eq!(store.get(), None);
        assert!(store.is_expired());
    }

    #[test]
    fn file_storage_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tokens.json");
        let store = TokenStore::new(Box::new(FileStorage::new(&path)));
        store.set(&test_tokens::with_exp(1_900_000_000), "refresh-token");

        // A second store over the same file sees the persisted pair.
        let reopened = TokenStore::new(Box::new(FileStorage::new(&path)));
        let pair = reopened.get().expect("pair persisted");
        assert_eq!(pair.access_expires_at, 1_900_000_000_000);

        reopened.clear();
        assert_eq!(store.get(), None);
        // Clearing an already-cleared store is fine.
        reopened.clear();
    }
}
