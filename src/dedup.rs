//! Deduplication of concurrent identical requests, with per-key cooperative
//! cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ApiError;

/// The future every joined caller awaits. Cloning it joins the in-flight
/// request; all clones resolve with the identical outcome.
pub type SharedOutcome = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct PendingEntry {
    generation: u64,
    outcome: SharedOutcome,
}

struct AbortEntry {
    generation: u64,
    token: CancellationToken,
}

type PendingTable = Arc<Mutex<HashMap<String, PendingEntry>>>;
type AbortTable = Arc<Mutex<HashMap<String, AbortEntry>>>;

/// Tracks at most one pending request and one cancellation handle per key.
///
/// Entries are removed on every settle path (success, failure, cancellation),
/// so a failed request never poisons later attempts for the same key. Each
/// registration carries a generation number; settle-path cleanup removes an
/// entry only while it still belongs to the settling request, so a request
/// started right after a `cancel` keeps its own entries when the cancelled
/// one finally settles.
pub struct RequestCoordinator {
    pending: PendingTable,
    aborts: AbortTable,
    generation: AtomicU64,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            aborts: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Join the pending request for `key` if one exists, otherwise start a
    /// new one from `factory` and register it. Registration happens before
    /// the returned future is first polled, so two callers racing on the
    /// same key always converge on a single underlying request.
    pub fn dedupe<F, Fut>(&self, key: &str, factory: F) -> SharedOutcome
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = Result<Value, ApiError>> + Send + 'static,
    {
        let mut pending = self.pending.lock().expect("pending table lock poisoned");
        if let Some(existing) = pending.get(key) {
            debug!(key, "request.joined");
            return existing.outcome.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        self.aborts
            .lock()
            .expect("abort table lock poisoned")
            .insert(
                key.to_string(),
                AbortEntry {
                    generation,
                    token: cancel.clone(),
                },
            );

        let fut = factory(cancel.clone());
        let pending_table = Arc::clone(&self.pending);
        let abort_table = Arc::clone(&self.aborts);
        let owned_key = key.to_string();
        let shared: SharedOutcome = async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ApiError::Cancelled),
                result = fut => result,
            };
            // A cancelled key may already be re-registered by a newer
            // request; only this generation's own entries are removed.
            let mut pending = pending_table.lock().expect("pending table lock poisoned");
            if pending
                .get(&owned_key)
                .is_some_and(|entry| entry.generation == generation)
            {
                pending.remove(&owned_key);
            }
            drop(pending);
            let mut aborts = abort_table.lock().expect("abort table lock poisoned");
            if aborts
                .get(&owned_key)
                .is_some_and(|entry| entry.generation == generation)
            {
                aborts.remove(&owned_key);
            }
            result
        }
        .boxed()
        .shared();

        pending.insert(
            key.to_string(),
            PendingEntry {
                generation,
                outcome: shared.clone(),
            },
        );
        shared
    }

    /// Abort the in-flight request for `key`. Every joined caller is rejected
    /// with `ApiError::Cancelled`; the next `dedupe` for the key starts a
    /// fresh request rather than rejoining the cancelled one.
    pub fn cancel(&self, key: &str) -> bool {
        let entry = self
            .aborts
            .lock()
            .expect("abort table lock poisoned")
            .remove(key);
        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .remove(key);
        match entry {
            Some(entry) => {
                debug!(key, "request.cancelled");
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Abort everything currently in flight.
    pub fn cancel_all(&self) {
        let entries: Vec<(String, AbortEntry)> = self
            .aborts
            .lock()
            .expect("abort table lock poisoned")
            .drain()
            .collect();
        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .clear();
        for (key, entry) in entries {
            debug!(key = key.as_str(), "request.cancelled");
            entry.token.cancel();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .expect("pending table lock poisoned")
            .len()
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
