//! Per-check result cache.
//!
//! Each registered check owns at most one entry: its most recent
//! [`CheckResult`]. An entry is served only while `now < expires`; once stale
//! it is replaced by the next run and never read again. There is no eviction
//! beyond replacement, so the cache never grows past the number of checks.

use std::collections::HashMap;
use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::CheckResult;

/// Shared result cache keyed by check name.
///
/// This type is `Clone` and all clones share the same underlying map through
/// `Arc`. Concurrent reads and writes for different checks are safe.
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, CheckResult>>>,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `name` if it is still fresh at `now`.
    pub async fn get(&self, name: &str, now: Timestamp) -> Option<CheckResult> {
        let entries = self.entries.read().await;
        entries
            .get(name)
            .filter(|result| result.is_fresh(now))
            .cloned()
    }

    /// Stores `result` under `name`, replacing any previous entry.
    pub async fn put(&self, name: impl Into<String>, result: CheckResult) {
        self.entries.write().await.insert(name.into(), result);
    }

    /// Drops the entry for `name`, forcing its next evaluation to run.
    pub async fn invalidate(&self, name: &str) -> bool {
        self.entries.write().await.remove(name).is_some()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Returns the number of entries, fresh or stale.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
