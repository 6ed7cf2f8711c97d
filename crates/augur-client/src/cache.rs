//! Last-known account snapshot cache.
//!
//! The persisted cache itself lives in the host application. This module
//! defines the read/write contract the workflow relies on and an in-memory
//! implementation for tests and headless use.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use augur_models::AccountSnapshot;

/// Read/write contract for the last-known account snapshot.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Last snapshot written, if any.
    async fn get(&self) -> Option<AccountSnapshot>;

    /// Replace the stored snapshot.
    async fn set(&self, snapshot: AccountSnapshot);
}

/// Process-local snapshot cache.
#[derive(Debug, Default)]
pub struct InMemorySnapshotCache {
    inner: RwLock<Option<AccountSnapshot>>,
}

impl InMemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with a snapshot, e.g. one loaded from disk at startup.
    pub fn with_snapshot(snapshot: AccountSnapshot) -> Self {
        Self {
            inner: RwLock::new(Some(snapshot)),
        }
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[async_trait]
impl SnapshotCache for InMemorySnapshotCache {
    async fn get(&self) -> Option<AccountSnapshot> {
        self.inner.read().await.clone()
    }

    async fn set(&self, snapshot: AccountSnapshot) {
        debug!(
            silver = snapshot.balance.silver,
            gold = snapshot.balance.gold,
            config_entries = snapshot.costs.len(),
            "Caching account snapshot"
        );
        *self.inner.write().await = Some(snapshot);
    }
}
