//! Read-through account snapshot store.
//!
//! `sync()` always reads live data and writes it through to the cache. The
//! cache is never used to evaluate a purchase; it only backs `get()` so the
//! caller can show the last-known balance when a sync fails.

use std::sync::Arc;

use tracing::{debug, warn};

use augur_client::{AccountApi, SnapshotCache};
use augur_models::{AccountSnapshot, ServiceCostConfig};

use crate::error::{FlowError, FlowResult};

/// Live snapshot source combined with the last-known cache.
#[derive(Clone)]
pub struct SnapshotStore {
    api: Arc<dyn AccountApi>,
    cache: Arc<dyn SnapshotCache>,
}

impl SnapshotStore {
    pub fn new(api: Arc<dyn AccountApi>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self { api, cache }
    }

    /// Last-known snapshot from the cache.
    pub async fn get(&self) -> Option<AccountSnapshot> {
        self.cache.get().await
    }

    /// Overwrite the cached snapshot.
    pub async fn set(&self, snapshot: AccountSnapshot) {
        self.cache.set(snapshot).await;
    }

    /// Read balance and price config from the server as one snapshot.
    ///
    /// Both reads are issued together; neither value is mutated in between.
    /// A profile without credit counters or an empty config list is an
    /// [`FlowError::EmptySnapshot`].
    pub async fn sync(&self) -> FlowResult<AccountSnapshot> {
        let (profile, rows) = tokio::try_join!(self.api.fetch_current_user(), self.api.fetch_configs())?;

        let balance = profile
            .balance()
            .ok_or_else(|| FlowError::empty_snapshot("user profile has no credit balance"))?;

        if rows.is_empty() {
            warn!("Config endpoint returned no rows");
            return Err(FlowError::empty_snapshot("config list is empty"));
        }

        let snapshot = AccountSnapshot::new(balance, ServiceCostConfig::from_rows(rows));
        debug!(
            silver = snapshot.balance.silver,
            gold = snapshot.balance.gold,
            config_entries = snapshot.costs.len(),
            "Account snapshot synced"
        );

        self.cache.set(snapshot.clone()).await;
        Ok(snapshot)
    }
}
