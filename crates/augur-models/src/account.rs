//! Account snapshot: balance plus price configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cost_config::ServiceCostConfig;
use crate::credit::CreditBalance;

/// Wire shape of the current-user endpoint.
///
/// Only the two credit counters are consumed; everything else is kept
/// opaque in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub silver_credits: Option<u64>,
    #[serde(default)]
    pub gold_credits: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Balance, if the server reported both counters.
    pub fn balance(&self) -> Option<CreditBalance> {
        Some(CreditBalance::new(self.silver_credits?, self.gold_credits?))
    }
}

/// Balance and price config read together for one gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: CreditBalance,
    pub costs: ServiceCostConfig,
    pub fetched_at: DateTime<Utc>,
}

impl AccountSnapshot {
    pub fn new(balance: CreditBalance, costs: ServiceCostConfig) -> Self {
        Self {
            balance,
            costs,
            fetched_at: Utc::now(),
        }
    }

    /// Age of the snapshot in whole seconds.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_seconds()
    }
}
