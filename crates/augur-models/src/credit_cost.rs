//! Credit cost resolution.
//!
//! Resolves which tier a service is paid from and how much it costs, then
//! combines that with a balance into a [`PurchaseDecision`].
//!
//! # Example
//!
//! ```
//! use augur_models::{resolve, CreditType, ServiceCostConfig};
//!
//! let config = ServiceCostConfig::new()
//!     .with_entry("ask_affinity_cost_using_silver_credit", "5")
//!     .with_entry("ask_affinity_cost_using_gold_credit", "2");
//!
//! let quote = resolve("ask_affinity", &config);
//! assert_eq!(quote.cost, 5);
//! assert_eq!(quote.credit_type, CreditType::Silver);
//! ```

use serde::{Deserialize, Serialize};

use crate::cost_config::ServiceCostConfig;
use crate::credit::{CreditBalance, CreditType};

// =============================================================================
// Cost Quote
// =============================================================================

/// Price of a service in exactly one credit tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostQuote {
    pub cost: u64,
    pub credit_type: CreditType,
}

/// Resolve the price of `service_key` against a config snapshot.
///
/// Silver is preferred: a positive silver price wins. Otherwise the gold
/// price is used when it is positive. A service priced in neither tier is
/// free and reported on the silver tier. Missing keys count as 0.
pub fn resolve(service_key: &str, config: &ServiceCostConfig) -> CostQuote {
    let silver = config.price(&cost_key(service_key, CreditType::Silver));
    if silver > 0 {
        return CostQuote {
            cost: silver,
            credit_type: CreditType::Silver,
        };
    }

    let gold = config.price(&cost_key(service_key, CreditType::Gold));
    if gold > 0 {
        return CostQuote {
            cost: gold,
            credit_type: CreditType::Gold,
        };
    }

    CostQuote {
        cost: 0,
        credit_type: CreditType::Silver,
    }
}

fn cost_key(service_key: &str, credit_type: CreditType) -> String {
    format!("{}{}", service_key, credit_type.config_suffix())
}

// =============================================================================
// Purchase Decision
// =============================================================================

/// Affordability verdict for one service against one balance snapshot.
///
/// Derived on every gate open and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDecision {
    pub service_key: String,
    pub cost: u64,
    pub credit_type: CreditType,
    /// Balance held in `credit_type` when the decision was made
    pub available: u64,
    pub sufficient: bool,
}

impl PurchaseDecision {
    /// Evaluate `quote` against `balance`.
    pub fn evaluate(service_key: impl Into<String>, quote: CostQuote, balance: &CreditBalance) -> Self {
        let available = balance.available(quote.credit_type);
        Self {
            service_key: service_key.into(),
            cost: quote.cost,
            credit_type: quote.credit_type,
            available,
            sufficient: available >= quote.cost,
        }
    }

    /// Credits missing to afford the service (0 when sufficient).
    pub fn shortfall(&self) -> u64 {
        self.cost.saturating_sub(self.available)
    }
}

// =============================================================================
// Tests
// =============================================================================
