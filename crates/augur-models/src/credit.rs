//! Credit tiers, balances and journal entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency bucket a service's cost is debited from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    /// Preferred tier for pricing
    #[default]
    Silver,
    /// Used only when a service has no positive silver price
    Gold,
}

impl CreditType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditType::Silver => "silver",
            CreditType::Gold => "gold",
        }
    }

    /// Suffix used in config keys, e.g. `transit_report_cost_using_gold_credit`.
    pub fn config_suffix(&self) -> &'static str {
        match self {
            CreditType::Silver => "_cost_using_silver_credit",
            CreditType::Gold => "_cost_using_gold_credit",
        }
    }
}

impl fmt::Display for CreditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CreditType {
    type Err = CreditTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silver" => Ok(CreditType::Silver),
            "gold" => Ok(CreditType::Gold),
            _ => Err(CreditTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown credit type: {0}")]
pub struct CreditTypeParseError(String);

/// A user's credit balance in both tiers.
///
/// Only authoritative when freshly read from the server; the client never
/// mutates it optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreditBalance {
    pub silver: u64,
    pub gold: u64,
}

impl CreditBalance {
    pub fn new(silver: u64, gold: u64) -> Self {
        Self { silver, gold }
    }

    /// Balance held in the given tier.
    pub fn available(&self, credit_type: CreditType) -> u64 {
        match credit_type {
            CreditType::Silver => self.silver,
            CreditType::Gold => self.gold,
        }
    }

    /// Whether the tier holds at least `cost` credits.
    pub fn covers(&self, credit_type: CreditType, cost: u64) -> bool {
        self.available(credit_type) >= cost
    }
}

/// Audit record of one debit against a user's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditJournalEntry {
    pub credits_before: u64,
    pub credits_used: u64,
    pub credits_after: u64,
    pub credit_type: CreditType,
}

impl CreditJournalEntry {
    /// True when `before - used == after`.
    pub fn is_consistent(&self) -> bool {
        self.credits_before.checked_sub(self.credits_used) == Some(self.credits_after)
    }

    /// Human-readable description for credit history views.
    pub fn to_description(&self) -> String {
        let unit = if self.credits_used == 1 { "credit" } else { "credits" };
        format!(
            "Used {} {} {} ({} -> {})",
            self.credits_used, self.credit_type, unit, self.credits_before, self.credits_after
        )
    }
}
