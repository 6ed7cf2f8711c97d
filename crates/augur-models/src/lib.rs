//! Shared data models for the Augur report workflow.
//!
//! This crate provides Serde-serializable types for:
//! - Credit tiers, balances and journal entries
//! - Service cost configuration and cost resolution
//! - Report service types and submitted jobs
//! - Usage records returned by the status endpoint

pub mod account;
pub mod cost_config;
pub mod credit;
pub mod credit_cost;
pub mod job;
pub mod service;
pub mod usage_record;

// Re-export common types
pub use account::{AccountSnapshot, UserProfile};
pub use cost_config::{ConfigRow, ServiceCostConfig};
pub use credit::{CreditBalance, CreditJournalEntry, CreditType, CreditTypeParseError};
pub use credit_cost::{resolve, CostQuote, PurchaseDecision};
pub use job::{JobHandle, JobId, JobStatus};
pub use service::{ServiceType, ServiceTypeParseError};
pub use usage_record::UsageRecord;
