//! Credit-gated report workflow.
//!
//! This crate provides:
//! - Purchase gate over a fresh balance and price snapshot
//! - Job submission for synchronous and asynchronous services
//! - Cancellable status polling with a generation counter
//! - Routing of finished records to their presentation
//! - The `ReportFlow` orchestrator tying these together

pub mod config;
pub mod dispatch;
pub mod error;
pub mod flow;
pub mod gate;
pub mod logging;
pub mod snapshot;
pub mod submitter;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use config::FlowConfig;
pub use dispatch::{dispatch, AffinityResult, EchoDate, Route, TargetView};
pub use error::{FlowError, FlowResult};
pub use flow::{FlowOutcome, ReportFlow};
pub use gate::{GateState, PurchaseGate};
pub use logging::JobLogger;
pub use snapshot::SnapshotStore;
pub use submitter::{JobSubmitter, Submission};
pub use tracker::{ChannelObserver, PollObserver, PollingTracker, TrackerState};
