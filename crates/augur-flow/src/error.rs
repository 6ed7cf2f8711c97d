//! Workflow error types.

use thiserror::Error;

use augur_client::ClientError;
use augur_models::{CreditType, JobId};

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Network error: {0}")]
    Network(#[from] ClientError),

    #[error("Empty snapshot: {0}")]
    EmptySnapshot(String),

    #[error("Polling failed for job {job_id}: {source}")]
    Polling {
        job_id: JobId,
        #[source]
        source: ClientError,
    },

    #[error("Unsupported report type: {0}")]
    UnknownServiceType(String),

    #[error("Insufficient {credit_type} credits: need {needed}, have {available}")]
    InsufficientCredits {
        credit_type: CreditType,
        needed: u64,
        available: u64,
    },

    #[error("Purchase gate is not evaluated (state: {0})")]
    GateNotEvaluated(&'static str),

    #[error("Polling tracker is busy with job {0}")]
    TrackerBusy(JobId),

    #[error("Malformed {service} payload: {reason}")]
    MalformedPayload { service: String, reason: String },

    #[error("Flow cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlowError {
    pub fn empty_snapshot(msg: impl Into<String>) -> Self {
        Self::EmptySnapshot(msg.into())
    }

    pub fn malformed(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for failures while reading the balance/config snapshot.
    pub fn is_snapshot_failure(&self) -> bool {
        matches!(self, FlowError::Network(_) | FlowError::EmptySnapshot(_))
    }

    /// True when the caller should send the user to the top-up flow.
    pub fn needs_top_up(&self) -> bool {
        matches!(self, FlowError::InsufficientCredits { .. })
    }
}
