//! Submitted report jobs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::service::ServiceType;

/// Opaque server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job processing status as observed by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, no result observed yet
    #[default]
    Pending,
    /// A populated result was observed
    Ready,
    /// A status probe failed
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Ready => "ready",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Error)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Only `pending -> ready|error` is allowed, once.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(self, JobStatus::Pending) && next.is_terminal()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Handle to one server-side asynchronous job.
///
/// Lives for a single submit -> poll -> dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: JobId,
    pub service: ServiceType,
    pub status: JobStatus,
}

impl JobHandle {
    pub fn new(job_id: impl Into<JobId>, service: ServiceType) -> Self {
        Self {
            job_id: job_id.into(),
            service,
            status: JobStatus::Pending,
        }
    }

    /// Move to a terminal status. Returns false if the transition is not allowed.
    pub fn finish(&mut self, status: JobStatus) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        true
    }
}
