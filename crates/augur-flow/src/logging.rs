//! Structured job logging utilities.
//!
//! Keeps the job id and service on every polling lifecycle event so a
//! single report can be followed through the logs.

use tracing::{debug, info, warn};

use augur_models::JobId;

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    service: String,
}

impl JobLogger {
    /// Create a new job logger for a specific job and service.
    pub fn new(job_id: &JobId, service: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            service: service.to_string(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Log the start of polling.
    pub fn log_start(&self, period_ms: u64) {
        info!(
            job_id = %self.job_id,
            service = %self.service,
            period_ms,
            "Polling started"
        );
    }

    /// Log one issued probe.
    pub fn log_probe(&self, probe: u64) {
        debug!(
            job_id = %self.job_id,
            service = %self.service,
            probe,
            "Status probe issued"
        );
    }

    /// Log a probe that found the job still pending.
    pub fn log_pending(&self) {
        debug!(
            job_id = %self.job_id,
            service = %self.service,
            "Job still pending"
        );
    }

    /// Log the job becoming ready.
    pub fn log_ready(&self, probes: u64) {
        info!(
            job_id = %self.job_id,
            service = %self.service,
            probes,
            "Job ready"
        );
    }

    /// Log a failed probe, which ends polling.
    pub fn log_error(&self, error: &dyn std::fmt::Display) {
        warn!(
            job_id = %self.job_id,
            service = %self.service,
            "Status probe failed, polling stopped: {}", error
        );
    }

    /// Log a probe response discarded because polling was cancelled or already finished.
    pub fn log_stale(&self) {
        debug!(
            job_id = %self.job_id,
            service = %self.service,
            "Discarding stale probe response"
        );
    }

    /// Log cancellation.
    pub fn log_cancelled(&self) {
        info!(
            job_id = %self.job_id,
            service = %self.service,
            "Polling cancelled"
        );
    }
}
