//! Job submission.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, info_span, Instrument};

use augur_client::{ClientError, ReportApi, SubmitResponse};
use augur_models::{JobHandle, ServiceType, UsageRecord};

use crate::error::{FlowError, FlowResult};

/// Outcome of a submit request.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Accepted for asynchronous generation; poll the handle.
    Pending(JobHandle),
    /// Generated synchronously; no polling needed.
    Completed(UsageRecord),
}

pub struct JobSubmitter {
    api: Arc<dyn ReportApi>,
}

impl JobSubmitter {
    pub fn new(api: Arc<dyn ReportApi>) -> Self {
        Self { api }
    }

    /// Post a generation request for `service`.
    ///
    /// Sent exactly once; a failed submit is returned without retry since the
    /// server gives no idempotency guarantee.
    pub async fn submit(&self, service: &ServiceType, payload: &Value) -> FlowResult<Submission> {
        if !service.is_known() {
            return Err(FlowError::UnknownServiceType(service.key().to_string()));
        }

        let span = info_span!("submit_report", service = %service);
        let response = self
            .api
            .submit_report(service, payload)
            .instrument(span)
            .await
            .map_err(|e| match e {
                ClientError::UnsupportedService(key) => FlowError::UnknownServiceType(key),
                other => FlowError::Network(other),
            })?;

        let submission = match response {
            SubmitResponse::Accepted { job_id } => Submission::Pending(JobHandle::new(job_id, service.clone())),
            SubmitResponse::Completed(record) if record.is_ready() => Submission::Completed(record),
            // Record created but not generated yet: its id is the usage-history key.
            SubmitResponse::Completed(record) => Submission::Pending(JobHandle::new(record.id, service.clone())),
        };

        match &submission {
            Submission::Pending(handle) => info!(service = %service, job_id = %handle.job_id, "Report job accepted"),
            Submission::Completed(record) => info!(service = %service, record_id = %record.id, "Report completed synchronously"),
        }

        Ok(submission)
    }
}
