//! Backend operations the workflow depends on.
//!
//! [`ApiClient`](crate::ApiClient) implements both traits over HTTP; tests
//! substitute in-memory stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use augur_models::{ConfigRow, JobId, ServiceType, UsageRecord, UserProfile};

use crate::error::ClientResult;

/// Reads that make up an account snapshot.
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// `GET /v1/users/me`
    async fn fetch_current_user(&self) -> ClientResult<UserProfile>;

    /// `GET /v1/configs`
    async fn fetch_configs(&self) -> ClientResult<Vec<ConfigRow>>;
}

/// Report submission and status polling.
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// `POST` to the service's submit path.
    async fn submit_report(&self, service: &ServiceType, payload: &Value) -> ClientResult<SubmitResponse>;

    /// `GET /v1/usage-histories/{job_id}`
    async fn fetch_usage_history(&self, job_id: &JobId) -> ClientResult<UsageRecord>;
}

/// Body returned by a submit endpoint.
///
/// Asynchronous services answer with a job id; synchronous ones return the
/// finished usage record directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Accepted { job_id: JobId },
    Completed(UsageRecord),
}

/// Config endpoint body: a bare array or wrapped in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConfigRowsBody {
    Bare(Vec<ConfigRow>),
    Wrapped { data: Vec<ConfigRow> },
}

impl ConfigRowsBody {
    pub(crate) fn into_rows(self) -> Vec<ConfigRow> {
        match self {
            ConfigRowsBody::Bare(rows) | ConfigRowsBody::Wrapped { data: rows } => rows,
        }
    }
}
