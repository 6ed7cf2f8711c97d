//! In-memory backend used by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use augur_client::{AccountApi, ClientError, ClientResult, ReportApi, SubmitResponse};
use augur_models::{ConfigRow, JobId, ServiceType, UsageRecord, UserProfile};

use crate::tracker::PollObserver;

/// Scripted answer to one status probe.
#[derive(Debug, Clone)]
pub(crate) enum Probe {
    Pending,
    Ready(&'static str),
    Fail(u16),
}

#[derive(Default)]
pub(crate) struct StubBackend {
    profile: Mutex<UserProfile>,
    rows: Vec<ConfigRow>,
    fail_account_reads: bool,
    stall_account_reads: bool,
    submit_reply: Option<SubmitResponse>,
    probes: Mutex<VecDeque<Probe>>,
    hold: Option<Arc<Notify>>,
    pub user_reads: AtomicUsize,
    pub config_reads: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub probe_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, silver: u64, gold: u64) -> Self {
        self.set_balance(silver, gold);
        self
    }

    /// Change the balance the server reports from now on.
    pub fn set_balance(&self, silver: u64, gold: u64) {
        let mut profile = self.profile.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        profile.silver_credits = Some(silver);
        profile.gold_credits = Some(gold);
    }

    pub fn with_config(mut self, key: &str, value: &str) -> Self {
        self.rows.push(ConfigRow::new(key, value));
        self
    }

    pub fn failing_account_reads(mut self) -> Self {
        self.fail_account_reads = true;
        self
    }

    /// Account reads never complete.
    pub fn stalling_account_reads(mut self) -> Self {
        self.stall_account_reads = true;
        self
    }

    pub fn with_submit_reply(mut self, reply: SubmitResponse) -> Self {
        self.submit_reply = Some(reply);
        self
    }

    pub fn with_probes(self, probes: impl IntoIterator<Item = Probe>) -> Self {
        self.probes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend(probes);
        self
    }

    /// Make every probe wait on `hold` before answering.
    pub fn holding_probes(mut self, hold: Arc<Notify>) -> Self {
        self.hold = Some(hold);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountApi for StubBackend {
    async fn fetch_current_user(&self) -> ClientResult<UserProfile> {
        self.user_reads.fetch_add(1, Ordering::SeqCst);
        if self.stall_account_reads {
            std::future::pending::<()>().await;
        }
        if self.fail_account_reads {
            return Err(ClientError::ServerError(503, "unavailable".into()));
        }
        Ok(self
            .profile
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn fetch_configs(&self) -> ClientResult<Vec<ConfigRow>> {
        self.config_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_account_reads {
            return Err(ClientError::ServerError(503, "unavailable".into()));
        }
        Ok(self.rows.clone())
    }
}

#[async_trait]
impl ReportApi for StubBackend {
    async fn submit_report(&self, service: &ServiceType, _payload: &Value) -> ClientResult<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if service.submit_path().is_none() {
            return Err(ClientError::UnsupportedService(service.key().to_string()));
        }
        self.submit_reply
            .clone()
            .ok_or_else(|| ClientError::ServerError(500, "no reply scripted".into()))
    }

    async fn fetch_usage_history(&self, job_id: &JobId) -> ClientResult<UsageRecord> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }

        let next = self
            .probes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Probe::Pending);

        let record = UsageRecord::new(job_id.as_str(), ServiceType::TransitReport);
        match next {
            Probe::Pending => Ok(record),
            Probe::Ready(payload) => Ok(record.with_response(payload)),
            Probe::Fail(status) => Err(ClientError::ServerError(status, "probe failed".into())),
        }
    }
}

/// Observer that records every callback.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub results: Mutex<Vec<UsageRecord>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn result_count(&self) -> usize {
        self.results.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

impl PollObserver for RecordingObserver {
    fn on_result(&self, record: UsageRecord) {
        self.results
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record);
    }

    fn on_error(&self, error: crate::error::FlowError) {
        self.errors
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(error.to_string());
    }
}
