//! Report workflow orchestrator.
//!
//! Wires the purchase gate, submitter, tracker and dispatcher into one
//! gate -> confirm -> poll -> route cycle.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, info_span, Instrument};

use augur_client::{AccountApi, ReportApi, SnapshotCache};
use augur_models::{AccountSnapshot, JobStatus, PurchaseDecision, ServiceType, UsageRecord};

use crate::config::FlowConfig;
use crate::dispatch::{dispatch, Route};
use crate::error::{FlowError, FlowResult};
use crate::gate::PurchaseGate;
use crate::snapshot::SnapshotStore;
use crate::submitter::{JobSubmitter, Submission};
use crate::tracker::{ChannelObserver, PollingTracker};

/// Final result of [`ReportFlow::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Report finished; hand the route to navigation.
    Routed(Route),
    /// Report finished with a type this client cannot present.
    Unsupported(UsageRecord),
    /// Balance does not cover the price; nothing was submitted.
    TopUpRequired(PurchaseDecision),
}

pub struct ReportFlow {
    gate: PurchaseGate,
    submitter: JobSubmitter,
    tracker: PollingTracker,
    reports: Arc<dyn ReportApi>,
}

impl ReportFlow {
    pub fn new(
        accounts: Arc<dyn AccountApi>,
        reports: Arc<dyn ReportApi>,
        cache: Arc<dyn SnapshotCache>,
        config: &FlowConfig,
    ) -> Self {
        let store = Arc::new(SnapshotStore::new(accounts, cache));
        Self {
            gate: PurchaseGate::new(store),
            submitter: JobSubmitter::new(Arc::clone(&reports)),
            tracker: PollingTracker::new(config.poll_interval),
            reports,
        }
    }

    pub fn gate(&self) -> &PurchaseGate {
        &self.gate
    }

    pub fn tracker(&self) -> &PollingTracker {
        &self.tracker
    }

    /// Price `service` against a fresh snapshot.
    pub async fn open_gate(&mut self, service: &ServiceType) -> FlowResult<PurchaseDecision> {
        if !service.is_known() {
            return Err(FlowError::UnknownServiceType(service.key().to_string()));
        }
        self.gate.open(service).await
    }

    /// Accept the evaluated decision, submit and wait for the finished record.
    ///
    /// Dropping the returned future closes the tracker, so abandoning the
    /// wait stops polling.
    pub async fn confirm(&mut self, payload: &Value) -> FlowResult<UsageRecord> {
        let decision = self.gate.proceed()?;
        let service = ServiceType::from_key(&decision.service_key);

        let mut job = match self.submitter.submit(&service, payload).await? {
            Submission::Completed(record) => return Ok(record),
            Submission::Pending(job) => job,
        };

        let (observer, outcome) = ChannelObserver::new();
        self.tracker.start(&job, Arc::clone(&self.reports), Arc::new(observer))?;
        let tracker = scopeguard::guard(&mut self.tracker, |tracker| tracker.close());

        let result = outcome.await.map_err(|_| FlowError::Cancelled)?;
        let probes = tracker.probes_issued();
        drop(tracker);

        let status = match &result {
            Ok(_) => JobStatus::Ready,
            Err(_) => JobStatus::Error,
        };
        job.finish(status);
        info!(job_id = %job.job_id, status = %job.status, probes, "Report job finished");

        result
    }

    /// Run the whole cycle for `service`, confirming automatically.
    pub async fn run(&mut self, service: &ServiceType, payload: &Value) -> FlowResult<FlowOutcome> {
        let span = info_span!("report_flow", service = %service);
        async move {
            let decision = self.open_gate(service).await?;
            if !decision.sufficient {
                info!(shortfall = decision.shortfall(), "Top-up required");
                self.gate.cancel();
                return Ok(FlowOutcome::TopUpRequired(decision));
            }

            let record = self.confirm(payload).await?;
            Ok(match dispatch(&record)? {
                Some(route) => FlowOutcome::Routed(route),
                None => FlowOutcome::Unsupported(record),
            })
        }
        .instrument(span)
        .await
    }

    /// Abandon the current cycle: close the gate and stop polling.
    pub fn cancel(&mut self) {
        self.gate.cancel();
        self.tracker.cancel();
    }

    /// Last-known snapshot for display after a failed gate open.
    pub async fn last_known(&self) -> Option<AccountSnapshot> {
        self.gate.last_known().await
    }
}
