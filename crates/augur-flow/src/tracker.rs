//! Polling tracker for asynchronous report jobs.
//!
//! A started tracker probes the usage-history endpoint once immediately and
//! then once per period until a probe sees a populated payload or fails.
//! Each tick spawns its probe independently, so slow probes may overlap.
//!
//! Cancellation uses a generation counter. Every start, cancel and terminal
//! observation bumps the generation, and every probe checks its generation
//! under the state lock before delivering. A response that lands after
//! cancellation is therefore dropped without a callback.
//!
//! Observer callbacks run under a separate delivery lock, which `cancel()`
//! also takes. Once `cancel()` returns no callback is running or will start.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use augur_client::metrics::record_probe;
use augur_client::ReportApi;
use augur_models::{JobHandle, JobId, JobStatus, ServiceType, UsageRecord};

use crate::error::{FlowError, FlowResult};
use crate::logging::JobLogger;

/// Receives the outcome of one tracked job.
///
/// At most one of the two methods is called, at most once, per started job.
/// Callbacks hold the tracker's delivery lock and must not block for long.
pub trait PollObserver: Send + Sync {
    fn on_result(&self, record: UsageRecord);
    fn on_error(&self, error: FlowError);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Idle,
    Active(JobId),
    Terminal { job_id: JobId, status: JobStatus },
}

#[derive(Debug, Default)]
struct Shared {
    generation: u64,
    state: TrackerState,
    probes_issued: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Repeating status poller for one job at a time.
///
/// Dropping the tracker cancels it.
pub struct PollingTracker {
    period: Duration,
    shared: Arc<Mutex<Shared>>,
    /// Held while an observer callback runs. Always taken before `shared`.
    delivery: Arc<Mutex<()>>,
    ticker: Option<JoinHandle<()>>,
    logger: Option<JobLogger>,
}

impl PollingTracker {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            shared: Arc::new(Mutex::new(Shared::default())),
            delivery: Arc::new(Mutex::new(())),
            ticker: None,
            logger: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> TrackerState {
        lock(&self.shared).state.clone()
    }

    /// Probes issued for the current (or last) job.
    pub fn probes_issued(&self) -> u64 {
        lock(&self.shared).probes_issued
    }

    /// Begin polling `job`. Must be called from within a tokio runtime.
    ///
    /// Fails with [`FlowError::TrackerBusy`] unless the tracker is idle; call
    /// [`close`](Self::close) after a terminal outcome to reuse it.
    pub fn start(&mut self, job: &JobHandle, api: Arc<dyn ReportApi>, observer: Arc<dyn PollObserver>) -> FlowResult<()> {
        let generation = {
            let mut shared = lock(&self.shared);
            match &shared.state {
                TrackerState::Active(job_id) | TrackerState::Terminal { job_id, .. } => {
                    return Err(FlowError::TrackerBusy(job_id.clone()));
                }
                TrackerState::Idle => {}
            }
            shared.generation += 1;
            shared.state = TrackerState::Active(job.job_id.clone());
            shared.probes_issued = 0;
            shared.generation
        };

        let logger = JobLogger::new(&job.job_id, job.service.key());
        logger.log_start(self.period.as_millis() as u64);

        let ticker = Ticker {
            shared: Arc::clone(&self.shared),
            delivery: Arc::clone(&self.delivery),
            generation,
            period: self.period,
            job_id: job.job_id.clone(),
            service: job.service.clone(),
            api,
            observer,
            logger: logger.clone(),
        };
        self.ticker = Some(tokio::spawn(ticker.run()));
        self.logger = Some(logger);
        Ok(())
    }

    /// Stop polling and return to idle. Safe to call repeatedly.
    ///
    /// Waits for a callback that is already running to finish.
    pub fn cancel(&mut self) {
        let previous = {
            let _delivery = lock(&self.delivery);
            let mut shared = lock(&self.shared);
            shared.generation += 1;
            std::mem::take(&mut shared.state)
        };

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        if let (TrackerState::Active(_), Some(logger)) = (previous, self.logger.take()) {
            logger.log_cancelled();
        }
    }

    /// Release the tracker after a terminal outcome or on teardown.
    pub fn close(&mut self) {
        self.cancel();
    }
}

impl Drop for PollingTracker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Repeating schedule owned by one started job.
struct Ticker {
    shared: Arc<Mutex<Shared>>,
    delivery: Arc<Mutex<()>>,
    generation: u64,
    period: Duration,
    job_id: JobId,
    service: ServiceType,
    api: Arc<dyn ReportApi>,
    observer: Arc<dyn PollObserver>,
    logger: JobLogger,
}

impl Ticker {
    async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let probe = {
                let mut shared = lock(&self.shared);
                if shared.generation != self.generation {
                    break;
                }
                shared.probes_issued += 1;
                shared.probes_issued
            };

            record_probe(self.service.key());
            self.logger.log_probe(probe);

            tokio::spawn(probe_once(
                Arc::clone(&self.shared),
                Arc::clone(&self.delivery),
                self.generation,
                self.job_id.clone(),
                Arc::clone(&self.api),
                Arc::clone(&self.observer),
                self.logger.clone(),
            ));
        }
    }
}

enum Delivery {
    Ready(UsageRecord, u64),
    Failed(FlowError),
}

async fn probe_once(
    shared: Arc<Mutex<Shared>>,
    delivery_lock: Arc<Mutex<()>>,
    generation: u64,
    job_id: JobId,
    api: Arc<dyn ReportApi>,
    observer: Arc<dyn PollObserver>,
    logger: JobLogger,
) {
    let outcome = api.fetch_usage_history(&job_id).await;

    let _delivering = lock(&delivery_lock);
    let delivery = {
        let mut state = lock(&shared);
        if state.generation != generation {
            logger.log_stale();
            return;
        }

        match outcome {
            Ok(record) if record.is_ready() => {
                state.generation += 1;
                state.state = TrackerState::Terminal {
                    job_id: job_id.clone(),
                    status: JobStatus::Ready,
                };
                Delivery::Ready(record, state.probes_issued)
            }
            Ok(_) => {
                logger.log_pending();
                return;
            }
            Err(source) => {
                state.generation += 1;
                state.state = TrackerState::Terminal {
                    job_id: job_id.clone(),
                    status: JobStatus::Error,
                };
                Delivery::Failed(FlowError::Polling { job_id, source })
            }
        }
    };

    // Claimed. The state lock is released; the delivery lock is held until the callback returns.
    match delivery {
        Delivery::Ready(record, probes) => {
            logger.log_ready(probes);
            observer.on_result(record);
        }
        Delivery::Failed(error) => {
            logger.log_error(&error);
            observer.on_error(error);
        }
    }
}

/// Observer that forwards the outcome into a oneshot channel.
pub struct ChannelObserver {
    sender: Mutex<Option<oneshot::Sender<FlowResult<UsageRecord>>>>,
}

impl ChannelObserver {
    pub fn new() -> (Self, oneshot::Receiver<FlowResult<UsageRecord>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    fn send(&self, outcome: FlowResult<UsageRecord>) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(sender) = sender {
            // Receiver gone means the flow was torn down.
            let _ = sender.send(outcome);
        }
    }
}

impl PollObserver for ChannelObserver {
    fn on_result(&self, record: UsageRecord) {
        self.send(Ok(record));
    }

    fn on_error(&self, error: FlowError) {
        self.send(Err(error));
    }
}
