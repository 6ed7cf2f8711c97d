//! Purchase gate.
//!
//! Opens on a fresh account snapshot, prices the requested service and
//! decides whether the user may continue to submission. The gate never
//! mutates the balance; the server debits credits when the report is
//! generated.

use std::sync::Arc;

use tracing::{info, warn};

use augur_models::{resolve, AccountSnapshot, PurchaseDecision, ServiceType};

use crate::error::{FlowError, FlowResult};
use crate::snapshot::SnapshotStore;

/// Gate lifecycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GateState {
    #[default]
    Closed,
    /// Snapshot fetch in progress
    Opening,
    /// Decision computed from `snapshot`
    Evaluated {
        decision: PurchaseDecision,
        snapshot: AccountSnapshot,
    },
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Closed => "closed",
            GateState::Opening => "opening",
            GateState::Evaluated { .. } => "evaluated",
        }
    }
}

pub struct PurchaseGate {
    store: Arc<SnapshotStore>,
    state: GateState,
}

impl PurchaseGate {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self {
            store,
            state: GateState::Closed,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Current decision, if the gate is evaluated.
    pub fn decision(&self) -> Option<&PurchaseDecision> {
        match &self.state {
            GateState::Evaluated { decision, .. } => Some(decision),
            _ => None,
        }
    }

    /// Sync a fresh snapshot and evaluate `service` against it.
    ///
    /// Any earlier evaluation is discarded first. On failure the gate is
    /// back in `Closed` and the error is returned to the caller. Balance and
    /// config are read from the server on every call.
    pub async fn open(&mut self, service: &ServiceType) -> FlowResult<PurchaseDecision> {
        self.state = GateState::Opening;

        // Back to Closed unless evaluated, including when this future is dropped mid-sync.
        let mut state = scopeguard::guard(&mut self.state, |state| {
            if *state == GateState::Opening {
                *state = GateState::Closed;
            }
        });

        let snapshot = match self.store.sync().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(service = %service, "Failed to open purchase gate: {}", e);
                return Err(e);
            }
        };

        let quote = resolve(service.key(), &snapshot.costs);
        let decision = PurchaseDecision::evaluate(service.key(), quote, &snapshot.balance);

        info!(
            service = %service,
            cost = decision.cost,
            credit_type = %decision.credit_type,
            available = decision.available,
            sufficient = decision.sufficient,
            "Purchase gate evaluated"
        );

        **state = GateState::Evaluated {
            decision: decision.clone(),
            snapshot,
        };
        Ok(decision)
    }

    /// Accept the evaluated decision and close the gate.
    ///
    /// An insufficient decision is rejected with
    /// [`FlowError::InsufficientCredits`] and the gate stays evaluated so the
    /// caller can still show the numbers before sending the user to top-up.
    pub fn proceed(&mut self) -> FlowResult<PurchaseDecision> {
        let decision = match &self.state {
            GateState::Evaluated { decision, .. } => decision,
            other => return Err(FlowError::GateNotEvaluated(other.name())),
        };

        if !decision.sufficient {
            return Err(FlowError::InsufficientCredits {
                credit_type: decision.credit_type,
                needed: decision.cost,
                available: decision.available,
            });
        }

        match std::mem::take(&mut self.state) {
            GateState::Evaluated { decision, .. } => Ok(decision),
            other => Err(FlowError::GateNotEvaluated(other.name())),
        }
    }

    /// Close the gate from any state, dropping the snapshot.
    pub fn cancel(&mut self) {
        if self.state != GateState::Closed {
            info!(state = self.state.name(), "Purchase gate cancelled");
        }
        self.state = GateState::Closed;
    }

    /// Last snapshot written to the cache, for display after a failed open.
    pub async fn last_known(&self) -> Option<AccountSnapshot> {
        self.store.get().await
    }
}
