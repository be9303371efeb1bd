//! Serialized gate-then-submit per user.
//!
//! Two submissions for the same user never interleave between the risk
//! verdict and the submission that changes the account state the next
//! verdict reads. Different users proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::error::EngineError;
use crate::domain::risk::gate::{RiskGate, RiskVerdict};
use crate::domain::risk::order::{CandidateOrder, OrderReceipt};
use crate::ports::order_port::OrderSubmitPort;

/// One mutex per user id, created on first use. Entries nobody holds are
/// dropped on the next lookup, so the map tracks only users with work in flight.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // a count of one is the map's own handle; clones only happen under this mutex
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Accepted { verdict: RiskVerdict, receipt: OrderReceipt },
    Rejected(RiskVerdict),
}

impl Submission {
    pub fn verdict(&self) -> &RiskVerdict {
        match self {
            Submission::Accepted { verdict, .. } => verdict,
            Submission::Rejected(verdict) => verdict,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted { .. })
    }
}

pub struct OrderDesk<'a> {
    gate: RiskGate<'a>,
    submitter: &'a dyn OrderSubmitPort,
    locks: UserLocks,
}

impl<'a> OrderDesk<'a> {
    pub fn new(gate: RiskGate<'a>, submitter: &'a dyn OrderSubmitPort) -> Self {
        Self {
            gate,
            submitter,
            locks: UserLocks::new(),
        }
    }

    pub fn submit(&self, user_id: &str, order: &CandidateOrder) -> Result<Submission, EngineError> {
        self.submit_at(user_id, order, Utc::now())
    }

    /// Only a passing verdict reaches the submission port.
    pub fn submit_at(
        &self,
        user_id: &str,
        order: &CandidateOrder,
        now: DateTime<Utc>,
    ) -> Result<Submission, EngineError> {
        let lock = self.locks.lock_for(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let verdict = self.gate.validate_order_at(user_id, order, now)?;
        if !verdict.valid {
            warn!(user = user_id, symbol = %order.symbol, reason = %verdict.message, "order rejected");
            return Ok(Submission::Rejected(verdict));
        }

        let receipt = self.submitter.submit(user_id, order)?;
        info!(
            user = user_id,
            order_id = %receipt.order_id,
            symbol = %receipt.symbol,
            "order submitted"
        );
        Ok(Submission::Accepted { verdict, receipt })
    }
}
