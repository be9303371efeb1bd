//! Order submission port, called only after a passing risk verdict.

use crate::domain::error::EngineError;
use crate::domain::risk::{CandidateOrder, OrderReceipt};

pub trait OrderSubmitPort: Send + Sync {
    fn submit(&self, user_id: &str, order: &CandidateOrder) -> Result<OrderReceipt, EngineError>;
}
