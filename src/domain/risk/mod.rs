//! Pre-trade risk gate.
//!
//! Every candidate order passes six checks before it may reach an
//! [`OrderSubmitPort`](crate::ports::order_port::OrderSubmitPort). Money and
//! ratio arithmetic uses [`rust_decimal::Decimal`] throughout.

pub mod checks;
pub mod desk;
pub mod gate;
pub mod limits;
pub mod order;
pub mod sizing;

pub use checks::{CheckResult, MarketSession};
pub use desk::{OrderDesk, Submission, UserLocks};
pub use gate::{RiskChecks, RiskGate, RiskVerdict};
pub use limits::RiskLimits;
pub use order::{CandidateOrder, OrderReceipt, OrderRecord, OrderSide};
