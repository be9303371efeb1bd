//! Port traits for every collaborator outside the decision engine.

pub mod config_port;
pub mod data_port;
pub mod account_port;
pub mod order_port;
