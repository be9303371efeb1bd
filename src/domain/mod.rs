//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_set;
pub mod signal;
pub mod strategy;
pub mod risk;
pub mod error;
pub mod config_validation;
