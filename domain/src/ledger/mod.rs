//! Per-provider mutable state kept by the rate limiter and cost accountant.
//!
//! The types here are single-owner state machines; the application layer
//! wraps each one in its own lock.

pub mod cost_ledger;
pub mod rate_window;

pub use cost_ledger::CostLedger;
pub use rate_window::{Admission, RateWindow};
