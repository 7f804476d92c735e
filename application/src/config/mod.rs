//! Application-level configuration.
//!
//! - [`OrchestrationParams`]: router deadline and strategy/chain defaults

pub mod orchestration_params;

pub use orchestration_params::OrchestrationParams;
