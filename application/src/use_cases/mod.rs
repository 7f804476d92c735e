//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod execute_chain;
pub mod persistence;
pub mod route_call;
pub mod run_strategy;

#[cfg(test)]
pub(crate) mod test_support;
