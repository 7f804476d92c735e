//! Domain layer for switchboard
//!
//! This crate holds the entities, value objects and pure rules of the
//! orchestration core. It has no dependencies on runtime, network or storage
//! concerns.
//!
//! # Core Concepts
//!
//! ## Catalog
//!
//! A [`ProviderCatalog`] maps model ids to the provider that serves them,
//! together with that provider's endpoint, auth, rate limit and pricing.
//!
//! ## Ledgers
//!
//! - **RateWindow**: fixed-window admission counter for one provider
//! - **CostLedger**: running spend and token totals for one provider
//!
//! ## Strategies
//!
//! A [`StrategyRequest`] sends one prompt to several models:
//!
//! - **Parallel**: all at once, best answer by weighted score
//! - **Cascade**: one at a time until the first success
//! - **Consensus**: all at once, agreement over similar answers
//! - **Best-of-N**: all at once, every answer ranked
//!
//! ## Chain graphs
//!
//! A [`ChainGraph`] is a DAG of prompt, llm, tool, condition, merge and
//! output nodes evaluated in topological order.

pub mod catalog;
pub mod core;
pub mod graph;
pub mod ledger;
pub mod request;
pub mod strategy;

pub use catalog::{
    AuthRequirement, Capabilities, Endpoint, Model, ModelFilter, Pricing, Provider, ProviderApi,
    ProviderCatalog, RateLimit,
};
pub use crate::core::error::{DomainError, ProviderStatus};
pub use graph::{
    ChainGraph, ChainOutput, GraphDescription, NodeIndex, NodeKind, NodeOutput, NodeRecord,
    NodeType, Predicate,
};
pub use ledger::{Admission, CostLedger, RateWindow};
pub use request::{FinishReason, Request, Response, Role, Turn, Usage};
pub use strategy::{
    CallFailure, ConsensusOutcome, ConsensusSummary, MultiCallResult, ScoreWeights, Strategy,
    StrategyRequest,
};
