//! Application layer for switchboard
//!
//! This crate contains use cases, port definitions, shared accounting state
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::OrchestrationParams;
pub use ports::{
    progress::{NoProgress, ProgressNotifier},
    provider_gateway::{GatewayError, ProviderGateway, ProviderReply},
    record_store::{RecordFilter, RecordStore, StoreError},
    tool_handler::{ToolError, ToolHandler, ToolOutput, ToolRegistry},
};
pub use services::{CostAccountant, RateLimiter, RateLimiterStats, UsageReport};
pub use use_cases::execute_chain::ChainExecutor;
pub use use_cases::persistence::{ChatHistory, ChatMessage, GraphLibrary, PersistenceError};
pub use use_cases::route_call::SingleCallRouter;
pub use use_cases::run_strategy::StrategyEngine;
