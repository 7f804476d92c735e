//! Shared mutable state used by the use cases.

pub mod cost_accountant;
pub mod rate_limiter;

pub use cost_accountant::{CostAccountant, ProviderUsage, UsageReport};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
