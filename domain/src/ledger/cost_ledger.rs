//! Running cost totals for one provider.

use crate::request::Usage;
use serde::{Deserialize, Serialize};

/// Monotonically non-decreasing cost ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    /// Accumulated cost in USD
    pub total_cost: f64,
    /// Successful calls recorded
    pub calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one successful call. Negative or non-finite costs add nothing.
    pub fn record(&mut self, cost: f64, usage: &Usage) {
        if cost.is_finite() && cost > 0.0 {
            self.total_cost += cost;
        }
        self.calls += 1;
        self.prompt_tokens += u64::from(usage.prompt_tokens);
        self.completion_tokens += u64::from(usage.completion_tokens);
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}
