//! Orchestration parameters: router deadline and strategy/chain defaults.
//!
//! [`OrchestrationParams`] groups the knobs that use cases read at run time.
//! File-level configuration is converted into this type by the binary.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_domain::graph::DEFAULT_MERGE_SEPARATOR;
use switchboard_domain::strategy::DEFAULT_CONSENSUS_THRESHOLD;

/// Use-case level tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationParams {
    /// Deadline for one provider call, admission excluded.
    pub call_timeout: Duration,
    /// Minimum agreeing answers for consensus when a request names none.
    pub consensus_threshold: usize,
    /// Separator for merge and output nodes without their own.
    pub merge_separator: String,
}

impl Default for OrchestrationParams {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(60),
            consensus_threshold: DEFAULT_CONSENSUS_THRESHOLD,
            merge_separator: DEFAULT_MERGE_SEPARATOR.to_string(),
        }
    }
}

impl OrchestrationParams {
    // ==================== Builder Methods ====================

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_consensus_threshold(mut self, threshold: usize) -> Self {
        self.consensus_threshold = threshold;
        self
    }

    pub fn with_merge_separator(mut self, separator: impl Into<String>) -> Self {
        self.merge_separator = separator.into();
        self
    }
}
