//! Orchestration configuration from TOML (`[orchestration]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_application::OrchestrationParams;
use switchboard_domain::graph::DEFAULT_MERGE_SEPARATOR;
use switchboard_domain::strategy::DEFAULT_CONSENSUS_THRESHOLD;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestrationConfig {
    /// Deadline for one provider call in milliseconds (default: 60000)
    pub call_timeout_ms: u64,
    /// Agreeing answers needed for consensus (default: 2)
    pub consensus_threshold: usize,
    /// Separator for merge/output nodes (default: "\n\n---\n\n")
    pub merge_separator: String,
}

impl Default for FileOrchestrationConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: 60_000,
            consensus_threshold: DEFAULT_CONSENSUS_THRESHOLD,
            merge_separator: DEFAULT_MERGE_SEPARATOR.to_string(),
        }
    }
}

impl FileOrchestrationConfig {
    pub fn to_params(&self) -> OrchestrationParams {
        OrchestrationParams::default()
            .with_call_timeout(Duration::from_millis(self.call_timeout_ms))
            .with_consensus_threshold(self.consensus_threshold)
            .with_merge_separator(self.merge_separator.clone())
    }
}
