//! Result of a multi-model call.

use super::consensus::ConsensusSummary;
use super::kind::Strategy;
use crate::request::Response;
use crate::request::response::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A model that was attempted and failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFailure {
    pub model_id: String,
    pub error: String,
    pub retryable: bool,
}

impl CallFailure {
    pub fn new(model_id: impl Into<String>, error: &crate::DomainError) -> Self {
        Self {
            model_id: model_id.into(),
            error: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Reduced result of fanning one request out to several models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCallResult {
    pub strategy: Strategy,
    /// Successful responses, in strategy order (ranked for best-of-n)
    pub responses: Vec<Response>,
    /// Highest-scoring response
    pub best: Option<Response>,
    /// Sum of successful responses' cost
    pub total_cost: f64,
    /// Wall-clock span of the whole strategy
    #[serde(with = "duration_ms")]
    pub total_time: Duration,
    pub success: bool,
    /// Models that were attempted and failed
    #[serde(default)]
    pub failures: Vec<CallFailure>,
    /// Present for the consensus strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus: Option<ConsensusSummary>,
}

impl MultiCallResult {
    /// Number of models that were actually called
    pub fn attempted(&self) -> usize {
        self.responses.len() + self.failures.len()
    }

    pub fn models_responded(&self) -> impl Iterator<Item = &str> {
        self.responses.iter().map(|r| r.model_id.as_str())
    }
}
