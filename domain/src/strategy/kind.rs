//! Fan-out strategies and the strategy request value.

use crate::request::Request;
use serde::{Deserialize, Serialize};

/// Default number of agreeing answers needed for consensus
pub const DEFAULT_CONSENSUS_THRESHOLD: usize = 2;

/// Fan-out/reduction policy for invoking several models for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// All models concurrently; keep every success
    #[default]
    #[serde(rename = "parallel")]
    Parallel,
    /// Models in order; stop at the first success
    #[serde(rename = "cascade")]
    Cascade,
    /// Parallel, then cluster agreeing answers
    #[serde(rename = "consensus")]
    Consensus,
    /// Parallel, then rank by score
    #[serde(rename = "best-of-n")]
    BestOfN,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Parallel => "parallel",
            Strategy::Cascade => "cascade",
            Strategy::Consensus => "consensus",
            Strategy::BestOfN => "best-of-n",
        }
    }

    /// Whether the strategy issues its calls concurrently
    pub fn is_concurrent(&self) -> bool {
        !matches!(self, Strategy::Cascade)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(Strategy::Parallel),
            "cascade" => Ok(Strategy::Cascade),
            "consensus" => Ok(Strategy::Consensus),
            "best-of-n" | "best_of_n" | "bestofn" => Ok(Strategy::BestOfN),
            other => Err(format!(
                "Unknown strategy: {}. Valid: parallel, cascade, consensus, best-of-n",
                other
            )),
        }
    }
}

/// Multi-model request as received from callers.
///
/// # Example
///
/// ```
/// use switchboard_domain::strategy::{Strategy, StrategyRequest};
///
/// let json = r#"{"prompt":"2+2?","models":["a","b"],"strategy":"best-of-n"}"#;
/// let request: StrategyRequest = serde_json::from_str(json).unwrap();
/// assert_eq!(request.strategy, Strategy::BestOfN);
/// assert_eq!(request.threshold(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyRequest {
    pub prompt: String,
    pub models: Vec<String>,
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_threshold: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl StrategyRequest {
    pub fn new(prompt: impl Into<String>, models: Vec<String>, strategy: Strategy) -> Self {
        Self {
            prompt: prompt.into(),
            models,
            strategy,
            consensus_threshold: None,
            system_prompt: None,
        }
    }

    pub fn with_consensus_threshold(mut self, threshold: usize) -> Self {
        self.consensus_threshold = Some(threshold);
        self
    }

    /// Consensus threshold, falling back to the default
    pub fn threshold(&self) -> usize {
        self.consensus_threshold
            .unwrap_or(DEFAULT_CONSENSUS_THRESHOLD)
    }

    pub fn to_request(&self) -> Request {
        let request = Request::new(self.prompt.clone());
        match &self.system_prompt {
            Some(system) => request.with_system_prompt(system.clone()),
            None => request,
        }
    }
}
