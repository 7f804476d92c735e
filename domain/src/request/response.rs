//! Normalized response produced once per successful call.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    /// Map the provider vocabulary (OpenAI and Anthropic) onto ours.
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "stop" | "end_turn" | "stop_sequence" => FinishReason::Stop,
            "length" | "max_tokens" => FinishReason::Length,
            "tool_calls" | "function_call" | "tool_use" => FinishReason::ToolCalls,
            "content_filter" | "refusal" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Normalized response of one successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub usage: Usage,
    pub finish_reason: FinishReason,
    /// Wall-clock time of the provider call
    #[serde(with = "duration_ms")]
    pub latency: Duration,
    /// Cost in USD computed from usage and provider pricing
    pub cost: f64,
    pub provider_id: String,
    pub model_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Response {
    pub fn latency_ms(&self) -> u128 {
        self.latency.as_millis()
    }
}

/// Serialize durations as integer milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_total_is_sum() {
        assert_eq!(Usage::new(12, 30).total_tokens, 42);
    }

    #[test]
    fn finish_reason_vocabulary() {
        assert_eq!(FinishReason::from_provider("end_turn"), FinishReason::Stop);
        assert_eq!(FinishReason::from_provider("max_tokens"), FinishReason::Length);
        assert_eq!(FinishReason::from_provider("tool_use"), FinishReason::ToolCalls);
        assert_eq!(
            FinishReason::from_provider("weird"),
            FinishReason::Other("weird".to_string())
        );
    }

    #[test]
    fn latency_serializes_as_millis() {
        let response = Response {
            content: "ok".to_string(),
            usage: Usage::new(1, 1),
            finish_reason: FinishReason::Stop,
            latency: Duration::from_millis(250),
            cost: 0.0,
            provider_id: "p".to_string(),
            model_id: "m".to_string(),
            metadata: serde_json::Value::Null,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["latency"], 250);
    }
}
