//! Provider and model descriptions.
//!
//! These are plain data: adding a provider or a model is a configuration
//! change, never a code change.

use crate::request::Usage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire protocol spoken by a provider endpoint.
///
/// Selects the adapter used to shape requests and normalize responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderApi {
    /// OpenAI-compatible `/chat/completions` (OpenAI, OpenRouter, Groq, vLLM, Ollama, ...)
    #[default]
    OpenAi,
    /// Anthropic `/v1/messages`
    Anthropic,
}

impl std::fmt::Display for ProviderApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderApi::OpenAi => write!(f, "openai"),
            ProviderApi::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Where and how a provider is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub base_url: String,
    #[serde(default)]
    pub api: ProviderApi,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, api: ProviderApi) -> Self {
        Self {
            base_url: base_url.into(),
            api,
        }
    }
}

/// Authentication a provider expects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthRequirement {
    /// Local or open endpoints
    #[default]
    None,
    /// Bearer/API key read from the named environment variable
    ApiKey { env: String },
}

impl AuthRequirement {
    pub fn is_required(&self) -> bool {
        !matches!(self, AuthRequirement::None)
    }
}

/// Fixed-window request budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    /// Requests admitted per window
    pub requests: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl RateLimit {
    pub fn new(requests: u32, window_ms: u64) -> Self {
        Self {
            requests,
            window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(60, 60_000)
    }
}

/// Price per 1k tokens, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Pricing {
    pub fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Cost of a usage report.
    ///
    /// Never negative: negative or NaN prices contribute nothing.
    pub fn cost_of(&self, usage: &Usage) -> f64 {
        let input = non_negative(self.input_per_1k);
        let output = non_negative(self.output_per_1k);
        usage.prompt_tokens as f64 / 1000.0 * input
            + usage.completion_tokens as f64 / 1000.0 * output
    }
}

fn non_negative(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}

/// Capability flags advertised by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub streaming: bool,
    pub vision: bool,
    pub tools: bool,
}

impl Capabilities {
    /// Number of flags this set can hold
    pub const TOTAL: usize = 3;

    pub fn all() -> Self {
        Self {
            streaming: true,
            vision: true,
            tools: true,
        }
    }

    /// Number of enabled flags
    pub fn count(&self) -> usize {
        [self.streaming, self.vision, self.tools]
            .iter()
            .filter(|flag| **flag)
            .count()
    }
}

/// A named inference target under a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Globally unique model id (e.g. "gpt-4o")
    pub id: String,
    /// Owning provider; filled in when the model is attached to a provider
    #[serde(default)]
    pub provider_id: String,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_context_window")]
    pub context_window: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ordinal cost class; lower is cheaper
    #[serde(default)]
    pub cost_tier: u8,
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_context_window() -> u32 {
    8192
}

impl Model {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider_id: String::new(),
            max_output_tokens: default_max_output_tokens(),
            context_window: default_context_window(),
            tags: Vec::new(),
            cost_tier: 0,
        }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = tokens;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_cost_tier(mut self, tier: u8) -> Self {
        self.cost_tier = tier;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// An external organization/endpoint exposing one or more models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub models: Vec<Model>,
    pub endpoint: Endpoint,
    #[serde(default)]
    pub auth: AuthRequirement,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub capabilities: Capabilities,
}

impl Provider {
    pub fn new(id: impl Into<String>, name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            models: Vec::new(),
            endpoint,
            auth: AuthRequirement::None,
            rate_limit: RateLimit::default(),
            pricing: Pricing::default(),
            capabilities: Capabilities::default(),
        }
    }

    /// Attach a model, stamping it with this provider's id.
    pub fn with_model(mut self, mut model: Model) -> Self {
        model.provider_id = self.id.clone();
        self.models.push(model);
        self
    }

    pub fn with_auth(mut self, auth: AuthRequirement) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_of_usage() {
        let pricing = Pricing::new(0.5, 1.5);
        let usage = Usage::new(2000, 1000);
        assert!((pricing.cost_of(&usage) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        let pricing = Pricing::new(3.0, 15.0);
        assert_eq!(pricing.cost_of(&Usage::default()), 0.0);
    }

    #[test]
    fn test_negative_price_never_yields_negative_cost() {
        let pricing = Pricing::new(-1.0, f64::NAN);
        assert_eq!(pricing.cost_of(&Usage::new(1000, 1000)), 0.0);
    }

    #[test]
    fn test_with_model_stamps_provider_id() {
        let provider = Provider::new(
            "openai",
            "OpenAI",
            Endpoint::new("https://api.openai.com/v1", ProviderApi::OpenAi),
        )
        .with_model(Model::new("gpt-4o").with_cost_tier(3));

        assert_eq!(provider.models[0].provider_id, "openai");
        assert!(provider.model("gpt-4o").is_some());
        assert!(provider.model("gpt-5").is_none());
    }

    #[test]
    fn test_capability_count() {
        assert_eq!(Capabilities::default().count(), 0);
        assert_eq!(Capabilities::all().count(), Capabilities::TOTAL);
    }

    #[test]
    fn test_provider_api_serde_names() {
        let api: ProviderApi = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(api, ProviderApi::Anthropic);
        assert_eq!(serde_json::to_string(&ProviderApi::OpenAi).unwrap(), "\"openai\"");
    }
}
