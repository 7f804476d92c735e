//! Provider configuration from TOML (`[[providers]]` array)

use serde::{Deserialize, Serialize};
use switchboard_domain::{
    AuthRequirement, Capabilities, Endpoint, Model, Pricing, Provider, ProviderApi, RateLimit,
};

/// One `[[providers]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileProviderConfig {
    pub id: String,
    /// Display name (default: the id)
    #[serde(default)]
    pub name: Option<String>,
    /// Wire format: "openai" or "anthropic"
    #[serde(default)]
    pub api: ProviderApi,
    pub base_url: String,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Direct API key (not recommended; use `api_key_env` instead)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub rate_limit: RateLimit,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub models: Vec<FileModelConfig>,
}

/// One `[[providers.models]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileModelConfig {
    pub id: String,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub context_window: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cost_tier: u8,
}

impl FileModelConfig {
    fn to_model(&self) -> Model {
        let mut model = Model::new(self.id.clone()).with_cost_tier(self.cost_tier);
        if let Some(tokens) = self.max_output_tokens {
            model = model.with_max_output_tokens(tokens);
        }
        if let Some(tokens) = self.context_window {
            model = model.with_context_window(tokens);
        }
        for tag in &self.tags {
            model = model.with_tag(tag.clone());
        }
        model
    }
}

impl FileProviderConfig {
    pub fn auth(&self) -> AuthRequirement {
        match (&self.api_key_env, &self.api_key) {
            (Some(env), _) => AuthRequirement::ApiKey { env: env.clone() },
            (None, Some(_)) => AuthRequirement::ApiKey {
                env: format!("{}_API_KEY", self.id.to_uppercase().replace('-', "_")),
            },
            (None, None) => AuthRequirement::None,
        }
    }

    pub fn to_provider(&self) -> Provider {
        let endpoint = Endpoint::new(self.base_url.clone(), self.api);
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        self.models.iter().fold(
            Provider::new(self.id.clone(), name, endpoint)
                .with_auth(self.auth())
                .with_rate_limit(self.rate_limit)
                .with_pricing(self.pricing)
                .with_capabilities(self.capabilities),
            |provider, model| provider.with_model(model.to_model()),
        )
    }
}

fn model(id: &str, cost_tier: u8, context_window: u32, max_output_tokens: u32) -> FileModelConfig {
    FileModelConfig {
        id: id.to_string(),
        max_output_tokens: Some(max_output_tokens),
        context_window: Some(context_window),
        tags: vec!["general".to_string()],
        cost_tier,
    }
}

/// Providers available without any configuration file.
pub fn default_providers() -> Vec<FileProviderConfig> {
    vec![
        FileProviderConfig {
            id: "openai".to_string(),
            name: Some("OpenAI".to_string()),
            api: ProviderApi::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            api_key: None,
            rate_limit: RateLimit::new(60, 60_000),
            pricing: Pricing::new(0.0025, 0.01),
            capabilities: Capabilities::all(),
            models: vec![
                model("gpt-4o-mini", 1, 128_000, 16_384),
                model("gpt-4o", 2, 128_000, 16_384),
            ],
        },
        FileProviderConfig {
            id: "anthropic".to_string(),
            name: Some("Anthropic".to_string()),
            api: ProviderApi::Anthropic,
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            api_key: None,
            rate_limit: RateLimit::new(50, 60_000),
            pricing: Pricing::new(0.003, 0.015),
            capabilities: Capabilities::all(),
            models: vec![
                model("claude-3-5-haiku-latest", 1, 200_000, 8_192),
                model("claude-3-5-sonnet-latest", 2, 200_000, 8_192),
            ],
        },
    ]
}
