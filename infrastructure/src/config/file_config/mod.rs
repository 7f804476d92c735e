//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod orchestration;
mod providers;
mod store;

pub use orchestration::FileOrchestrationConfig;
pub use providers::{FileModelConfig, FileProviderConfig, default_providers};
pub use store::FileStoreConfig;

use crate::gateway::Credentials;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use switchboard_domain::ProviderCatalog;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("orchestration.call_timeout_ms cannot be 0")]
    InvalidTimeout,

    #[error("orchestration.consensus_threshold cannot be 0")]
    InvalidThreshold,

    #[error("provider id cannot be empty")]
    EmptyProviderId,

    #[error("duplicate provider id '{0}'")]
    DuplicateProvider(String),

    #[error("provider '{0}' has an empty model id")]
    EmptyModelId(String),

    #[error("model '{0}' is declared more than once")]
    DuplicateModel(String),

    #[error("provider '{0}': rate_limit requests and window_ms must be greater than 0")]
    InvalidRateLimit(String),

    #[error("provider '{0}': prices cannot be negative")]
    NegativePrice(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Router deadline and strategy/chain defaults
    pub orchestration: FileOrchestrationConfig,
    /// Record store location
    pub store: FileStoreConfig,
    /// Provider catalog
    pub providers: Vec<FileProviderConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            orchestration: FileOrchestrationConfig::default(),
            store: FileStoreConfig::default(),
            providers: default_providers(),
        }
    }
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.orchestration.call_timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.orchestration.consensus_threshold == 0 {
            return Err(ConfigValidationError::InvalidThreshold);
        }

        let mut provider_ids = HashSet::new();
        let mut model_ids = HashSet::new();
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(ConfigValidationError::EmptyProviderId);
            }
            if !provider_ids.insert(provider.id.as_str()) {
                return Err(ConfigValidationError::DuplicateProvider(provider.id.clone()));
            }
            if provider.rate_limit.requests == 0 || provider.rate_limit.window_ms == 0 {
                return Err(ConfigValidationError::InvalidRateLimit(provider.id.clone()));
            }
            if provider.pricing.input_per_1k < 0.0 || provider.pricing.output_per_1k < 0.0 {
                return Err(ConfigValidationError::NegativePrice(provider.id.clone()));
            }
            for model in &provider.models {
                if model.id.trim().is_empty() {
                    return Err(ConfigValidationError::EmptyModelId(provider.id.clone()));
                }
                if !model_ids.insert(model.id.as_str()) {
                    return Err(ConfigValidationError::DuplicateModel(model.id.clone()));
                }
            }
        }

        Ok(())
    }

    pub fn to_catalog(&self) -> ProviderCatalog {
        ProviderCatalog::from_providers(self.providers.iter().map(FileProviderConfig::to_provider))
    }

    /// API keys given directly in the file
    pub fn credentials(&self) -> Credentials {
        self.providers
            .iter()
            .filter_map(|p| p.api_key.clone().map(|key| (p.id.clone(), key)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_domain::{AuthRequirement, ModelFilter, ProviderApi};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[orchestration]
call_timeout_ms = 5000
consensus_threshold = 3
merge_separator = "\n\n"

[store]
path = "/tmp/switchboard"

[[providers]]
id = "local"
api = "openai"
base_url = "http://localhost:11434/v1"
rate_limit = { requests = 5, window_ms = 1000 }
pricing = { input_per_1k = 0.0, output_per_1k = 0.0 }

[[providers.models]]
id = "llama3"
context_window = 8192
tags = ["local"]

[[providers]]
id = "claude"
api = "anthropic"
base_url = "https://api.anthropic.com"
api_key_env = "ANTHROPIC_API_KEY"
capabilities = { vision = true }

[[providers.models]]
id = "claude-3-5-haiku-latest"
cost_tier = 1
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.orchestration.call_timeout_ms, 5000);
        assert_eq!(config.orchestration.to_params().consensus_threshold, 3);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[1].api, ProviderApi::Anthropic);

        let catalog = config.to_catalog();
        let (provider, model) = catalog.resolve("llama3").unwrap();
        assert_eq!(provider.id, "local");
        assert_eq!(provider.auth, AuthRequirement::None);
        assert_eq!(provider.rate_limit.requests, 5);
        assert!(model.has_tag("local"));

        let vision = catalog.list_models(&ModelFilter::new().with_vision());
        assert_eq!(vision.len(), 1);
        assert_eq!(vision[0].id, "claude-3-5-haiku-latest");
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[orchestration]
call_timeout_ms = 1500
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestration.call_timeout_ms, 1500);
        // Defaults should apply
        assert_eq!(config.orchestration.consensus_threshold, 2);
        assert_eq!(config.orchestration.merge_separator, "\n\n---\n\n");
        assert_eq!(config.providers, default_providers());
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.store.path.is_none());
        let catalog = config.to_catalog();
        assert!(catalog.resolve("gpt-4o-mini").is_ok());
        assert!(catalog.resolve("claude-3-5-haiku-latest").is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = FileConfig::default();
        config.orchestration.call_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validate_zero_rate_limit() {
        let mut config = FileConfig::default();
        config.providers[0].rate_limit.requests = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::InvalidRateLimit("openai".to_string()))
        );
    }

    #[test]
    fn test_validate_duplicate_model() {
        let mut config = FileConfig::default();
        let duplicate = config.providers[0].models[0].clone();
        config.providers[1].models.push(duplicate);
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DuplicateModel("gpt-4o-mini".to_string()))
        );
    }

    #[test]
    fn test_validate_empty_ids_and_prices() {
        let mut config = FileConfig::default();
        config.providers[0].models[0].id = " ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelId("openai".to_string()))
        );

        let mut config = FileConfig::default();
        config.providers[1].pricing.output_per_1k = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::NegativePrice("anthropic".to_string()))
        );

        let mut config = FileConfig::default();
        config.providers[0].id = String::new();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyProviderId));
    }

    #[test]
    fn test_credentials_from_file() {
        let toml_str = r#"
[[providers]]
id = "local"
base_url = "http://localhost:8000/v1"
api_key = "sk-local"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.credentials().get("local").map(String::as_str), Some("sk-local"));
        assert!(config.providers[0].auth().is_required());
    }
}
