//! Provider catalog: the registry of providers and the models they expose.

use super::filter::ModelFilter;
use super::provider::{Model, Provider};
use crate::core::error::DomainError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of providers indexed by provider id and by model id.
///
/// Explicitly constructed and shared by `Arc` handle; writes happen while
/// wiring the application, reads on every call.
///
/// # Example
///
/// ```
/// use switchboard_domain::catalog::{Endpoint, Model, Provider, ProviderApi, ProviderCatalog};
///
/// let mut catalog = ProviderCatalog::new();
/// catalog.register(
///     Provider::new("local", "Local", Endpoint::new("http://localhost:11434/v1", ProviderApi::OpenAi))
///         .with_model(Model::new("llama3")),
/// );
///
/// let (provider, model) = catalog.resolve("llama3").unwrap();
/// assert_eq!(provider.id, "local");
/// assert_eq!(model.id, "llama3");
/// ```
#[derive(Debug, Default, Clone)]
pub struct ProviderCatalog {
    providers: HashMap<String, Arc<Provider>>,
    /// Model id -> owning provider id
    model_index: HashMap<String, String>,
    /// Registration order, for stable listings
    order: Vec<String>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of providers.
    pub fn from_providers(providers: impl IntoIterator<Item = Provider>) -> Self {
        let mut catalog = Self::new();
        for provider in providers {
            catalog.register(provider);
        }
        catalog
    }

    /// Add or replace a provider and index its models.
    ///
    /// Re-registering the same id replaces the previous entry, including
    /// dropping index entries for models the new version no longer lists.
    /// Models are stamped with the provider id.
    pub fn register(&mut self, mut provider: Provider) {
        for model in &mut provider.models {
            model.provider_id = provider.id.clone();
        }

        if self.providers.remove(&provider.id).is_some() {
            let released: Vec<String> = self
                .model_index
                .iter()
                .filter(|(_, owner)| **owner == provider.id)
                .map(|(model_id, _)| model_id.clone())
                .collect();
            self.model_index.retain(|_, owner| *owner != provider.id);

            // Hand released ids back to the latest other provider still listing them
            for model_id in released {
                let fallback = self
                    .order
                    .iter()
                    .rev()
                    .find(|id| {
                        self.providers
                            .get(*id)
                            .is_some_and(|p| p.model(&model_id).is_some())
                    })
                    .cloned();
                if let Some(owner) = fallback {
                    self.model_index.insert(model_id, owner);
                }
            }
        } else {
            self.order.push(provider.id.clone());
        }

        for model in &provider.models {
            self.model_index
                .insert(model.id.clone(), provider.id.clone());
        }
        self.providers
            .insert(provider.id.clone(), Arc::new(provider));
    }

    /// Resolve a model id to its provider and model description.
    pub fn resolve(&self, model_id: &str) -> Result<(Arc<Provider>, Model), DomainError> {
        self.model_index
            .get(model_id)
            .and_then(|provider_id| self.providers.get(provider_id))
            .and_then(|provider| {
                provider
                    .model(model_id)
                    .map(|model| (Arc::clone(provider), model.clone()))
            })
            .ok_or_else(|| DomainError::UnknownModel(model_id.to_string()))
    }

    /// Models matching `filter`, cheapest cost tier first, then by id.
    pub fn list_models(&self, filter: &ModelFilter) -> Vec<&Model> {
        let mut models: Vec<&Model> = self
            .providers()
            .flat_map(|provider| {
                provider
                    .models
                    .iter()
                    .filter(move |model| filter.matches(provider, model))
            })
            // A model id re-registered under another provider is served by the newest owner
            .filter(|model| {
                self.model_index
                    .get(&model.id)
                    .is_some_and(|owner| *owner == model.provider_id)
            })
            .collect();
        models.sort_by(|a, b| a.cost_tier.cmp(&b.cost_tier).then_with(|| a.id.cmp(&b.id)));
        models
    }

    pub fn provider(&self, id: &str) -> Option<&Arc<Provider>> {
        self.providers.get(id)
    }

    /// Providers in registration order
    pub fn providers(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.order.iter().filter_map(|id| self.providers.get(id))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn model_count(&self) -> usize {
        self.model_index.len()
    }
}
