//! Capability predicates over catalog models.

use super::provider::{Model, Provider};

/// Predicate used by [`ProviderCatalog::list_models`](super::ProviderCatalog::list_models)
/// and best-fit routing.
///
/// Every criterion left unset matches everything.
///
/// # Example
///
/// ```
/// use switchboard_domain::catalog::ModelFilter;
///
/// let filter = ModelFilter::new().with_vision().with_max_cost_tier(2);
/// assert!(filter.requires_vision);
/// assert_eq!(filter.max_cost_tier, Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFilter {
    pub provider: Option<String>,
    pub requires_vision: bool,
    pub requires_tools: bool,
    pub requires_streaming: bool,
    pub max_cost_tier: Option<u8>,
    pub min_context_window: Option<u32>,
    pub tag: Option<String>,
}

impl ModelFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_vision(mut self) -> Self {
        self.requires_vision = true;
        self
    }

    pub fn with_tools(mut self) -> Self {
        self.requires_tools = true;
        self
    }

    pub fn with_streaming(mut self) -> Self {
        self.requires_streaming = true;
        self
    }

    pub fn with_max_cost_tier(mut self, tier: u8) -> Self {
        self.max_cost_tier = Some(tier);
        self
    }

    pub fn with_min_context_window(mut self, tokens: u32) -> Self {
        self.min_context_window = Some(tokens);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Check a model (and its owning provider) against every criterion.
    pub fn matches(&self, provider: &Provider, model: &Model) -> bool {
        if self.provider.as_deref().is_some_and(|p| p != provider.id) {
            return false;
        }
        let caps = &provider.capabilities;
        if (self.requires_vision && !caps.vision)
            || (self.requires_tools && !caps.tools)
            || (self.requires_streaming && !caps.streaming)
        {
            return false;
        }
        if self.max_cost_tier.is_some_and(|tier| model.cost_tier > tier) {
            return false;
        }
        if self
            .min_context_window
            .is_some_and(|tokens| model.context_window < tokens)
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !model.has_tag(tag)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::provider::{Capabilities, Endpoint, ProviderApi};

    fn provider(vision: bool) -> Provider {
        Provider::new(
            "p",
            "P",
            Endpoint::new("http://localhost", ProviderApi::OpenAi),
        )
        .with_capabilities(Capabilities {
            streaming: true,
            vision,
            tools: false,
        })
    }

    #[test]
    fn empty_filter_matches_everything() {
        let p = provider(false);
        assert!(ModelFilter::new().matches(&p, &Model::new("m").with_cost_tier(9)));
    }

    #[test]
    fn capability_flags_come_from_provider() {
        let m = Model::new("m");
        assert!(ModelFilter::new().with_vision().matches(&provider(true), &m));
        assert!(!ModelFilter::new().with_vision().matches(&provider(false), &m));
        assert!(!ModelFilter::new().with_tools().matches(&provider(true), &m));
    }

    #[test]
    fn cost_tier_and_context_bounds() {
        let p = provider(false);
        let cheap = Model::new("cheap").with_cost_tier(1).with_context_window(8_000);
        let big = Model::new("big").with_cost_tier(4).with_context_window(200_000);

        let filter = ModelFilter::new().with_max_cost_tier(2);
        assert!(filter.matches(&p, &cheap));
        assert!(!filter.matches(&p, &big));

        let filter = ModelFilter::new().with_min_context_window(100_000);
        assert!(!filter.matches(&p, &cheap));
        assert!(filter.matches(&p, &big));
    }

    #[test]
    fn tag_and_provider_criteria() {
        let p = provider(false);
        let m = Model::new("coder").with_tag("Code");
        assert!(ModelFilter::new().with_tag("code").matches(&p, &m));
        assert!(!ModelFilter::new().with_tag("chat").matches(&p, &m));
        assert!(!ModelFilter::new().with_provider("other").matches(&p, &m));
    }
}
