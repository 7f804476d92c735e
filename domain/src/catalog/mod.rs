//! Provider catalog domain
//!
//! Providers, the models they expose, their limits and pricing, and the
//! registry that resolves model ids.

pub mod filter;
pub mod provider;
pub mod registry;

pub use filter::ModelFilter;
pub use provider::{
    AuthRequirement, Capabilities, Endpoint, Model, Pricing, Provider, ProviderApi, RateLimit,
};
pub use registry::ProviderCatalog;
