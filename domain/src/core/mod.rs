//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: the error taxonomy every fallible operation returns
//! - [`error::ProviderStatus`]: status detail for failed provider calls

pub mod error;
