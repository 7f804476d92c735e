//! Infrastructure layer for switchboard
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod gateway;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use gateway::{Credentials, HttpProviderGateway};
pub use store::{JsonlRecordStore, MemoryRecordStore};
pub use tools::builtin_registry;
