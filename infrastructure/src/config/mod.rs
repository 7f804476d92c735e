//! Configuration file loading for switchboard
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `SWITCHBOARD_`-prefixed environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./switchboard.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/switchboard/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileModelConfig, FileOrchestrationConfig,
    FileProviderConfig, FileStoreConfig, default_providers,
};
pub use loader::ConfigLoader;
