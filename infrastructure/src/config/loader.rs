//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// Project-level config file name
const PROJECT_CONFIG: &str = "switchboard.toml";

/// Prefix for environment overrides (`SWITCHBOARD_ORCHESTRATION__CALL_TIMEOUT_MS=...`)
const ENV_PREFIX: &str = "SWITCHBOARD_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `SWITCHBOARD_`-prefixed environment variables (`__` separates sections)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./switchboard.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/switchboard/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let global = Self::global_config_path();
        let project = Self::project_config_path();
        Self::load_from(global.as_deref(), project.as_deref(), config_path.map(PathBuf::as_path))
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<FileConfig, Box<figment::Error>> {
        // A missing explicit file is an error, not a silent skip
        if let Some(path) = explicit
            && !path.exists()
        {
            return Err(Box::new(figment::Error::from(format!(
                "config file not found: {}",
                path.display()
            ))));
        }
        Self::figment(global, project, explicit)
            .extract()
            .map_err(Box::new)
    }

    fn figment(global: Option<&Path>, project: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/switchboard/config.toml if set,
    /// otherwise falls back to the platform config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("switchboard").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_CONFIG);
        path.exists().then_some(path)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(explicit: Option<&PathBuf>) {
        println!("Configuration sources (in priority order):");
        println!("  [ENV  ] {}*", ENV_PREFIX);

        if let Some(path) = explicit {
            let marker = if path.exists() { "FOUND" } else { "MISSING" };
            println!("  [{marker:<5}] Explicit: {}", path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./{}", PROJECT_CONFIG);
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                println!("  [FOUND] Global:  {}", path.display());
            } else {
                println!("  [     ] Global:  {}", path.display());
            }
        }

        println!("  [     ] Default: built-in defaults");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_toml(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.orchestration.call_timeout_ms, 60_000);
        assert_eq!(config.providers.len(), 2);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("switchboard"));
    }

    #[test]
    fn test_explicit_file_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_toml(
            &dir,
            "global.toml",
            "[orchestration]\ncall_timeout_ms = 1000\nconsensus_threshold = 4\n",
        );
        let explicit = write_toml(&dir, "explicit.toml", "[orchestration]\ncall_timeout_ms = 2500\n");

        let config = ConfigLoader::load_from(Some(&global), None, Some(&explicit)).unwrap();
        assert_eq!(config.orchestration.call_timeout_ms, 2500);
        // Untouched keys keep the lower layer's value
        assert_eq!(config.orchestration.consensus_threshold, 4);
    }

    #[test]
    fn test_providers_array_replaces_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let project = write_toml(
            &dir,
            "switchboard.toml",
            r#"
[[providers]]
id = "local"
base_url = "http://localhost:11434/v1"

[[providers.models]]
id = "llama3"
"#,
        );

        let config = ConfigLoader::load_from(None, Some(&project), None).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.providers.len(), 1);
        assert!(config.to_catalog().resolve("llama3").is_ok());
    }

    #[test]
    fn test_missing_layers_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let config = ConfigLoader::load_from(Some(&absent), Some(&absent), None).unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("absent.toml");
        let err = ConfigLoader::load_from(None, None, Some(&absent)).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_toml(&dir, "bad.toml", "[orchestration]\ncall_timeout_ms = \"soon\"\n");
        let result = ConfigLoader::load_from(None, None, Some(&path));
        assert!(result.is_err());
    }
}
