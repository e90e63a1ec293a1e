//! Configuration Loader
//!
//! Environment-aware configuration loading. Layers, lowest precedence first:
//! built-in defaults, `relay-config.yaml`, `relay-config.<env>.yaml`, and
//! `RELAY__SECTION__KEY` environment variables.

use super::error::{ConfigResult, ConfigurationError};
use super::RelayConfig;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAMES: [&str; 2] = ["relay-config.yaml", "relay-config.yml"];

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: RelayConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for testing without modifying global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading relay configuration"
        );

        let config_file = Self::find_config_file(&config_directory)?;
        let config = Self::load_and_merge_config(&config_file, &config_directory, environment)?;
        config.validate()?;

        info!(
            environment = %environment,
            executors = config.executors.len(),
            probe_interval_seconds = config.health.probe_interval_seconds,
            snapshot_interval_seconds = config.monitor.snapshot_interval_seconds,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Load from disk, falling back to defaults when no configuration file exists.
    /// Files that exist but fail to parse or validate are still reported as errors.
    pub fn load_or_default(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        match Self::load_from_directory(config_dir.clone()) {
            Err(ConfigurationError::ConfigFileNotFound { searched_paths }) => {
                warn!(
                    searched = ?searched_paths,
                    "No configuration file found, starting with defaults"
                );
                Ok(Arc::new(Self::from_config(
                    RelayConfig::default(),
                    config_dir.unwrap_or_else(Self::default_config_directory),
                )))
            }
            other => other,
        }
    }

    /// Wrap an in-memory configuration (tests and embedders building config in code)
    pub fn from_config(config: RelayConfig, config_directory: PathBuf) -> ConfigManager {
        ConfigManager {
            config,
            environment: Self::detect_environment(),
            config_directory,
        }
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment: RELAY_ENV || APP_ENV || 'development'
    pub(crate) fn detect_environment() -> String {
        env::var("RELAY_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("RELAY_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    /// Find the base configuration file
    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let mut searched_paths = Vec::new();

        for name in CONFIG_FILE_NAMES {
            let config_path = config_directory.join(name);
            searched_paths.push(config_path.clone());

            if config_path.exists() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    fn load_and_merge_config(
        config_file: &Path,
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<RelayConfig> {
        let overlay = config_directory.join(format!("relay-config.{environment}.yaml"));
        if overlay.exists() {
            debug!("Applying environment overlay: {}", overlay.display());
        }

        let layered = Config::builder()
            .add_source(File::from(config_file).format(FileFormat::Yaml))
            .add_source(File::from(overlay.as_path()).format(FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigurationError::invalid_format(config_file.display().to_string(), e))?;

        layered
            .try_deserialize::<RelayConfig>()
            .map_err(|e| ConfigurationError::invalid_format(config_file.display().to_string(), e))
    }
}
