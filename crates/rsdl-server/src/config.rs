//! Configuration management for request-scoped loaders.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use rsdl_server::config::LoaderSettings;
//!
//! // Load from file with env overrides
//! let settings = LoaderSettings::load("loaders.yaml")?;
//!
//! // Or load from environment only
//! let settings = LoaderSettings::from_env()?;
//!
//! let registry = ProviderRegistry::with_batch_config(settings.batch.to_batch_config());
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use rsdl_domain::batch::BatchConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `RSDL_BATCH__DELAY_MS`.
pub const ENV_PREFIX: &str = "RSDL";

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LoaderSettings {
    /// Batching behaviour applied to query loaders
    #[serde(default)]
    pub batch: BatchSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Error rendering settings
    #[serde(default)]
    pub errors: ErrorSettings,
}

/// Batching settings.
///
/// Environment overrides:
///
/// - `RSDL_BATCH__DELAY_MS=5` - widen the coalescing window
/// - `RSDL_BATCH__MAX_BATCH_SIZE=100` - cap keys per fetch
/// - `RSDL_BATCH__CACHE=false` - refetch keys on every batch
///
/// # Example YAML Configuration
///
/// ```yaml
/// batch:
///   delay_ms: 2
///   max_batch_size: 100
///   cache: true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BatchSettings {
    /// Coalescing window in milliseconds. Zero dispatches on the next timer tick.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Maximum keys per batch function call (unbounded when absent)
    #[serde(default)]
    pub max_batch_size: Option<usize>,

    /// Memoize resolved keys for the rest of the request
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_batch_size: None,
            cache: true,
        }
    }
}

impl BatchSettings {
    /// Converts into the batcher's configuration type.
    pub fn to_batch_config(&self) -> BatchConfig {
        let config = BatchConfig::default()
            .with_delay(Duration::from_millis(self.delay_ms))
            .with_cache(self.cache);
        match self.max_batch_size {
            Some(max) => config.with_max_batch_size(max),
            None => config,
        }
    }
}

fn default_delay_ms() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error rendering settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ErrorSettings {
    /// Include loader names and key values in error responses
    #[serde(default)]
    pub detailed: bool,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl LoaderSettings {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `RSDL_` and use `__` as separator.
    /// For example `RSDL_BATCH__DELAY_MS=5` overrides `batch.delay_ms`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&LoaderSettings::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let settings: LoaderSettings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&LoaderSettings::default())?)
            .add_source(env_source())
            .build()?;

        let settings: LoaderSettings = config.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.batch.max_batch_size == Some(0) {
            return Err(ConfigLoadError::Invalid {
                message: "batch.max_batch_size must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}

// Nested keys use __: RSDL_BATCH__DELAY_MS -> batch.delay_ms
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Test: Can load config from YAML file
    #[test]
    #[serial]
    fn test_can_load_config_from_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
batch:
  delay_ms: 5
  max_batch_size: 100
  cache: false

logging:
  level: debug
  json: true

errors:
  detailed: true
"#
        )
        .unwrap();

        let settings = LoaderSettings::load(file.path()).unwrap();

        assert_eq!(settings.batch.delay_ms, 5);
        assert_eq!(settings.batch.max_batch_size, Some(100));
        assert!(!settings.batch.cache);
        assert_eq!(settings.logging.level, "debug");
        assert!(settings.logging.json);
        assert!(settings.errors.detailed);
    }

    /// Test: Can override config with env vars
    #[test]
    #[serial]
    fn test_can_override_config_with_env_vars() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
batch:
  delay_ms: 5

logging:
  level: info
"#
        )
        .unwrap();

        std::env::set_var("RSDL_BATCH__DELAY_MS", "20");
        std::env::set_var("RSDL_LOGGING__LEVEL", "warn");

        let settings = LoaderSettings::load(file.path()).unwrap();

        std::env::remove_var("RSDL_BATCH__DELAY_MS");
        std::env::remove_var("RSDL_LOGGING__LEVEL");

        assert_eq!(settings.batch.delay_ms, 20);
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.batch.cache); // default
    }

    /// Test: Config validation catches errors
    #[test]
    fn test_config_validation_catches_errors() {
        let mut settings = LoaderSettings::default();
        settings.batch.max_batch_size = Some(0);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("batch.max_batch_size"));

        let mut settings = LoaderSettings::default();
        settings.logging.level = "invalid".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        let mut settings = LoaderSettings::default();
        settings.logging.level = "DEBUG".to_string();
        assert!(settings.validate().is_ok());
    }

    /// Test: Invalid config returns clear error
    #[test]
    fn test_invalid_config_returns_clear_error() {
        let result = LoaderSettings::load("/nonexistent/path/loaders.yaml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileNotFound { .. }));
        assert!(err.to_string().contains("not found"));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: syntax: [").unwrap();

        let err = LoaderSettings::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Load(_)));
    }

    /// Test: Default config is valid
    #[test]
    fn test_default_config_is_valid() {
        let settings = LoaderSettings::default();
        assert!(settings.validate().is_ok());

        assert_eq!(settings.batch.delay_ms, 1);
        assert_eq!(settings.batch.max_batch_size, None);
        assert!(settings.batch.cache);
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.errors.detailed);
    }

    /// Test: from_env loads defaults with env overrides
    #[test]
    #[serial]
    fn test_from_env_loads_defaults_with_env_overrides() {
        std::env::set_var("RSDL_BATCH__CACHE", "false");

        let settings = LoaderSettings::from_env().unwrap();

        std::env::remove_var("RSDL_BATCH__CACHE");

        assert!(!settings.batch.cache);
        assert_eq!(settings.batch.delay_ms, 1); // default
    }

    #[test]
    fn test_batch_settings_convert_to_batch_config() {
        let settings = BatchSettings {
            delay_ms: 3,
            max_batch_size: Some(25),
            cache: false,
        };

        let config = settings.to_batch_config();

        assert_eq!(config.delay, Duration::from_millis(3));
        assert_eq!(config.max_batch_size, Some(25));
        assert!(!config.cache);
        assert_eq!(BatchSettings::default().to_batch_config(), BatchConfig::default());
    }
}
