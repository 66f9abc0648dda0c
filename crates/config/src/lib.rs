#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkgcheck
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pkgcheck/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use pkgcheck_errors::{ConfigError, Error};
use pkgcheck_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub baselines: BaselineConfig,

    #[serde(default)]
    pub checks: ChecksConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// Never contact baseline services; dependent checks are skipped
    #[serde(default)]
    pub offline: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Delay before each retry; the attempt count is one more than its length
    #[serde(default = "default_retry_delays")]
    pub retry_delays_ms: Vec<u64>,
}

/// Baseline service locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaselineConfig {
    /// Registry serving published manifests at `{registry_url}/{name}/{version}`
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    /// Directory serving `{YEAR.MINOR}.json` built-in package lists
    #[serde(default)]
    pub builtins_url: Option<String>,
    /// Location of the confidential-content index blob
    #[serde(default)]
    pub confidential_url: Option<String>,
}

/// Check selection
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ChecksConfig {
    /// Check identifiers reported as skipped instead of being evaluated
    #[serde(default)]
    pub exclude: Vec<String>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::Text,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            offline: false,
            timeout_secs: default_timeout(),
            retry_delays_ms: default_retry_delays(),
        }
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            registry_url: default_registry_url(),
            builtins_url: None,
            confidential_url: None,
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Text
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_delays() -> Vec<u64> {
    vec![10, 100, 1_000, 10_000]
}

fn default_registry_url() -> String {
    "https://packages.unity.com".to_string()
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("pkgcheck").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading configuration");
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load(),
        }
    }

    /// Reject values that parse but cannot be used
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.network.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "network.timeout_secs must be positive".to_string(),
            }
            .into());
        }
        if self.baselines.registry_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "baselines.registry_url must not be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// Merge values from an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds a value of the wrong shape.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PKGCHECK_OUTPUT
        if let Some(output) = lookup("PKGCHECK_OUTPUT") {
            self.general.output = match output.as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PKGCHECK_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // PKGCHECK_OFFLINE
        if let Some(offline) = lookup("PKGCHECK_OFFLINE") {
            self.network.offline = match offline.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PKGCHECK_OFFLINE".to_string(),
                        value: offline,
                    }
                    .into())
                }
            };
        }

        // PKGCHECK_REGISTRY_URL
        if let Some(url) = lookup("PKGCHECK_REGISTRY_URL") {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "PKGCHECK_REGISTRY_URL".to_string(),
                    value: url,
                }
                .into());
            }
            self.baselines.registry_url = url;
        }

        // PKGCHECK_EXCLUDE, comma-separated and added to the configured list
        if let Some(exclude) = lookup("PKGCHECK_EXCLUDE") {
            for id in exclude.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                if !self.checks.exclude.iter().any(|e| e == id) {
                    self.checks.exclude.push(id.to_string());
                }
            }
        }

        Ok(())
    }
}
