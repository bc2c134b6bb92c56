//! Configuration module for custom-filter
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/custom-filter/custom-filter.cfg)
//! - User configuration (~/.custom-filter.cfg)
//! - Project configuration (./custom-filter.cfg)
//! - Environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter plugin settings
    pub filters: FiltersConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Filter plugin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Filter modules installed into the template environment
    pub enabled: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            enabled: vec![crate::plugins::filter::custom::MODULE_NAME.to_string()],
        }
    }
}

/// Colors configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colors
    pub enabled: bool,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when neither `-v` nor `RUST_LOG` is given
    pub log_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            } else if config_path == Some(&path) {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/custom-filter/custom-filter.cfg")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".custom-filter.cfg"));
        }

        paths.push(PathBuf::from("custom-filter.cfg"));
        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: PartialConfig = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content)?,
            _ => {
                // Try TOML first (for .cfg files), then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        Ok(self.merge(file_config))
    }

    /// Merge a config file over this one; only keys present in the file win.
    fn merge(&self, other: PartialConfig) -> Config {
        let mut merged = self.clone();
        if let Some(filters) = other.filters {
            if let Some(enabled) = filters.enabled {
                merged.filters.enabled = enabled;
            }
        }
        if let Some(colors) = other.colors {
            if let Some(enabled) = colors.enabled {
                merged.colors.enabled = enabled;
            }
        }
        if let Some(logging) = other.logging {
            if let Some(level) = logging.log_level {
                merged.logging.log_level = level;
            }
        }
        merged
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // CUSTOM_FILTER_FILTER_MODULES
        if let Ok(modules) = std::env::var("CUSTOM_FILTER_FILTER_MODULES") {
            self.filters.enabled = modules
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        // CUSTOM_FILTER_LOG_LEVEL
        if let Ok(level) = std::env::var("CUSTOM_FILTER_LOG_LEVEL") {
            self.logging.log_level = level;
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() || std::env::var("CUSTOM_FILTER_NO_COLOR").is_ok() {
            self.colors.enabled = false;
        }
    }

    /// Load from a specific file, without the standard locations or environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Config::default().merge_from_file(path.as_ref())
    }
}

/// Config file contents, where every key is optional.
#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    filters: Option<PartialFilters>,
    colors: Option<PartialColors>,
    logging: Option<PartialLogging>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialFilters {
    enabled: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialColors {
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialLogging {
    log_level: Option<String>,
}
