//! Configuration management for numscan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Command-line flags are applied on top by
//! the binary; nothing here is read as ambient state during a scan.

use crate::error::{ConfigError, ConfigResult};
use crate::types::OutputFormat;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/numscan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Worker pool and pacing settings
    pub scanning: ScanningConfig,
    /// Directory lookup service settings
    pub directory: DirectoryConfig,
    /// Result display and output file settings
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. A missing file is an error.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration (explicit path or default location) with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `NUMSCAN_CONCURRENCY`: Override worker count
    /// - `NUMSCAN_DELAY_MS`: Override per-worker delay between lookups
    /// - `NUMSCAN_DIRECTORY_URL`: Override directory service base URL
    /// - `NUMSCAN_DIRECTORY_TOKEN`: Override directory service bearer token
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup function.
    ///
    /// Values that fail to parse are ignored and logged.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("NUMSCAN_CONCURRENCY") {
            match val.parse() {
                Ok(concurrency) => {
                    self.scanning.concurrency = concurrency;
                    tracing::debug!("Override scanning.concurrency from env: {}", concurrency);
                }
                Err(_) => tracing::warn!("Ignoring invalid NUMSCAN_CONCURRENCY={}", val),
            }
        }

        if let Some(val) = lookup("NUMSCAN_DELAY_MS") {
            match val.parse() {
                Ok(delay_ms) => {
                    self.scanning.delay_ms = delay_ms;
                    tracing::debug!("Override scanning.delay_ms from env: {}", delay_ms);
                }
                Err(_) => tracing::warn!("Ignoring invalid NUMSCAN_DELAY_MS={}", val),
            }
        }

        if let Some(url) = lookup("NUMSCAN_DIRECTORY_URL") {
            tracing::debug!("Override directory.base_url from env: {}", url);
            self.directory.base_url = url;
        }

        if let Some(token) = lookup("NUMSCAN_DIRECTORY_TOKEN") {
            self.directory.api_token = Some(token);
        }
    }

    /// Check values that cannot be corrected silently.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.directory.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory.base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.scanning.max_candidates == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanning.max_candidates".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/numscan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "numscan", "numscan").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Worker pool and pacing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Number of parallel workers (values below 1 are treated as 1)
    pub concurrency: usize,
    /// Delay before each lookup, per worker, in milliseconds
    pub delay_ms: u64,
    /// Upper bound of the random jitter added to each delay, in milliseconds
    pub jitter_ms: u64,
    /// Timeout for a single lookup call in seconds (0 = none)
    pub lookup_timeout_secs: u64,
    /// Largest pattern expansion the scanner accepts
    pub max_candidates: u64,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            delay_ms: 200,
            jitter_ms: 100,
            lookup_timeout_secs: 30,
            max_candidates: 1_000_000,
        }
    }
}

/// Directory lookup service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL of the directory service
    pub base_url: String,
    /// Bearer token sent with every request
    pub api_token: Option<String>,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_token: None,
            connect_timeout_secs: 10,
            user_agent: concat!("numscan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Result display and output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// How found numbers are rendered
    pub format: OutputFormat,
    /// File receiving one rendered number per line
    pub output_file: Option<PathBuf>,
    /// Suffix appended by the `jid` output format
    pub jid_suffix: String,
    /// Print full outcome records and debug logs
    pub verbose: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::WaMe,
            output_file: None,
            jid_suffix: "@c.us".to_string(),
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scanning.concurrency, 1);
        assert_eq!(config.scanning.delay_ms, 200);
        assert_eq!(config.scanning.jitter_ms, 100);
        assert_eq!(config.output.format, OutputFormat::WaMe);
        assert_eq!(config.output.jid_suffix, "@c.us");
        assert!(config.directory.api_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[scanning]"));
        assert!(toml_str.contains("[directory]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("format = \"wa.me\""));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.scanning.concurrency = 8;
        config.output.format = OutputFormat::Pn;

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config");
        let loaded = AppConfig::load_from(&config_path).expect("load config");

        assert_eq!(loaded.scanning.concurrency, 8);
        assert_eq!(loaded.output.format, OutputFormat::Pn);
    }

    #[test]
    fn test_load_from_missing_path() {
        let tmp = TempDir::new().expect("create temp dir");
        let err = AppConfig::load_from(&tmp.path().join("absent.toml"))
            .expect_err("missing explicit config must fail");
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NUMSCAN_CONCURRENCY", "4"),
            ("NUMSCAN_DELAY_MS", "not-a-number"),
            ("NUMSCAN_DIRECTORY_URL", "https://directory.example"),
            ("NUMSCAN_DIRECTORY_TOKEN", "secret"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.scanning.concurrency, 4);
        // Unparseable value keeps the default
        assert_eq!(config.scanning.delay_ms, 200);
        assert_eq!(config.directory.base_url, "https://directory.example");
        assert_eq!(config.directory.api_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scanning]
concurrency = 6

[output]
format = "jid"
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scanning.concurrency, 6);
        assert_eq!(config.output.format, OutputFormat::Jid);
        // These should be defaults
        assert_eq!(config.scanning.delay_ms, 200);
        assert_eq!(config.directory.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut config = AppConfig::default();
        config.directory.base_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
