//! Configuration file handling.
//!
//! This module provides loading and saving of webcheckpoint configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/webcheckpoint/config.toml`
//! - macOS: `~/Library/Application Support/webcheckpoint/config.toml`
//! - Windows: `%APPDATA%\webcheckpoint\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! timeout_secs = 10
//! default_format = "table"
//! catalog_file = "/etc/webcheckpoint/standard.txt"
//! allowed_domains = ["buenosaires.gob.ar", "googleapis.com", "cdn.example.com"]
//!
//! [project]
//! name = "Citizen portal"
//! author = "Security team"
//! ticket = "SEC-1042"
//! version = "01.00.00"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::fetch::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::model::ProjectInfo;
use crate::rules::DEFAULT_ALLOWED_DOMAINS;

/// Application configuration.
///
/// Every field has a default, so a partial file is valid.
///
/// # Example
///
/// ```no_run
/// use webcheckpoint::Config;
///
/// let config = Config::load().unwrap();
/// println!("Timeout: {}s", config.timeout_secs);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeout for each HTTP request, in seconds.
    ///
    /// Default: 10
    pub timeout_secs: u64,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Host substrings external resources may load from.
    pub allowed_domains: Vec<String>,

    /// Extra catalog file in `name: v1, v2` format, loaded on top of the
    /// built-in approved versions.
    pub catalog_file: Option<PathBuf>,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json", "html"
    /// Default: "table"
    pub default_format: String,

    /// Project metadata printed on exported reports.
    pub project: ProjectInfo,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            catalog_file: None,
            default_format: "table".to_string(),
            project: ProjectInfo::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use webcheckpoint::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webcheckpoint")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.default_format, "table");
        assert!(config.catalog_file.is_none());
        assert!(config.allowed_domains.iter().any(|d| d == "googleapis.com"));
        assert_eq!(config.project.version, "01.00.00");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            timeout_secs = 30

            [project]
            name = "Portal"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.project.name, "Portal");
        assert_eq!(config.project.author, "Automated scan");
        assert_eq!(config.default_format, "table");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.allowed_domains = vec!["cdn.example.com".to_string()];
        config.catalog_file = Some(PathBuf::from("/tmp/standard.txt"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.allowed_domains, vec!["cdn.example.com".to_string()]);
        assert_eq!(loaded.catalog_file, Some(PathBuf::from("/tmp/standard.txt")));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_generate_default_config() {
        let generated = Config::generate_default_config();
        assert!(generated.contains("timeout_secs = 10"));
        assert!(generated.contains("[project]"));
    }
}
