//! Configuration file handling.
//!
//! This module loads cvescan configuration from a TOML file. Every key is
//! optional; a missing file means defaults.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/cvescan/config.toml`
//! - macOS: `~/Library/Application Support/cvescan/config.toml`
//! - Windows: `%APPDATA%\cvescan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! db_url_template = "https://people.canonical.com/~ubuntu-security/cvescan/ubuntu-vuln-db-{release}.json.bz2"
//! release = "focal"
//! cache_dir = "/var/cache/cvescan"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;

/// Placeholder substituted with the release codename in [`Config::db_url_template`].
pub const RELEASE_PLACEHOLDER: &str = "{release}";

const DEFAULT_DB_URL_TEMPLATE: &str =
    "https://people.canonical.com/~ubuntu-security/cvescan/ubuntu-vuln-db-{release}.json.bz2";

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use cvescan::Config;
///
/// let config = Config::load().unwrap();
/// println!("{}", config.db_url("focal"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the bzip2-compressed Ubuntu CVE Tracker database.
    ///
    /// `{release}` is replaced with the release codename.
    pub db_url_template: String,

    /// Release codename to scan against.
    ///
    /// Default: read from `/etc/os-release`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,

    /// Cache root, used unless running as a snap.
    ///
    /// Default: the platform cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url_template: DEFAULT_DB_URL_TEMPLATE.to_string(),
            release: None,
            cache_dir: None,
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

    /// Loads configuration from `path`, with the same rules as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Returns the database URL for `release`.
    pub fn db_url(&self, release: &str) -> String {
        self.db_url_template.replace(RELEASE_PLACEHOLDER, release)
    }

    /// Returns the configured release, or the one this host reports.
    pub fn release(&self) -> Option<String> {
        self.release.clone().or_else(platform::os_release_codename)
    }
}
