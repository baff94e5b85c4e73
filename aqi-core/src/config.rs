use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::location::Location;

/// Default freshness window for cached readings. WAQI stations update hourly.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// User preferences stored on disk.
///
/// Example TOML:
/// ```toml
/// api_token = "..."
/// city = "https://aqicn.org/city/beijing/"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Token from <https://aqicn.org/data-platform/token/>.
    pub api_token: Option<String>,

    /// City name, aqicn.org city URL, or absent for IP geolocation.
    pub city: Option<String>,

    /// Alternative API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

impl Config {
    /// The API token, or an error telling the user how to set one.
    pub fn api_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API token configured.\n\
                     Hint: run `aqi configure` or set WAQI_TOKEN."
                )
            })
    }

    pub fn location(&self) -> Location {
        Location::resolve(self.city.as_deref())
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL)
    }

    /// Store the token; blank input clears it.
    pub fn set_api_token(&mut self, token: String) {
        let token = token.trim();
        self.api_token = (!token.is_empty()).then(|| token.to_string());
    }

    /// Store the city preference; blank input means "use geolocation".
    pub fn set_city(&mut self, city: String) {
        let city = city.trim();
        self.city = (!city.is_empty()).then(|| city.to_string());
    }

    /// Command-line values win over the file.
    pub fn with_overrides(mut self, token: Option<String>, city: Option<String>) -> Self {
        if let Some(token) = token {
            self.set_api_token(token);
        }
        if let Some(city) = city {
            self.set_city(city);
        }
        self
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&path, self.to_toml()?)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "aqi", "aqi-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
