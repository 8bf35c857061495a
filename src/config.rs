//! Configuration management for watchlink
//!
//! Built once at startup and passed to constructors. Values come from an
//! optional TOML file (default ~/.config/watchlink/config.toml), then
//! environment variables override them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_TORRENTIO_URL: &str = "https://torrentio.strem.fun";
pub const DEFAULT_HLS_CONVERTER_URL: &str = "https://savingshub.online/api/fetchHls";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: Option<String>,
    pub tmdb_base_url: String,
    /// Public URL watch links are built on
    pub base_url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Shared secret guarding the `/api` link-minting route
    pub secret_key: Option<String>,
    /// Multi-provider stream aggregator; primary resolution is disabled without it
    pub providers_url: Option<String>,
    pub torrentio_url: String,
    pub hls_converter_url: String,
    /// Per-request timeout for every collaborator call
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            base_url: None,
            host: "0.0.0.0".to_string(),
            port: 3000,
            secret_key: None,
            providers_url: None,
            torrentio_url: DEFAULT_TORRENTIO_URL.to_string(),
            hls_converter_url: DEFAULT_HLS_CONVERTER_URL.to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl Config {
    /// Default config file path (~/.config/watchlink/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("watchlink").join("config.toml"))
    }

    /// Load from `path` (or the default path) and apply environment overrides.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(p) if p.exists() => {
                let text = std::fs::read_to_string(&p)?;
                toml::from_str(&text)?
            }
            _ => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.normalize();
        Ok(config)
    }

    /// Override fields from an environment lookup
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("TMDB_API_KEY") {
            self.tmdb_api_key = Some(v);
        }
        if let Some(v) = non_empty("TMDB_BASE_URL") {
            self.tmdb_base_url = v;
        }
        if let Some(v) = non_empty("BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = non_empty("HOST") {
            self.host = v;
        }
        if let Some(v) = non_empty("PORT") {
            self.port = v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("'{}' is not a port number", v),
            })?;
        }
        if let Some(v) = non_empty("SECRET_KEY") {
            self.secret_key = Some(v);
        }
        if let Some(v) = non_empty("PROVIDERS_URL") {
            self.providers_url = Some(v);
        }
        if let Some(v) = non_empty("TORRENTIO_URL") {
            self.torrentio_url = v;
        }
        if let Some(v) = non_empty("HLS_CONVERTER_URL") {
            self.hls_converter_url = v;
        }
        if let Some(v) = non_empty("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                reason: format!("'{}' is not a number of seconds", v),
            })?;
        }
        Ok(())
    }

    /// Trim trailing slashes so URLs can be joined with `/`
    pub fn normalize(&mut self) {
        fn trim_slash(url: &mut String) {
            let len = url.trim_end_matches('/').len();
            url.truncate(len);
        }

        trim_slash(&mut self.tmdb_base_url);
        trim_slash(&mut self.torrentio_url);
        if let Some(url) = self.base_url.as_mut() {
            trim_slash(url);
        }
        if let Some(url) = self.providers_url.as_mut() {
            trim_slash(url);
        }
    }

    pub fn require_tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("TMDB_API_KEY"))
    }

    pub fn require_base_url(&self) -> Result<&str, ConfigError> {
        self.base_url.as_deref().ok_or(ConfigError::Missing("BASE_URL"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
