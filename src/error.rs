//! Error types
//!
//! "Nothing found" is never an error here: lookups that can legitimately come
//! back empty return `Option`. These types cover failed collaborator calls
//! and configuration problems.

use thiserror::Error;

/// A collaborator call failed or answered with something unusable
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} returned an invalid response: {reason}")]
    InvalidResponse { service: &'static str, reason: String },
}

impl UpstreamError {
    pub(crate) fn request(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| UpstreamError::Request { service, source }
    }

    pub(crate) fn invalid(service: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |e| UpstreamError::InvalidResponse {
            service,
            reason: format!("JSON parse error: {}", e),
        }
    }
}

/// Hard failure of the backup pipeline's final conversion step
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("manifest conversion failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("no m3u8Link in conversion response")]
    MissingManifest,
}

/// Required configuration is absent or malformed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
