//! Magnet → HLS conversion service client

use serde::Deserialize;
use std::time::Duration;

use crate::config::{Config, DEFAULT_HLS_CONVERTER_URL};
use crate::error::{BackupError, UpstreamError};

const SERVICE: &str = "HLS converter";

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(rename = "m3u8Link")]
    m3u8_link: Option<String>,
}

/// Client for the service that turns a magnet link into an m3u8 playlist
#[derive(Clone)]
pub struct HlsConverterClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HlsConverterClient {
    pub fn new(timeout: Duration) -> Self {
        Self::build(DEFAULT_HLS_CONVERTER_URL.to_string(), timeout)
    }

    /// Create a client against a custom endpoint (for testing)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self::build(endpoint.into(), Duration::from_secs(30))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::build(config.hls_converter_url.clone(), config.request_timeout())
    }

    fn build(endpoint: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Convert a magnet link to a playable manifest URL.
    ///
    /// Every failure here is a hard error, including a well-formed response
    /// that lacks `m3u8Link`.
    pub async fn convert(&self, magnet: &str) -> Result<String, BackupError> {
        tracing::debug!(endpoint = %self.endpoint, "Requesting HLS conversion");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("magnet", magnet)])
            .send()
            .await
            .map_err(UpstreamError::request(SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            }
            .into());
        }

        let text = response
            .text()
            .await
            .map_err(UpstreamError::request(SERVICE))?;
        let data: ConvertResponse =
            serde_json::from_str(&text).map_err(UpstreamError::invalid(SERVICE))?;

        data.m3u8_link
            .filter(|link| !link.is_empty())
            .ok_or(BackupError::MissingManifest)
    }
}
