//! Torrentio addon client
//!
//! Lists torrent candidates for an IMDB id through the Torrentio Stremio
//! addon. Each candidate carries an info hash plus free-text name/title.

use serde::Deserialize;
use std::time::Duration;

use crate::config::{Config, DEFAULT_TORRENTIO_URL};
use crate::error::UpstreamError;
use crate::models::{MediaType, TorrentCandidate};

const SERVICE: &str = "Torrentio";

/// Indexers queried through the addon
pub const PROVIDERS: &str = "providers=yts,eztv,rarbg,1337x,thepiratebay,kickasstorrents,torrentgalaxy,magnetdl,horriblesubs,nyaasi,tokyotosho,anidex";

/// Torrentio API response
#[derive(Debug, Deserialize)]
struct TorrentioResponse {
    streams: Option<Vec<TorrentioStream>>,
}

/// Individual stream from Torrentio
#[derive(Debug, Deserialize)]
struct TorrentioStream {
    name: Option<String>,
    title: Option<String>,
    #[serde(rename = "infoHash")]
    info_hash: Option<String>,
}

impl TorrentioStream {
    fn into_candidate(self) -> Option<TorrentCandidate> {
        Some(TorrentCandidate {
            name: self.name,
            title: self.title,
            info_hash: self.info_hash?,
        })
    }
}

/// Torrentio addon client
#[derive(Clone)]
pub struct TorrentioClient {
    base_url: String,
    client: reqwest::Client,
}

impl TorrentioClient {
    /// Create a new Torrentio client with default settings
    pub fn new(timeout: Duration) -> Self {
        Self::build(DEFAULT_TORRENTIO_URL.to_string(), timeout)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::build(base_url.into(), Duration::from_secs(30))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::build(config.torrentio_url.clone(), config.request_timeout())
    }

    fn build(base_url: String, timeout: Duration) -> Self {
        Self {
            base_url,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Addon URL for a movie, or for a single episode of a series
    pub fn stream_url(
        &self,
        media_type: MediaType,
        imdb_id: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> String {
        match media_type {
            MediaType::Movie => format!(
                "{}/{}/stream/movie/{}.json",
                self.base_url, PROVIDERS, imdb_id
            ),
            MediaType::Tv => format!(
                "{}/{}/stream/{}/{}:{}:{}.json",
                self.base_url,
                PROVIDERS,
                media_type.stremio_path(),
                imdb_id,
                season.unwrap_or(1),
                episode.unwrap_or(1)
            ),
        }
    }

    /// Torrent candidates for a title, in the indexer's order.
    ///
    /// `Ok(None)` when the response carries no `streams` list at all.
    /// Entries without an info hash are dropped.
    pub async fn candidates(
        &self,
        media_type: MediaType,
        imdb_id: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<Option<Vec<TorrentCandidate>>, UpstreamError> {
        let url = self.stream_url(media_type, imdb_id, season, episode);
        tracing::debug!(url = %url, "Torrentio request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(UpstreamError::request(SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(UpstreamError::request(SERVICE))?;
        let data: TorrentioResponse =
            serde_json::from_str(&text).map_err(UpstreamError::invalid(SERVICE))?;

        Ok(data.streams.map(|streams| {
            streams
                .into_iter()
                .filter_map(TorrentioStream::into_candidate)
                .collect()
        }))
    }
}
