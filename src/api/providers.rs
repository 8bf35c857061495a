//! Multi-provider stream aggregator client
//!
//! Asks the aggregator to scrape every provider it knows for a TMDB title,
//! then runs the result through the selector.

use std::time::Duration;

use crate::config::Config;
use crate::error::UpstreamError;
use crate::models::{CandidateStream, MediaRequest};
use crate::selector::{pick_best_stream, unify, ProviderOutput};

const SERVICE: &str = "provider aggregator";

/// Stream aggregator client
#[derive(Clone)]
pub struct ProviderClient {
    base_url: String,
    client: reqwest::Client,
}

impl ProviderClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// `None` when no aggregator is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .providers_url
            .as_ref()
            .map(|url| Self::new(url.clone(), config.request_timeout()))
    }

    /// Raw aggregator output for a title, decoded into its shape
    pub async fn scrape(&self, media: &MediaRequest) -> Result<ProviderOutput, UpstreamError> {
        let url = format!("{}/scrape", self.base_url);
        let season = media.season.map(|s| s.to_string());
        let episode = media.episode.map(|e| e.to_string());

        let mut query = vec![
            ("type", media.media_type.tmdb_path().to_string()),
            ("tmdbId", media.tmdb_id.clone()),
        ];
        if let Some(season) = season {
            query.push(("season", season));
        }
        if let Some(episode) = episode {
            query.push(("episode", episode));
        }

        tracing::debug!(tmdb_id = %media.tmdb_id, media_type = %media.media_type, "Scraping providers");

        let response = self
            .client
            .get(&url)
            .query(&query)
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
        let value = serde_json::from_str(&text).map_err(UpstreamError::invalid(SERVICE))?;
        Ok(ProviderOutput::from_value(value))
    }

    /// Best stream across all providers, or `None` if nothing qualifies.
    ///
    /// An aggregator failure is logged and treated as "nothing found".
    pub async fn best_stream(&self, media: &MediaRequest) -> Option<CandidateStream> {
        let output = match self.scrape(media).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tmdb_id = %media.tmdb_id, error = %e, "Provider scrape failed");
                return None;
            }
        };

        let providers = unify(output);
        if providers.is_empty() {
            tracing::debug!(tmdb_id = %media.tmdb_id, "No provider outputs");
            return None;
        }

        let best = pick_best_stream(&providers).cloned();
        tracing::debug!(
            tmdb_id = %media.tmdb_id,
            providers = providers.len(),
            found = best.is_some(),
            "Selected best stream"
        );
        best
    }
}
