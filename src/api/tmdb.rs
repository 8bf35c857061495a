//! TMDB (The Movie Database) API client
//!
//! Title search, details, and the IMDB cross-reference used by the backup
//! resolver. API docs: https://developer.themoviedb.org/docs

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{Config, DEFAULT_TMDB_BASE_URL};
use crate::error::{ConfigError, UpstreamError};
use crate::models::{MediaDetail, MediaType, SearchResult};

const SERVICE: &str = "TMDB";

/// TMDB API client
#[derive(Clone)]
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl TmdbClient {
    /// Create a new TMDB client with the given API key
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::build(api_key.into(), DEFAULT_TMDB_BASE_URL.to_string(), timeout)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::build(api_key.into(), base_url.into(), Duration::from_secs(30))
    }

    /// Create a client from startup configuration; the API key is required
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::build(
            config.require_tmdb_api_key()?.to_string(),
            config.tmdb_base_url.clone(),
            config.request_timeout(),
        ))
    }

    fn build(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            base_url,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// GET an endpoint with the API key attached.
    ///
    /// Returns the HTTP status alongside the parsed body; the body is only
    /// parsed on success.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, Option<T>), UpstreamError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(endpoint = %endpoint, "TMDB request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(UpstreamError::request(SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            return Ok((status, None));
        }

        let body = response
            .text()
            .await
            .map_err(UpstreamError::request(SERVICE))?;
        let parsed = serde_json::from_str(&body).map_err(UpstreamError::invalid(SERVICE))?;
        Ok((status, Some(parsed)))
    }

    /// Search movies or shows by title (first page, adult titles excluded)
    pub async fn search(
        &self,
        media_type: MediaType,
        query: &str,
    ) -> Result<Vec<SearchResult>, UpstreamError> {
        let endpoint = format!("/search/{}", media_type.tmdb_path());
        let (status, response) = self
            .get::<SearchResponse>(
                &endpoint,
                &[
                    ("language", "en-US"),
                    ("query", query),
                    ("page", "1"),
                    ("include_adult", "false"),
                ],
            )
            .await?;

        match response {
            Some(r) => Ok(r.into_results(media_type)),
            None => Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            }),
        }
    }

    /// Details for one title. A non-success answer means "not available".
    pub async fn details(
        &self,
        media_type: MediaType,
        id: &str,
    ) -> Result<Option<MediaDetail>, UpstreamError> {
        let endpoint = format!("/{}/{}", media_type.tmdb_path(), id);
        let (status, response) = self
            .get::<DetailResponse>(&endpoint, &[("language", "en-US")])
            .await?;

        if response.is_none() {
            tracing::debug!(id = %id, status = status.as_u16(), "TMDB details unavailable");
        }
        Ok(response.map(|r| r.into_detail(media_type)))
    }

    /// IMDB id cross-referenced from a TMDB id.
    ///
    /// `Ok(None)` when TMDB has no IMDB id on record for the title.
    pub async fn imdb_id(
        &self,
        media_type: MediaType,
        id: &str,
    ) -> Result<Option<String>, UpstreamError> {
        let endpoint = format!("/{}/{}/external_ids", media_type.tmdb_path(), id);
        let (status, response) = self.get::<ExternalIds>(&endpoint, &[]).await?;

        match response {
            Some(ids) => Ok(ids.imdb_id.filter(|s| !s.is_empty())),
            None => Err(UpstreamError::Status {
                service: SERVICE,
                status: status.as_u16(),
            }),
        }
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResultRaw>,
}

impl SearchResponse {
    fn into_results(self, media_type: MediaType) -> Vec<SearchResult> {
        self.results
            .into_iter()
            .map(|r| r.into_search_result(media_type))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResultRaw {
    id: u64,
    // Movies use "title", TV uses "name"
    title: Option<String>,
    name: Option<String>,
    // Movies use "release_date", TV uses "first_air_date"
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f32>,
}

impl SearchResultRaw {
    fn into_search_result(self, media_type: MediaType) -> SearchResult {
        let title = self.title.or(self.name).unwrap_or_default();
        let date_str = self.release_date.or(self.first_air_date);
        let year = date_str.and_then(|d| extract_year(&d));

        SearchResult {
            id: self.id,
            media_type,
            title,
            year,
            overview: self.overview.unwrap_or_default(),
            poster_path: self.poster_path,
            vote_average: self.vote_average.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    id: u64,
    // Movies use "title", TV uses "name"
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
}

impl DetailResponse {
    fn into_detail(self, media_type: MediaType) -> MediaDetail {
        MediaDetail {
            id: self.id,
            media_type,
            title: self.title.or(self.name).unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

/// Extract year from a date string like "2022-03-04"
pub(crate) fn extract_year(date: &str) -> Option<u16> {
    if date.len() >= 4 {
        date.get(..4)?.parse().ok()
    } else {
        None
    }
}
