//! Interactive "watch" flow
//!
//! Search TMDB, let the user pick a match within a bounded wait, fetch its
//! details, and issue a primary and a backup link for it. How the choices
//! are shown and answered is up to the [`SelectionPrompt`] implementation.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::api::TmdbClient;
use crate::error::UpstreamError;
use crate::links::{IssuedLink, LinkIssuer, LinkRequest};
use crate::models::{MediaType, SearchResult};

/// How long the user has to pick a search result
pub const SELECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Search results offered for selection
const MAX_OPTIONS: usize = 10;
/// Overview characters shown per option
const DESCRIPTION_CHARS: usize = 50;

/// A watch request as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest {
    pub media_type: MediaType,
    pub query: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// One selectable search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOption {
    pub label: String,
    pub description: String,
    /// TMDB id of the result
    pub value: String,
}

impl SearchOption {
    fn from_result(result: &SearchResult) -> Self {
        let year = result.year.map(|y| y.to_string()).unwrap_or_default();
        let description = if result.overview.is_empty() {
            "No overview".to_string()
        } else {
            result.overview.chars().take(DESCRIPTION_CHARS).collect()
        };

        Self {
            label: format!("{} ({})", result.title, year),
            description: format!("{}...", description),
            value: result.id.to_string(),
        }
    }
}

/// Asks the user to pick one of the offered options
#[async_trait]
pub trait SelectionPrompt: Send + Sync {
    /// The chosen option's `value`, or `None` if the user gave up
    async fn choose(&self, options: &[SearchOption]) -> Option<String>;
}

/// How a watch request ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WatchOutcome {
    NoResults,
    TimedOut,
    DetailsUnavailable,
    Ready {
        title: String,
        overview: String,
        watch: IssuedLink,
        backup: IssuedLink,
    },
}

impl WatchOutcome {
    /// Message shown to the user
    pub fn message(&self) -> String {
        match self {
            WatchOutcome::NoResults => "No results found on TMDB.".to_string(),
            WatchOutcome::TimedOut => "Timed out. Please try again.".to_string(),
            WatchOutcome::DetailsUnavailable => {
                "Could not retrieve details from TMDB.".to_string()
            }
            WatchOutcome::Ready {
                title,
                watch,
                backup,
                ..
            } => format!(
                "{}\n  Watch Now:     {}\n  Backup Stream: {}",
                title, watch.watch_url, backup.watch_url
            ),
        }
    }
}

/// Search → select → details → links
pub struct WatchFlow {
    tmdb: TmdbClient,
    issuer: LinkIssuer,
    selection_timeout: Duration,
}

impl WatchFlow {
    pub fn new(tmdb: TmdbClient, issuer: LinkIssuer) -> Self {
        Self {
            tmdb,
            issuer,
            selection_timeout: SELECTION_TIMEOUT,
        }
    }

    /// Override the selection bound
    pub fn with_selection_timeout(mut self, timeout: Duration) -> Self {
        self.selection_timeout = timeout;
        self
    }

    pub async fn run(
        &self,
        request: &WatchRequest,
        prompt: &dyn SelectionPrompt,
    ) -> Result<WatchOutcome, UpstreamError> {
        let results = self.tmdb.search(request.media_type, &request.query).await?;
        if results.is_empty() {
            tracing::info!(query = %request.query, "No TMDB results");
            return Ok(WatchOutcome::NoResults);
        }

        let options: Vec<SearchOption> = results
            .iter()
            .take(MAX_OPTIONS)
            .map(SearchOption::from_result)
            .collect();

        let chosen = match tokio::time::timeout(self.selection_timeout, prompt.choose(&options)).await
        {
            Ok(Some(id)) if options.iter().any(|o| o.value == id) => id,
            Ok(Some(id)) => {
                tracing::warn!(id = %id, "Selection is not one of the offered options");
                return Ok(WatchOutcome::TimedOut);
            }
            Ok(None) | Err(_) => {
                tracing::info!(query = %request.query, "Selection abandoned");
                return Ok(WatchOutcome::TimedOut);
            }
        };

        let Some(detail) = self.tmdb.details(request.media_type, &chosen).await? else {
            return Ok(WatchOutcome::DetailsUnavailable);
        };

        let link_request = LinkRequest {
            media_type: request.media_type,
            tmdb_id: chosen,
            title: detail.title.clone(),
            season: request.season,
            episode: request.episode,
        };
        let watch = self.issuer.issue_primary(&link_request);
        let backup = self.issuer.issue_backup(&link_request);

        Ok(WatchOutcome::Ready {
            title: detail.title,
            overview: detail.overview,
            watch,
            backup,
        })
    }
}
