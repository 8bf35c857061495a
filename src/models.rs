//! Data structures shared across watchlink
//!
//! Organized by domain:
//! - **Media**: media type discriminator and TMDB search/detail shapes
//! - **Streams**: candidate streams returned by the provider aggregator
//! - **Torrents**: candidates returned by the Torrentio indexer
//! - **Records**: the short-lived record stored behind every watch link

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Media Models (TMDB)
// =============================================================================

/// Media type discriminator
///
/// Serialized as TMDB's path segment (`movie` / `tv`). `series` and `show`
/// are accepted as aliases when parsing user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    #[serde(alias = "series")]
    Tv,
}

impl MediaType {
    /// TMDB path segment (`/movie/...`, `/tv/...`)
    pub fn tmdb_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Stremio addon path segment (`/stream/movie/...`, `/stream/series/...`)
    pub fn stremio_path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "series",
        }
    }

    /// Parse from user input, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "movies" | "film" => Some(MediaType::Movie),
            "tv" | "series" | "show" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tmdb_path())
    }
}

/// One entry from a TMDB title search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub year: Option<u16>,
    pub overview: String,
    pub poster_path: Option<String>,
    pub vote_average: f32,
}

/// TMDB details for a movie or show, reduced to what the watch flow reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDetail {
    pub id: u64,
    pub media_type: MediaType,
    pub title: String,
    pub overview: String,
}

// =============================================================================
// Stream Models (provider aggregator)
// =============================================================================

/// Ranked quality label of a file-based stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    UltraHd,
    FullHd,
    Hd,
    Sd,
    Low,
    Unknown,
}

impl Quality {
    /// Parse a wire label (`4k`, `1080`, ...). Unrecognized labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "4k" => Some(Quality::UltraHd),
            "1080" => Some(Quality::FullHd),
            "720" => Some(Quality::Hd),
            "480" => Some(Quality::Sd),
            "360" => Some(Quality::Low),
            "unknown" => Some(Quality::Unknown),
            _ => None,
        }
    }

    /// Selection score. `Unknown` scores the same as an unrecognized label.
    pub fn score(&self) -> u32 {
        match self {
            Quality::UltraHd => 4000,
            Quality::FullHd => 1080,
            Quality::Hd => 720,
            Quality::Sd => 480,
            Quality::Low => 360,
            Quality::Unknown => 0,
        }
    }
}

/// Subtitle track attached to a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    #[serde(default)]
    pub id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, rename = "type")]
    pub format: Option<String>,
}

/// One concrete file behind a quality label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(default, rename = "type")]
    pub container: Option<String>,
    pub url: String,
}

/// A playable stream candidate
///
/// The wire names (`hls`, `playlist`, `file`, `qualities`) are what the
/// player page reads, so they are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CandidateStream {
    /// Adaptive-bitrate manifest
    #[serde(rename = "hls")]
    Manifest {
        #[serde(rename = "playlist")]
        manifest_url: String,
        #[serde(default)]
        captions: Vec<Caption>,
    },
    /// Fixed-quality files keyed by quality label
    #[serde(rename = "file")]
    File {
        #[serde(default)]
        qualities: HashMap<String, FileSource>,
        #[serde(default)]
        captions: Vec<Caption>,
    },
}

impl CandidateStream {
    /// Manifest stream with no captions
    pub fn manifest(url: impl Into<String>) -> Self {
        CandidateStream::Manifest {
            manifest_url: url.into(),
            captions: Vec::new(),
        }
    }

    pub fn is_manifest(&self) -> bool {
        matches!(self, CandidateStream::Manifest { .. })
    }
}

/// Streams found by one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    #[serde(rename = "id")]
    pub provider_id: String,
    #[serde(rename = "name")]
    pub provider_name: String,
    pub streams: Vec<CandidateStream>,
}

// =============================================================================
// Torrent Models (Torrentio)
// =============================================================================

/// Torrent option returned by the indexer, before selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentCandidate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub info_hash: String,
}

impl TorrentCandidate {
    /// Display name used in the magnet `dn` parameter (`name` wins over `title`)
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.title.as_deref())
    }
}

// =============================================================================
// Link Records
// =============================================================================

/// Record stored behind a watch-link token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryRecord {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(rename = "tmdbId")]
    pub external_id: String,
    pub title: String,
    pub season_num: Option<u32>,
    pub episode_num: Option<u32>,
    #[serde(default)]
    pub is_backup: bool,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
}

impl TemporaryRecord {
    pub fn new(media_type: MediaType, external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            media_type,
            external_id: external_id.into(),
            title: title.into(),
            season_num: None,
            episode_num: None,
            is_backup: false,
            created_at: now_millis(),
        }
    }

    pub fn with_episode(mut self, season: Option<u32>, episode: Option<u32>) -> Self {
        self.season_num = season;
        self.episode_num = episode;
        self
    }

    /// What the resolvers need to find streams for this record
    pub fn media_request(&self) -> MediaRequest {
        MediaRequest {
            media_type: self.media_type,
            tmdb_id: self.external_id.clone(),
            season: self.season_num,
            episode: self.episode_num,
        }
    }
}

/// Input to stream resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub media_type: MediaType,
    pub tmdb_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// Wall-clock milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
