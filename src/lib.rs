//! watchlink - short-lived watch links for movies and shows
//!
//! Looks titles up on TMDB, issues expiring links, and redeems them into a
//! playable stream either through a multi-provider aggregator or through a
//! torrent-to-HLS backup path.
//!
//! # Modules
//!
//! - `models` - Media, stream, torrent, and link record types
//! - `store` - Expiring in-memory record store
//! - `selector` - Best-stream selection over provider output
//! - `backup` - Torrent-based backup resolution
//! - `links` - Token minting and watch URLs
//! - `watch` - Search → select → issue flow
//! - `api` - External service clients (TMDB, Torrentio, providers, HLS)
//! - `server` - HTTP routes

pub mod api;
pub mod backup;
pub mod config;
pub mod console;
pub mod error;
pub mod links;
pub mod models;
pub mod selector;
pub mod server;
pub mod store;
pub mod watch;

// Re-export commonly used types
pub use models::{
    CandidateStream, MediaDetail, MediaRequest, MediaType, ProviderResult, Quality,
    SearchResult, TemporaryRecord, TorrentCandidate,
};

pub use api::{HlsConverterClient, ProviderClient, TmdbClient, TorrentioClient};
pub use backup::BackupResolver;
pub use config::Config;
pub use error::{BackupError, ConfigError, UpstreamError};
pub use links::{IssuedLink, LinkIssuer, LinkKind, LinkRequest};
pub use store::TemporaryRecordStore;
