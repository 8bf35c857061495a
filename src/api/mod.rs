//! API clients for external services
//!
//! - TMDB: title search, details, IMDB cross-reference
//! - Torrentio: torrent candidates via the Stremio addon protocol
//! - Providers: multi-provider stream aggregation
//! - HLS: magnet to m3u8 conversion

pub mod hls;
pub mod providers;
pub mod tmdb;
pub mod torrentio;

pub use hls::HlsConverterClient;
pub use providers::ProviderClient;
pub use tmdb::TmdbClient;
pub use torrentio::TorrentioClient;
