//! Backup stream resolution through torrents
//!
//! TMDB id → IMDB id → Torrentio candidates → best candidate by resolution
//! keyword → magnet link → HLS manifest. Missing data in the first three
//! steps ends the pipeline with "no result"; a failed conversion is an error.

use crate::api::{HlsConverterClient, TmdbClient, TorrentioClient};
use crate::config::Config;
use crate::error::{BackupError, ConfigError};
use crate::links::encode_component;
use crate::models::{CandidateStream, MediaRequest, TorrentCandidate};

/// Trackers appended to every magnet link
pub const TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.demonii.com:1337/announce",
    "udp://open.tracker.cl:1337/announce",
    "udp://open.stealth.si:80/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://explodie.org:6969/announce",
    "udp://tracker.qu.ax:6969/announce",
    "udp://tracker.ololosh.space:6969/announce",
    "udp://tracker.dump.cl:6969/announce",
    "udp://tracker.dler.org:6969/announce",
    "udp://tracker.bittor.pw:1337/announce",
    "udp://tracker-udp.gbitt.info:80/announce",
    "udp://opentracker.io:6969/announce",
    "udp://open.free-tracker.ga:6969/announce",
    "udp://ns-1.x-fins.com:6969/announce",
    "udp://leet-tracker.moe:1337/announce",
    "udp://isk.richardsw.club:6969/announce",
    "udp://discord.heihachi.pw:6969/announce",
    "http://www.torrentsnipe.info:2701/announce",
    "http://www.genesis-sp.org:2710/announce",
];

/// Resolution keywords, best first
const RESOLUTION_RANKING: &[&str] = &["2160p", "4k", "1080p", "720p", "480p", "360p"];

/// Rank of a candidate: higher for better resolution keywords, -1 if none match
fn candidate_rank(candidate: &TorrentCandidate) -> i32 {
    let title = candidate.title.as_deref().map(str::to_lowercase);
    let name = candidate.name.as_deref().map(str::to_lowercase);
    let contains = |field: &Option<String>, token: &str| {
        field.as_deref().is_some_and(|f| f.contains(token))
    };

    RESOLUTION_RANKING
        .iter()
        .position(|token| contains(&title, token) || contains(&name, token))
        .map(|i| (RESOLUTION_RANKING.len() - i) as i32)
        .unwrap_or(-1)
}

/// Pick the candidate with the best resolution keyword.
///
/// Replacement needs a strictly better rank, so the first candidate at any
/// rank wins, and with no keywords anywhere the first candidate is kept.
pub fn pick_best_torrent(candidates: &[TorrentCandidate]) -> Option<&TorrentCandidate> {
    let mut chosen = None;
    let mut chosen_rank = i32::MIN;

    for candidate in candidates {
        let rank = candidate_rank(candidate);
        if rank > chosen_rank {
            chosen_rank = rank;
            chosen = Some(candidate);
        }
    }

    chosen
}

/// Build a magnet link with display name and the fixed tracker list
pub fn build_magnet(info_hash: &str, name: Option<&str>) -> String {
    let mut magnet = format!("magnet:?xt=urn:btih:{}", info_hash);
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        magnet.push_str("&dn=");
        magnet.push_str(&encode_component(name));
    }
    for tracker in TRACKERS {
        magnet.push_str("&tr=");
        magnet.push_str(&encode_component(tracker));
    }
    magnet
}

/// Backup pipeline over TMDB, Torrentio, and the HLS converter
#[derive(Clone)]
pub struct BackupResolver {
    tmdb: TmdbClient,
    torrentio: TorrentioClient,
    converter: HlsConverterClient,
}

impl BackupResolver {
    pub fn new(tmdb: TmdbClient, torrentio: TorrentioClient, converter: HlsConverterClient) -> Self {
        Self {
            tmdb,
            torrentio,
            converter,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            TmdbClient::from_config(config)?,
            TorrentioClient::from_config(config),
            HlsConverterClient::from_config(config),
        ))
    }

    /// Resolve a title to an HLS manifest.
    ///
    /// `Ok(None)` means nothing could be found; `Err` means the final
    /// conversion failed.
    pub async fn resolve(&self, media: &MediaRequest) -> Result<Option<CandidateStream>, BackupError> {
        let imdb_id = match self.tmdb.imdb_id(media.media_type, &media.tmdb_id).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::warn!(tmdb_id = %media.tmdb_id, "No IMDB id in TMDB external ids");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(tmdb_id = %media.tmdb_id, error = %e, "IMDB id lookup failed");
                return Ok(None);
            }
        };

        let candidates = match self
            .torrentio
            .candidates(media.media_type, &imdb_id, media.season, media.episode)
            .await
        {
            Ok(Some(candidates)) => candidates,
            Ok(None) => {
                tracing::warn!(imdb_id = %imdb_id, "No streams from Torrentio");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(imdb_id = %imdb_id, error = %e, "Torrentio lookup failed");
                return Ok(None);
            }
        };

        let Some(best) = pick_best_torrent(&candidates) else {
            tracing::warn!(imdb_id = %imdb_id, "Torrentio returned an empty stream list");
            return Ok(None);
        };
        tracing::debug!(
            imdb_id = %imdb_id,
            info_hash = %best.info_hash,
            name = best.display_name().unwrap_or_default(),
            "Picked torrent"
        );

        let magnet = build_magnet(&best.info_hash, best.display_name());
        let manifest_url = self.converter.convert(&magnet).await?;
        tracing::info!(imdb_id = %imdb_id, "Backup stream resolved");

        Ok(Some(CandidateStream::manifest(manifest_url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(hash: &str, name: Option<&str>, title: Option<&str>) -> TorrentCandidate {
        TorrentCandidate {
            name: name.map(String::from),
            title: title.map(String::from),
            info_hash: hash.to_string(),
        }
    }

    #[test]
    fn test_rank_order() {
        assert_eq!(candidate_rank(&candidate("a", None, Some("Movie.2160p"))), 6);
        assert_eq!(candidate_rank(&candidate("a", Some("Torrentio\n4K"), None)), 5);
        assert_eq!(candidate_rank(&candidate("a", None, Some("x.1080p.x"))), 4);
        assert_eq!(candidate_rank(&candidate("a", None, Some("x.360p"))), 1);
        assert_eq!(candidate_rank(&candidate("a", None, Some("CAM"))), -1);
        assert_eq!(candidate_rank(&candidate("a", None, None)), -1);
    }

    #[test]
    fn test_rank_uses_best_token_of_either_field() {
        let c = candidate("a", Some("Torrentio\n720p"), Some("Movie.2160p.HDR"));
        assert_eq!(candidate_rank(&c), 6);
    }

    #[test]
    fn test_pick_best_resolution() {
        let list = vec![
            candidate("sd", None, Some("Movie.480p")),
            candidate("uhd", None, Some("Movie.2160p")),
            candidate("fhd", None, Some("Movie.1080p")),
        ];
        assert_eq!(pick_best_torrent(&list).unwrap().info_hash, "uhd");
    }

    #[test]
    fn test_pick_first_on_tie() {
        let list = vec![
            candidate("first", None, Some("Movie.1080p.WEB")),
            candidate("second", None, Some("Movie.1080p.BluRay")),
        ];
        assert_eq!(pick_best_torrent(&list).unwrap().info_hash, "first");
    }

    #[test]
    fn test_pick_first_when_nothing_matches() {
        let list = vec![
            candidate("first", None, Some("Movie.CAM")),
            candidate("second", None, Some("Movie.TS")),
        ];
        assert_eq!(pick_best_torrent(&list).unwrap().info_hash, "first");
    }

    #[test]
    fn test_pick_empty() {
        assert!(pick_best_torrent(&[]).is_none());
    }

    #[test]
    fn test_magnet_with_name() {
        let magnet = build_magnet("abc123", Some("The Batman (2022)"));
        assert!(magnet.starts_with("magnet:?xt=urn:btih:abc123&dn=The%20Batman%20(2022)&tr="));
        assert_eq!(magnet.matches("&tr=").count(), TRACKERS.len());
        assert!(magnet.contains("&tr=udp%3A%2F%2Ftracker.opentrackr.org%3A1337%2Fannounce"));
    }

    #[test]
    fn test_magnet_name_keeps_unreserved_marks() {
        let magnet = build_magnet("h", Some("A (B)!"));
        assert!(magnet.starts_with("magnet:?xt=urn:btih:h&dn=A%20(B)!&tr="));
    }

    #[test]
    fn test_magnet_without_name() {
        let magnet = build_magnet("abc123", None);
        assert!(magnet.starts_with("magnet:?xt=urn:btih:abc123&tr="));
        assert!(!magnet.contains("&dn="));
    }
}
