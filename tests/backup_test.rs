//! Backup pipeline tests
//!
//! TMDB → IMDB → Torrentio → magnet → HLS converter, all against one mock
//! server.

use mockito::{Matcher, Server, ServerGuard};
use watchlink::api::torrentio::PROVIDERS;
use watchlink::api::{HlsConverterClient, TmdbClient, TorrentioClient};
use watchlink::backup::{build_magnet, BackupResolver};
use watchlink::error::BackupError;
use watchlink::models::{CandidateStream, MediaRequest, MediaType};

fn resolver(server: &ServerGuard) -> BackupResolver {
    BackupResolver::new(
        TmdbClient::with_base_url("test_key", server.url()),
        TorrentioClient::with_base_url(server.url()),
        HlsConverterClient::with_endpoint(format!("{}/fetchHls", server.url())),
    )
}

fn movie(tmdb_id: &str) -> MediaRequest {
    MediaRequest {
        media_type: MediaType::Movie,
        tmdb_id: tmdb_id.to_string(),
        season: None,
        episode: None,
    }
}

const TORRENTS: &str = r#"{
    "streams": [
        {"name": "Torrentio\n720p", "title": "The.Batman.2022.720p.WEB", "infoHash": "hash720"},
        {"name": "Torrentio\n4k", "title": "The.Batman.2022.2160p.HDR", "infoHash": "hash2160"},
        {"name": "Torrentio\n1080p", "title": "The.Batman.2022.1080p.BluRay", "infoHash": "hash1080"}
    ]
}"#;

#[tokio::test]
async fn test_resolves_best_torrent_to_manifest() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/movie/414906/external_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"imdb_id": "tt1877830"}"#)
        .create_async()
        .await;
    let torrentio = server
        .mock(
            "GET",
            format!("/{}/stream/movie/tt1877830.json", PROVIDERS).as_str(),
        )
        .with_status(200)
        .with_body(TORRENTS)
        .create_async()
        .await;

    let expected_magnet = build_magnet("hash2160", Some("Torrentio\n4k"));
    let converter = server
        .mock("GET", "/fetchHls")
        .match_query(Matcher::UrlEncoded("magnet".into(), expected_magnet))
        .with_status(200)
        .with_body(r#"{"m3u8Link": "https://cdn.example/hash2160/index.m3u8"}"#)
        .create_async()
        .await;

    let best = resolver(&server).resolve(&movie("414906")).await.unwrap();

    torrentio.assert_async().await;
    converter.assert_async().await;
    assert_eq!(
        best,
        Some(CandidateStream::manifest("https://cdn.example/hash2160/index.m3u8"))
    );
}

#[tokio::test]
async fn test_series_uses_episode_path() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/tv/1396/external_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"imdb_id": "tt0903747"}"#)
        .create_async()
        .await;
    let torrentio = server
        .mock(
            "GET",
            format!("/{}/stream/series/tt0903747:3:7.json", PROVIDERS).as_str(),
        )
        .with_status(200)
        .with_body(r#"{"streams": [{"title": "Breaking.Bad.S03E07.720p", "infoHash": "ep"}]}"#)
        .create_async()
        .await;
    let _converter = server
        .mock("GET", "/fetchHls")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"m3u8Link": "https://cdn.example/ep.m3u8"}"#)
        .create_async()
        .await;

    let request = MediaRequest {
        media_type: MediaType::Tv,
        tmdb_id: "1396".to_string(),
        season: Some(3),
        episode: Some(7),
    };
    let best = resolver(&server).resolve(&request).await.unwrap();

    torrentio.assert_async().await;
    assert!(best.is_some_and(|s| s.is_manifest()));
}

#[tokio::test]
async fn test_missing_imdb_id_stops_pipeline() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/movie/1/external_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"imdb_id": null}"#)
        .create_async()
        .await;
    let torrentio = server
        .mock("GET", Matcher::Regex(r"/stream/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let best = resolver(&server).resolve(&movie("1")).await.unwrap();

    torrentio.assert_async().await;
    assert!(best.is_none());
}

#[tokio::test]
async fn test_tmdb_failure_is_no_result() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/movie/2/external_ids")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let best = resolver(&server).resolve(&movie("2")).await.unwrap();
    assert!(best.is_none());
}

#[tokio::test]
async fn test_empty_torrent_list_is_no_result() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/movie/3/external_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"imdb_id": "tt0000003"}"#)
        .create_async()
        .await;
    let _torrentio = server
        .mock(
            "GET",
            format!("/{}/stream/movie/tt0000003.json", PROVIDERS).as_str(),
        )
        .with_status(200)
        .with_body(r#"{"streams": []}"#)
        .create_async()
        .await;
    let converter = server
        .mock("GET", "/fetchHls")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let best = resolver(&server).resolve(&movie("3")).await.unwrap();

    converter.assert_async().await;
    assert!(best.is_none());
}

#[tokio::test]
async fn test_missing_m3u8_link_is_error() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/movie/4/external_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"imdb_id": "tt0000004"}"#)
        .create_async()
        .await;
    let _torrentio = server
        .mock(
            "GET",
            format!("/{}/stream/movie/tt0000004.json", PROVIDERS).as_str(),
        )
        .with_status(200)
        .with_body(r#"{"streams": [{"title": "Movie.1080p", "infoHash": "abc"}]}"#)
        .create_async()
        .await;
    let _converter = server
        .mock("GET", "/fetchHls")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"status": "queued"}"#)
        .create_async()
        .await;

    let err = resolver(&server).resolve(&movie("4")).await.unwrap_err();
    assert!(matches!(err, BackupError::MissingManifest));
}

#[tokio::test]
async fn test_converter_failure_is_error() {
    let mut server = Server::new_async().await;

    let _ids = server
        .mock("GET", "/movie/5/external_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"imdb_id": "tt0000005"}"#)
        .create_async()
        .await;
    let _torrentio = server
        .mock(
            "GET",
            format!("/{}/stream/movie/tt0000005.json", PROVIDERS).as_str(),
        )
        .with_status(200)
        .with_body(r#"{"streams": [{"title": "Movie.1080p", "infoHash": "abc"}]}"#)
        .create_async()
        .await;
    let _converter = server
        .mock("GET", "/fetchHls")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let err = resolver(&server).resolve(&movie("5")).await.unwrap_err();
    assert!(matches!(err, BackupError::Upstream(_)));
}
