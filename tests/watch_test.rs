//! Watch flow tests
//!
//! Search → select → details → links, with a scripted selection prompt.

use async_trait::async_trait;
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;
use watchlink::api::TmdbClient;
use watchlink::links::LinkIssuer;
use watchlink::models::MediaType;
use watchlink::store::TemporaryRecordStore;
use watchlink::watch::{SearchOption, SelectionPrompt, WatchFlow, WatchOutcome, WatchRequest};

/// Prompt that answers with a fixed choice
struct Scripted(Option<&'static str>);

#[async_trait]
impl SelectionPrompt for Scripted {
    async fn choose(&self, options: &[SearchOption]) -> Option<String> {
        assert!(!options.is_empty());
        self.0.map(String::from)
    }
}

/// Prompt that never answers
struct Silent;

#[async_trait]
impl SelectionPrompt for Silent {
    async fn choose(&self, _options: &[SearchOption]) -> Option<String> {
        std::future::pending().await
    }
}

const SEARCH_RESULTS: &str = r#"{"results": [
    {"id": 1396, "name": "Breaking Bad", "first_air_date": "2008-01-20", "overview": "A high school chemistry teacher diagnosed with terminal cancer"},
    {"id": 1397, "name": "Breaking Bad Redux", "first_air_date": "2020-01-01", "overview": ""}
]}"#;

fn breaking_bad(season: Option<u32>, episode: Option<u32>) -> WatchRequest {
    WatchRequest {
        media_type: MediaType::Tv,
        query: "breaking bad".to_string(),
        season,
        episode,
    }
}

fn flow(url: String, store: Arc<TemporaryRecordStore>) -> WatchFlow {
    WatchFlow::new(
        TmdbClient::with_base_url("test_key", url),
        LinkIssuer::new(store, "http://watch.test"),
    )
}

#[tokio::test]
async fn test_ready_issues_both_links() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_RESULTS)
        .create_async()
        .await;
    let details = server
        .mock("GET", "/tv/1396")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"id": 1396, "name": "Breaking Bad", "overview": "Walter White"}"#)
        .create_async()
        .await;

    let store = Arc::new(TemporaryRecordStore::new());
    let outcome = flow(server.url(), store.clone())
        .run(&breaking_bad(Some(1), Some(2)), &Scripted(Some("1396")))
        .await
        .unwrap();

    details.assert_async().await;

    let WatchOutcome::Ready {
        title,
        overview,
        watch,
        backup,
    } = outcome
    else {
        panic!("Expected Ready outcome");
    };
    assert_eq!(title, "Breaking Bad");
    assert_eq!(overview, "Walter White");
    assert!(watch.watch_url.ends_with(&format!("-breaking-bad?token={}", watch.token)));
    assert!(backup.watch_url.starts_with("http://watch.test/backup-"));
    assert_ne!(watch.token, backup.token);
    assert_eq!(store.len(), 2);

    let primary = store.get(&watch.token).unwrap();
    assert_eq!(primary.external_id, "1396");
    assert_eq!(primary.season_num, Some(1));
    assert_eq!(primary.episode_num, Some(2));
    assert!(!primary.is_backup);
    assert!(store.get(&backup.token).unwrap().is_backup);
}

#[tokio::test]
async fn test_no_results() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"results": []}"#)
        .create_async()
        .await;

    let store = Arc::new(TemporaryRecordStore::new());
    let outcome = flow(server.url(), store.clone())
        .run(&breaking_bad(None, None), &Scripted(Some("1396")))
        .await
        .unwrap();

    assert_eq!(outcome, WatchOutcome::NoResults);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_selection_timeout() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_RESULTS)
        .create_async()
        .await;
    let details = server
        .mock("GET", "/tv/1396")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(TemporaryRecordStore::new());
    let outcome = flow(server.url(), store.clone())
        .with_selection_timeout(Duration::from_millis(50))
        .run(&breaking_bad(None, None), &Silent)
        .await
        .unwrap();

    details.assert_async().await;
    assert_eq!(outcome, WatchOutcome::TimedOut);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_choice_outside_options() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_RESULTS)
        .create_async()
        .await;

    let store = Arc::new(TemporaryRecordStore::new());
    let outcome = flow(server.url(), store.clone())
        .run(&breaking_bad(None, None), &Scripted(Some("42")))
        .await
        .unwrap();

    assert_eq!(outcome, WatchOutcome::TimedOut);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_details_unavailable() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(SEARCH_RESULTS)
        .create_async()
        .await;
    let _details = server
        .mock("GET", "/tv/1397")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let store = Arc::new(TemporaryRecordStore::new());
    let outcome = flow(server.url(), store.clone())
        .run(&breaking_bad(None, None), &Scripted(Some("1397")))
        .await
        .unwrap();

    assert_eq!(outcome, WatchOutcome::DetailsUnavailable);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_search_failure_propagates() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("GET", "/search/tv")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let store = Arc::new(TemporaryRecordStore::new());
    let result = flow(server.url(), store)
        .run(&breaking_bad(None, None), &Scripted(None))
        .await;

    assert!(result.is_err());
}
