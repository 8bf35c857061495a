//! Watch-link routes.
//!
//! `/{fragment}-{slug}?token=` and `/backup-{fragment}-{slug}?token=` serve
//! the player page; the page then calls `/play/:token` or
//! `/play-backup/:token` to get a stream.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::AppContext;

const PLAYER_PAGE: &str = include_str!("../../assets/player.html");

const EXPIRED: &str = "Link expired or invalid token.";

/// Create watch routes.
pub fn watch_routes() -> Router<AppContext> {
    Router::new()
        .route("/play/:token", get(play))
        .route("/play-backup/:token", get(play_backup))
        .route("/:slug", get(player_page))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// Whether a watch-link path segment is `{fragment}-{slug}`, optionally
/// prefixed with `backup-`
pub fn is_watch_slug(segment: &str) -> bool {
    let rest = segment.strip_prefix("backup-").unwrap_or(segment);
    matches!(rest.split_once('-'), Some((fragment, slug)) if !fragment.is_empty() && !slug.is_empty())
}

async fn player_page(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response {
    if !is_watch_slug(&slug) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing token.").into_response();
    };

    if ctx.store.get(&token).is_none() {
        tracing::debug!(token = %token, "Player page for unknown token");
        return (StatusCode::GONE, EXPIRED).into_response();
    }

    Html(PLAYER_PAGE).into_response()
}

async fn play(State(ctx): State<AppContext>, Path(token): Path<String>) -> Response {
    let Some(record) = ctx.store.get(&token) else {
        return (
            StatusCode::GONE,
            Json(serde_json::json!({"error": EXPIRED})),
        )
            .into_response();
    };

    let best = match &ctx.providers {
        Some(providers) => providers.best_stream(&record.media_request()).await,
        None => None,
    };

    match best {
        Some(stream) => Json(serde_json::json!({"bestStream": stream})).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No suitable stream found."})),
        )
            .into_response(),
    }
}

async fn play_backup(State(ctx): State<AppContext>, Path(token): Path<String>) -> Response {
    let Some(record) = ctx.store.get(&token) else {
        return (
            StatusCode::GONE,
            Json(serde_json::json!({"error": EXPIRED})),
        )
            .into_response();
    };

    match ctx.backup.resolve(&record.media_request()).await {
        Ok(Some(stream)) => Json(serde_json::json!({"bestStream": stream})).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "No suitable backup stream found."})),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(token = %token, error = %e, "Backup resolution failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to retrieve backup streams."})),
            )
                .into_response()
        }
    }
}
