//! Link-minting API guarded by a shared secret.
//!
//! `GET /api/:auth_token/:media_type/:title[/:season[/:episode]]` returns
//! `{watchUrl, token}` for a new primary link.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::AppContext;
use crate::links::LinkRequest;
use crate::models::MediaType;

/// External id recorded for links minted without a TMDB lookup
const PLACEHOLDER_TMDB_ID: &str = "placeholderTMDB";

/// Create API routes.
pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/api/:auth_token/:media_type/:title", get(mint_link))
        .route("/api/:auth_token/:media_type/:title/:season", get(mint_link))
        .route(
            "/api/:auth_token/:media_type/:title/:season/:episode",
            get(mint_link),
        )
}

#[derive(Debug, Deserialize)]
pub struct MintParams {
    auth_token: String,
    media_type: String,
    title: String,
    season: Option<String>,
    episode: Option<String>,
}

async fn mint_link(State(ctx): State<AppContext>, Path(params): Path<MintParams>) -> Response {
    if ctx.secret_key.as_deref() != Some(params.auth_token.as_str()) {
        tracing::warn!("Rejected /api call with invalid auth token");
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Invalid auth token"})),
        )
            .into_response();
    }

    let Some(media_type) = MediaType::parse(&params.media_type) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid media type"})),
        )
            .into_response();
    };

    let request = LinkRequest {
        media_type,
        tmdb_id: PLACEHOLDER_TMDB_ID.to_string(),
        title: params.title,
        season: params.season.and_then(|s| s.parse().ok()),
        episode: params.episode.and_then(|e| e.parse().ok()),
    };

    Json(ctx.issuer.issue_primary(&request)).into_response()
}
