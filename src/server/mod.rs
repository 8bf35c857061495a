//! HTTP server
//!
//! Serves the player page behind watch links, redeems tokens into playable
//! streams, and mints links for callers holding the shared secret.

use anyhow::{Context, Result};
use axum::{
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{ProviderClient, TmdbClient};
use crate::backup::BackupResolver;
use crate::config::Config;
use crate::links::LinkIssuer;
use crate::store::{spawn_sweeper, TemporaryRecordStore};

pub mod routes_api;
pub mod routes_watch;

/// How often expired records are swept in the background
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<TemporaryRecordStore>,
    pub issuer: LinkIssuer,
    /// Primary resolver; `None` disables `/play/:token` resolution
    pub providers: Option<ProviderClient>,
    pub backup: BackupResolver,
    /// Shared secret for `/api`; `None` leaves the route unmounted
    pub secret_key: Option<String>,
}

impl AppContext {
    /// Build every collaborator from configuration.
    ///
    /// Fails fast when the TMDB key or public base URL is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.require_base_url()?;
        let store = Arc::new(TemporaryRecordStore::new());

        let providers = ProviderClient::from_config(config);
        if providers.is_none() {
            tracing::warn!("PROVIDERS_URL not set, primary stream resolution disabled");
        }
        if config.secret_key.is_none() {
            tracing::warn!("SECRET_KEY not set, /api link minting disabled");
        }

        Ok(Self {
            issuer: LinkIssuer::new(store.clone(), base_url),
            store,
            providers,
            backup: BackupResolver::from_config(config)?,
            secret_key: config.secret_key.clone(),
        })
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(routes_watch::watch_routes());

    if ctx.secret_key.is_some() {
        app = app.merge(routes_api::api_routes());
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn root() -> impl IntoResponse {
    "watchlink server is running"
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server.
///
/// With `console` set, a stdin console for the interactive watch flow runs
/// alongside the server and shares its record store.
pub async fn start_server(config: Config, console: bool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(&config)?;
    let sweeper = spawn_sweeper(ctx.store.clone(), SWEEP_INTERVAL);

    if console {
        let tmdb = TmdbClient::from_config(&config)?;
        let flow = crate::watch::WatchFlow::new(tmdb, ctx.issuer.clone());
        tokio::spawn(crate::console::run_console(flow));
    }

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
