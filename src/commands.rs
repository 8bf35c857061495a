//! CLI Command Handlers
//!
//! Each handler takes its CLI args, the loaded config, and Output, and
//! returns an ExitCode.

use watchlink::api::{ProviderClient, TmdbClient};
use watchlink::backup::BackupResolver;
use watchlink::config::Config;
use watchlink::models::{MediaRequest, MediaType};

use crate::cli::{ExitCode, Output, ResolveCmd, SearchCmd, ServeCmd};

// =============================================================================
// Serve Command
// =============================================================================

pub async fn serve_cmd(cmd: ServeCmd, mut config: Config, output: &Output) -> ExitCode {
    if let Some(host) = cmd.host {
        config.host = host;
    }
    if let Some(port) = cmd.port {
        config.port = port;
    }

    if let Err(e) = config.require_tmdb_api_key() {
        return output.error(e.to_string(), ExitCode::InvalidArgs);
    }
    if let Err(e) = config.require_base_url() {
        return output.error(e.to_string(), ExitCode::InvalidArgs);
    }

    match watchlink::server::start_server(config, cmd.console).await {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Server failed: {:#}", e), ExitCode::Error),
    }
}

// =============================================================================
// Search Command
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, config: Config, output: &Output) -> ExitCode {
    let client = match TmdbClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
    };

    output.info(format!("Searching for: {}", cmd.query));

    match client.search(cmd.media_type.into(), &cmd.query).await {
        Ok(mut results) => {
            results.truncate(cmd.limit);

            if let Err(e) = output.print(&results) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Search failed: {}", e), ExitCode::NetworkError),
    }
}

// =============================================================================
// Resolve Command
// =============================================================================

pub async fn resolve_cmd(cmd: ResolveCmd, config: Config, output: &Output) -> ExitCode {
    let media = MediaRequest {
        media_type: MediaType::from(cmd.media_type),
        tmdb_id: cmd.tmdb_id,
        season: cmd.season,
        episode: cmd.episode,
    };

    output.info(format!("Resolving {} {}", media.media_type, media.tmdb_id));

    let best = if cmd.backup {
        let resolver = match BackupResolver::from_config(&config) {
            Ok(resolver) => resolver,
            Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
        };
        match resolver.resolve(&media).await {
            Ok(best) => best,
            Err(e) => {
                return output.error(format!("Backup resolution failed: {}", e), ExitCode::NetworkError)
            }
        }
    } else {
        let Some(providers) = ProviderClient::from_config(&config) else {
            return output.error("PROVIDERS_URL is not configured", ExitCode::InvalidArgs);
        };
        providers.best_stream(&media).await
    };

    match best {
        Some(stream) => {
            if let Err(e) = output.print(&stream) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        None => output.error("No suitable stream found", ExitCode::NoStreams),
    }
}
