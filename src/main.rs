//! watchlink - short-lived watch links for movies and shows
//!
//! # Usage
//!
//! ```bash
//! # Run the link server (TMDB_API_KEY and BASE_URL required)
//! watchlink serve
//!
//! # One-shot lookups
//! watchlink search movie "blade runner"
//! watchlink resolve movie 78 --backup
//! ```

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ExitCode, Output};
use watchlink::config::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = run_cli(cli).await;
    exit_code.into()
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "watchlink=debug,tower_http=debug"
    } else {
        "watchlink=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return output.error(e.to_string(), ExitCode::InvalidArgs),
    };

    match cli.command {
        Command::Serve(cmd) => commands::serve_cmd(cmd, config, &output).await,
        Command::Search(cmd) => commands::search_cmd(cmd, config, &output).await,
        Command::Resolve(cmd) => commands::resolve_cmd(cmd, config, &output).await,
    }
}
