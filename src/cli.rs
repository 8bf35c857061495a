//! CLI - Command Line Interface for watchlink
//!
//! `serve` runs the link server. `search` and `resolve` hit the same
//! collaborators one-shot, which is handy for checking keys and endpoints.
//!
//! # Examples
//!
//! ```bash
//! watchlink serve --port 3000 --console
//! watchlink search movie "blade runner" --json
//! watchlink resolve tv 1396 -s 1 -e 1 --backup
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;

use watchlink::MediaType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments or configuration
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// No streams available
    NoStreams = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// watchlink - short-lived watch links for movies and shows
#[derive(Parser, Debug)]
#[command(
    name = "watchlink",
    version,
    about = "Short-lived watch links backed by TMDB and stream resolvers",
    after_help = "EXAMPLES:\n\
                  watchlink serve                        Run the link server\n\
                  watchlink search movie \"the matrix\"    Search TMDB\n\
                  watchlink resolve movie 603 --backup   Resolve a stream"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeCmd),

    /// Search TMDB for movies or shows
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// Resolve the best stream for a TMDB id
    #[command(visible_alias = "r")]
    Resolve(ResolveCmd),
}

/// Media type argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaTypeArg {
    Movie,
    #[value(alias = "series")]
    Tv,
}

impl From<MediaTypeArg> for MediaType {
    fn from(arg: MediaTypeArg) -> Self {
        match arg {
            MediaTypeArg::Movie => MediaType::Movie,
            MediaTypeArg::Tv => MediaType::Tv,
        }
    }
}

/// Run the link server
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Bind address (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides PORT)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Read watch commands from stdin alongside the server
    #[arg(long)]
    pub console: bool,
}

/// Search TMDB by title
#[derive(Args, Debug)]
pub struct SearchCmd {
    #[arg(value_enum)]
    pub media_type: MediaTypeArg,

    /// Search query (title)
    #[arg(required = true)]
    pub query: String,

    /// Maximum number of results
    #[arg(long, short = 'l', default_value = "10")]
    pub limit: usize,
}

/// Resolve a stream without issuing a link
#[derive(Args, Debug)]
pub struct ResolveCmd {
    #[arg(value_enum)]
    pub media_type: MediaTypeArg,

    /// TMDB id
    pub tmdb_id: String,

    /// Season number (TV only)
    #[arg(long, short = 's')]
    pub season: Option<u32>,

    /// Episode number (TV only)
    #[arg(long, short = 'e')]
    pub episode: Option<u32>,

    /// Use the torrent backup path instead of the provider aggregator
    #[arg(long, short = 'b')]
    pub backup: bool,
}

// =============================================================================
// JSON Output
// =============================================================================

/// Standard JSON output wrapper
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
