//! Stdin console for the watch flow
//!
//! Reads `watch <movie|tv> <query> [-s N] [-e N]` lines, lists the TMDB
//! matches, and waits for a number. Runs in the server process so the links
//! it prints resolve against the live record store.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use crate::models::MediaType;
use crate::watch::{SearchOption, SelectionPrompt, WatchFlow, WatchRequest};

const USAGE: &str = "usage: watch <movie|tv> <query> [-s SEASON] [-e EPISODE]";

/// Parse one console line into a watch request
pub fn parse_command(line: &str) -> Result<WatchRequest, String> {
    let mut words = line.split_whitespace();
    if words.next() != Some("watch") {
        return Err(USAGE.to_string());
    }

    let media_type = words
        .next()
        .and_then(MediaType::parse)
        .ok_or_else(|| USAGE.to_string())?;

    let mut query = Vec::new();
    let mut season = None;
    let mut episode = None;
    while let Some(word) = words.next() {
        match word {
            "-s" | "--season" => season = Some(parse_number(words.next(), "season")?),
            "-e" | "--episode" => episode = Some(parse_number(words.next(), "episode")?),
            _ => query.push(word),
        }
    }

    if query.is_empty() {
        return Err(USAGE.to_string());
    }

    Ok(WatchRequest {
        media_type,
        query: query.join(" "),
        season,
        episode,
    })
}

fn parse_number(word: Option<&str>, what: &str) -> Result<u32, String> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| format!("{} must be a number", what))
}

/// Console reading commands and selections from stdin
pub struct Console {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn next_line(&self) -> Option<String> {
        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stdin");
                None
            }
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SelectionPrompt for Console {
    async fn choose(&self, options: &[SearchOption]) -> Option<String> {
        println!("Select the correct match:");
        for (i, option) in options.iter().enumerate() {
            println!("  {:>2}. {}  {}", i + 1, option.label, option.description);
        }

        let line = self.next_line().await?;
        let index: usize = line.trim().parse().ok()?;
        options
            .get(index.checked_sub(1)?)
            .map(|o| o.value.clone())
    }
}

/// Serve console commands until stdin closes
pub async fn run_console(flow: WatchFlow) {
    let console = Console::new();
    println!("{}", USAGE);

    while let Some(line) = console.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let request = match parse_command(&line) {
            Ok(request) => request,
            Err(msg) => {
                println!("{}", msg);
                continue;
            }
        };

        match flow.run(&request, &console).await {
            Ok(outcome) => println!("{}", outcome.message()),
            Err(e) => {
                tracing::error!(error = %e, "Watch request failed");
                println!("Something went wrong.");
            }
        }
    }

    tracing::debug!("Console input closed");
}
