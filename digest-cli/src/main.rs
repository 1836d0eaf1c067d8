//! AI News Digest CLI
//!
//! Fetches AI news, summarizes it, and prints the display cards as JSON.
//!
//! Usage:
//!   digest-cli                 front page (default)
//!   digest-cli page <N>        cards for page N
//!   digest-cli recent <N>      today's and yesterday's cards for page N
//!   digest-cli ticker          breaking-news headline strip
//!   digest-cli summarize <T>   summary of a single text

use anyhow::{bail, Context};
use digest_services::{DigestConfig, NewsPipeline};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

enum Command {
    FrontPage,
    Page(u32),
    Recent(u32),
    Ticker,
    Summarize(String),
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let Some(name) = args.next() else {
            return Ok(Self::FrontPage);
        };

        match name.as_str() {
            "front" => Ok(Self::FrontPage),
            "page" | "recent" => {
                let page = match args.next() {
                    Some(raw) => raw
                        .parse::<u32>()
                        .with_context(|| format!("invalid page number: {}", raw))?,
                    None => 1,
                };
                if name == "page" {
                    Ok(Self::Page(page))
                } else {
                    Ok(Self::Recent(page))
                }
            }
            "ticker" => Ok(Self::Ticker),
            "summarize" => {
                let text = args.collect::<Vec<_>>().join(" ");
                Ok(Self::Summarize(text))
            }
            other => bail!("unknown command: {}", other),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,digest_services=debug")),
        )
        .init();

    let command = Command::parse(std::env::args().skip(1))?;
    let config = DigestConfig::from_env().context("failed to load configuration")?;

    if config.news.api_key.is_none() {
        info!("No news search API key found - pages will be empty");
    }
    if config.summary_api_key.is_none() {
        info!("No summarization API key found - using truncated descriptions");
    }

    let pipeline = NewsPipeline::from_config(&config);

    let output = match command {
        Command::FrontPage => serde_json::to_string_pretty(&pipeline.front_page().await)?,
        Command::Page(page) => serde_json::to_string_pretty(&pipeline.get_page(page).await)?,
        Command::Recent(page) => {
            serde_json::to_string_pretty(&pipeline.get_recent_page(page).await)?
        }
        Command::Ticker => serde_json::to_string(&pipeline.ticker().await)?,
        Command::Summarize(text) => {
            serde_json::to_string(&pipeline.engine().summarize_one(&text).await)?
        }
    };

    println!("{}", output);
    Ok(())
}
