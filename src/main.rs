//! # hltv
//!
//! Command-line front end for [`hltv_scraper`]. Each subcommand fetches one
//! page type and prints the extracted records as pretty JSON on stdout.
//! Logs go to stderr through `tracing`.
//!
//! ## Usage
//!
//! ```sh
//! hltv matches --days 2
//! hltv --proxy-file proxies.txt team 9565 Vitality
//! RUST_LOG=hltv_scraper=debug hltv news --all-days
//! ```
//!
//! The process exits non-zero when retries are exhausted or a page fails
//! to parse.

use clap::Parser;
use hltv_scraper::{FetchConfig, Hltv};
use serde::Serialize;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    debug!(?args, "Parsed CLI arguments");

    let cfg = build_config(&args)?;
    let hltv = Hltv::new(&cfg)?;
    info!(base_url = %cfg.base_url, max_retries = cfg.max_retries, proxies = cfg.use_proxy(), "hltv starting up");

    let outcome = run(&hltv, args.command).await;
    hltv.close().await;

    info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "hltv finished");
    outcome
}

/// YAML config first, then command-line overrides.
fn build_config(args: &Cli) -> Result<FetchConfig, Box<dyn Error>> {
    let mut cfg = match &args.config {
        Some(path) => FetchConfig::from_yaml_file(path)?,
        None => FetchConfig::new(),
    };
    if let Some(path) = &args.proxy_file {
        cfg = cfg.with_proxy_path(path);
    }
    if let Some(n) = args.max_retries {
        cfg = cfg.with_max_retries(n);
    }
    if let Some(secs) = args.timeout {
        cfg = cfg.with_timeout_secs(secs);
    }
    Ok(cfg)
}

async fn run(hltv: &Hltv, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Matches { days, min_rating } => {
            print_json(hltv.get_matches(days, min_rating, true, true).await?)
        }
        Command::Results {
            days,
            min_rating,
            max,
        } => print_json(hltv.get_results(days, min_rating, max, true, true).await?),
        Command::Events { max, featured: true } => {
            print_json(hltv.get_featured_events(max).await?)
        }
        Command::Events {
            max,
            featured: false,
        } => print_json(hltv.get_events(true, true, max).await?),
        Command::Event { id, title } => print_json(hltv.get_event_info(id, &title).await?),
        Command::Teams { max } => print_json(hltv.get_top_teams(max, None).await?),
        Command::Team { id, title } => print_json(hltv.get_team_info(id, &title).await?),
        Command::Players { max } => print_json(hltv.get_top_players(max, None).await?),
        Command::Player { id, nickname } => {
            print_json(hltv.get_player_info(id, &nickname).await?)
        }
        Command::News {
            max,
            all_days,
            only_featured,
        } => print_json(hltv.get_last_news(max, !all_days, only_featured).await?),
    }
}

fn print_json<T: Serialize>(record: Option<T>) -> Result<(), Box<dyn Error>> {
    match record {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => {
            error!("Connection failed, no result");
            Err("retries exhausted without a usable page".into())
        }
    }
}
