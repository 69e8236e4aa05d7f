//! Command-line interface definitions for the `hltv` binary.
//!
//! Global options tune the fetch engine; each subcommand maps to one
//! [`Hltv`](hltv_scraper::Hltv) accessor. Options can also be provided via
//! environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the `hltv` binary.
///
/// # Examples
///
/// ```sh
/// # Current top 10 teams
/// hltv teams --max 10
///
/// # Through a rotating proxy list, with a YAML config for the rest
/// hltv --config hltv.yaml --proxy-file proxies.txt player 11893 ZywOo
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML fetch configuration
    #[arg(short, long, env = "HLTV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Newline-delimited proxy list (overrides the config file)
    #[arg(short, long, env = "HLTV_PROXY_FILE")]
    pub proxy_file: Option<PathBuf>,

    /// Attempt bound; a fetch makes at most `max_retries - 1` attempts
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Live and upcoming matches
    Matches {
        #[arg(long, default_value_t = 1)]
        days: usize,
        #[arg(long, default_value_t = 1)]
        min_rating: u8,
    },
    /// Recent results
    Results {
        #[arg(long, default_value_t = 1)]
        days: usize,
        #[arg(long, default_value_t = 1)]
        min_rating: u8,
        #[arg(long, default_value_t = 30)]
        max: usize,
    },
    /// Ongoing and upcoming events
    Events {
        #[arg(long, default_value_t = 10)]
        max: usize,
        /// Only the featured events
        #[arg(long)]
        featured: bool,
    },
    /// One event's details
    Event { id: u64, title: String },
    /// Current team ranking
    Teams {
        #[arg(long, default_value_t = 30)]
        max: usize,
    },
    /// One team's details
    Team { id: u64, title: String },
    /// Top players of the current year
    Players {
        #[arg(long, default_value_t = 40)]
        max: usize,
    },
    /// One player's details
    Player { id: u64, nickname: String },
    /// Front page news
    News {
        #[arg(long, default_value_t = 2)]
        max: usize,
        /// Include news from previous days
        #[arg(long)]
        all_days: bool,
        #[arg(long)]
        only_featured: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "hltv",
            "--proxy-file",
            "./proxies.txt",
            "--max-retries",
            "5",
            "teams",
            "--max",
            "10",
        ]);

        assert_eq!(cli.proxy_file, Some(PathBuf::from("./proxies.txt")));
        assert_eq!(cli.max_retries, Some(5));
        assert!(!cli.debug);
        assert_eq!(cli.command, Command::Teams { max: 10 });
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["hltv", "-d", "-t", "3", "player", "11893", "ZywOo"]);

        assert!(cli.debug);
        assert_eq!(cli.timeout, Some(3));
        assert_eq!(
            cli.command,
            Command::Player {
                id: 11893,
                nickname: "ZywOo".to_string()
            }
        );
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["hltv", "news"]);
        assert_eq!(
            cli.command,
            Command::News {
                max: 2,
                all_days: false,
                only_featured: false
            }
        );
        assert!(Cli::try_parse_from(["hltv"]).is_err());
    }
}
