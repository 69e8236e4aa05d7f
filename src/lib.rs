//! # hltv_scraper
//!
//! An async client for HLTV.org pages that keeps working when the site
//! pushes back: rotating proxies, capped backoff or randomized delays,
//! anti-bot challenge detection, and a bounded worker pool for HTML parsing.
//!
//! ## Layout
//!
//! - [`fetch`]: the retrying fetch engine and its parts (proxy rotator,
//!   delay policy, document parser, HTTP transport)
//! - [`extract`]: pure functions turning a parsed page into [`models`]
//! - [`Hltv`]: the facade tying both together, one method per page type
//!
//! ## Example
//!
//! ```no_run
//! use hltv_scraper::{FetchConfig, Hltv};
//!
//! # async fn run() -> hltv_scraper::Result<()> {
//! let hltv = Hltv::new(&FetchConfig::new().with_max_retries(5))?;
//! if let Some(teams) = hltv.get_top_teams(30, None).await? {
//!     for team in teams {
//!         println!("#{} {}", team.rank, team.title);
//!     }
//! }
//! hltv.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod hltv;
pub mod models;
pub mod utils;

pub use config::{FetchConfig, ProxyMode};
pub use error::{ExtractError, HltvError, Result};
pub use fetch::{Document, FetchEngine, FetchOutcome, FetchReport, ReqwestTransport, Transport};
pub use hltv::Hltv;
