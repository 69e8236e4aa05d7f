//! Document parsing off the async executor.
//!
//! Building an HTML tree is CPU-bound, so every parse (and every extractor
//! run by the facade) goes through [`DocumentParser::run_blocking`]: a
//! semaphore bounds the number of concurrent workers and the work itself
//! runs on tokio's blocking pool.

use crate::error::{HltvError, Result};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

static CHALLENGE_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#challenge-error-title").expect("valid challenge selector"));

/// Text shown by the interstitial verification page.
pub const CHALLENGE_PHRASE: &str = "Enable JavaScript and cookies to continue";

/// A parsed HTML page.
#[derive(Clone)]
pub struct Document(Html);

impl Document {
    /// Parse on the current thread. Prefer [`DocumentParser::parse`] from async code.
    pub fn parse(body: &str) -> Self {
        Document(Html::parse_document(body))
    }

    pub fn html(&self) -> &Html {
        &self.0
    }

    /// Serialized markup of the root element.
    pub fn markup(&self) -> String {
        self.0.root_element().html()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.markup() == other.markup()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("bytes", &self.markup().len())
            .finish()
    }
}

/// True when the page is an anti-bot verification interstitial.
pub fn is_challenge(doc: &Document) -> bool {
    doc.html()
        .select(&CHALLENGE_TITLE)
        .next()
        .map(|el| el.text().collect::<String>().contains(CHALLENGE_PHRASE))
        .unwrap_or(false)
}

/// A parsed response body and whether it was a challenge page.
#[derive(Debug)]
pub struct ParsedPage {
    pub document: Document,
    pub challenge: bool,
}

/// Bounded pool for blocking parse and extraction work.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl DocumentParser {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `work` on the blocking pool once a worker slot is free.
    pub async fn run_blocking<F, R>(&self, work: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| HltvError::Worker(e.to_string()))?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|e| HltvError::Worker(e.to_string()))
    }

    /// Parse a response body and run the challenge check in the same worker.
    pub async fn parse(&self, body: String) -> Result<ParsedPage> {
        let page = self
            .run_blocking(move || {
                let document = Document::parse(&body);
                let challenge = is_challenge(&document);
                ParsedPage {
                    document,
                    challenge,
                }
            })
            .await?;
        if page.challenge {
            debug!("Got cloudflare challenge page");
        }
        Ok(page)
    }
}
