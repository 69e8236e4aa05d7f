//! Error types for the client.
//!
//! Three layers of failure exist and each has its own type:
//!
//! - [`TransportError`]: a single network attempt failed. These never leave
//!   the fetch engine; they are classified as retryable and consumed there.
//! - [`ExtractError`]: a page was fetched but does not have the shape an
//!   extractor expects (layout change, wrong page, truncated body).
//! - [`HltvError`]: what the public facade returns. Exhausted retries are
//!   *not* an error; they surface as `Ok(None)`.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the facade.
pub type Result<T> = std::result::Result<T, HltvError>;

/// Failure of one network attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, reset, or the proxy could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The proxy address could not be turned into a client.
    #[error("invalid proxy {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    /// Anything else the HTTP stack reported (body read, decode, ...).
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// The document does not contain the structure an extractor needs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("missing element `{0}`")]
    MissingElement(&'static str),

    #[error("missing attribute `{attr}` on `{element}`")]
    MissingAttribute {
        element: &'static str,
        attr: &'static str,
    },

    #[error("unexpected value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Errors surfaced by [`crate::Hltv`] and configuration loading.
#[derive(Debug, Error)]
pub enum HltvError {
    /// Configuration could not be used at all.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configured proxy file could not be read.
    #[error("cannot read proxy file {}: {source}", path.display())]
    ProxyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A YAML configuration file could not be read or decoded.
    #[error("cannot load config {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    /// The page was fetched but its structure did not match.
    #[error("parsing error, page likely incomplete: {0}")]
    Parsing(#[from] ExtractError),

    /// A parse/extract worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl HltvError {
    /// True when the error reflects a page-shape mismatch rather than setup.
    pub fn is_parsing(&self) -> bool {
        matches!(self, HltvError::Parsing(_))
    }
}
