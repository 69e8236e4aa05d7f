//! The fetch engine.
//!
//! One call to [`FetchEngine::fetch`] is one logical "get this page". The
//! engine loops over attempts until a usable document arrives or the attempt
//! bound is reached:
//!
//! 1. pick the current proxy and sleep for the carried delay. While a proxy
//!    is in play that delay is 0 unless `delay_with_proxies` is set;
//! 2. issue a GET through the [`Transport`];
//! 3. classify: `200` is parsed off-thread and checked for a challenge page,
//!    `403`/`404`, other statuses and network errors are retryable;
//! 4. on a retryable outcome, advance the proxy list and compute the next
//!    delay. In remove-once mode the dropped proxy's client is released.
//!
//! Attempts are numbered from 1 and the loop stops when the counter reaches
//! `max_retries`, so a fetch makes at most `max_retries - 1` attempts.
//! Exhaustion is not an error: [`FetchEngine::fetch`] returns `None`.

pub mod client;
pub mod delay;
pub mod parser;
pub mod proxy;

pub use client::{PageRequest, RawResponse, ReqwestTransport, Transport};
pub use delay::{DelayBand, DelayPolicy};
pub use parser::{Document, DocumentParser, ParsedPage, is_challenge};
pub use proxy::{ProxyAddress, ProxyRotator};

use crate::config::{FetchConfig, ProxyMode};
use crate::error::{Result, TransportError};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

/// Why an attempt did not produce a usable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// Timeout, refused connection, proxy failure.
    Network(TransportError),
    /// `403` or `404`.
    Forbidden(u16),
    /// `200` carrying the anti-bot interstitial.
    Challenge,
    /// Any other status code.
    Status(u16),
    /// The parse worker died before returning.
    Worker(String),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::Network(e) => write!(f, "network error: {e}"),
            RetryReason::Forbidden(code) => write!(f, "forbidden/not found ({code})"),
            RetryReason::Challenge => f.write_str("anti-bot challenge"),
            RetryReason::Status(code) => write!(f, "unexpected status {code}"),
            RetryReason::Worker(e) => write!(f, "parse worker failed: {e}"),
        }
    }
}

/// Terminal result of a fetch. A single attempt ends in
/// `Result<Document, RetryReason>`; its failure is kept in
/// [`FetchAttempt::failure`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Document),
    Exhausted,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            FetchOutcome::Success(doc) => Some(doc),
            _ => None,
        }
    }
}

/// What happened during one attempt. Kept for logging and tests only.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAttempt {
    pub url: String,
    pub attempt: u32,
    /// Seconds slept before the request.
    pub delay_used: f64,
    pub proxy_used: Option<ProxyAddress>,
    /// `None` on success.
    pub failure: Option<RetryReason>,
}

/// Every attempt of one fetch plus the terminal outcome.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub url: String,
    pub attempts: Vec<FetchAttempt>,
    /// Either [`FetchOutcome::Success`] or [`FetchOutcome::Exhausted`].
    pub outcome: FetchOutcome,
    pub elapsed: Duration,
}

impl FetchReport {
    pub fn into_document(self) -> Option<Document> {
        self.outcome.into_document()
    }
}

/// Retrying page fetcher shared by all facade calls.
pub struct FetchEngine<T: Transport = ReqwestTransport> {
    transport: T,
    rotator: Option<ProxyRotator>,
    delay: DelayPolicy,
    parser: DocumentParser,
    timeout: Duration,
    max_retries: u32,
}

impl FetchEngine<ReqwestTransport> {
    pub fn from_config(cfg: &FetchConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(cfg)?;
        Self::with_transport(cfg, transport)
    }
}

impl<T: Transport> FetchEngine<T> {
    /// Build an engine around any transport. Fails only if the proxy file
    /// cannot be read.
    pub fn with_transport(cfg: &FetchConfig, transport: T) -> Result<Self> {
        Ok(Self {
            transport,
            rotator: ProxyRotator::from_config(cfg)?,
            delay: DelayPolicy::from_config(cfg),
            parser: DocumentParser::new(cfg.effective_parse_workers()),
            timeout: cfg.timeout(),
            max_retries: cfg.max_retries,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn rotator(&self) -> Option<&ProxyRotator> {
        self.rotator.as_ref()
    }

    pub fn parser(&self) -> &DocumentParser {
        &self.parser
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch `url`, returning `None` once retries are exhausted.
    pub async fn fetch(&self, url: &str) -> Option<Document> {
        self.fetch_with_report(url).await.into_document()
    }

    /// Like [`fetch`](Self::fetch) but keeps the per-attempt record.
    #[instrument(level = "debug", skip(self), fields(max = self.max_retries))]
    pub async fn fetch_with_report(&self, url: &str) -> FetchReport {
        let started = Instant::now();
        let mut attempts = Vec::new();
        let mut delay = 0.0_f64;
        let mut attempt: u32 = 1;

        while attempt < self.max_retries {
            debug!(%url, attempt, max = self.max_retries, "Trying connect");

            let proxy = self.rotator.as_ref().and_then(ProxyRotator::current);
            let mut delay_used = 0.0;
            if delay > 0.0 {
                debug!(delay, proxy = proxy.is_some(), "Sleeping before attempt");
                sleep(Duration::try_from_secs_f64(delay).unwrap_or_default()).await;
                delay_used = delay;
            }

            let failure = match self.attempt(url, proxy.clone()).await {
                Ok(document) => {
                    attempts.push(FetchAttempt {
                        url: url.to_string(),
                        attempt,
                        delay_used,
                        proxy_used: proxy,
                        failure: None,
                    });
                    debug!(%url, attempt, "Fetched");
                    return FetchReport {
                        url: url.to_string(),
                        attempts,
                        outcome: FetchOutcome::Success(document),
                        elapsed: started.elapsed(),
                    };
                }
                Err(reason) => reason,
            };

            debug!(%url, attempt, reason = %failure, "Attempt failed");
            attempts.push(FetchAttempt {
                url: url.to_string(),
                attempt,
                delay_used,
                proxy_used: proxy.clone(),
                failure: Some(failure),
            });

            let rotated = self.rotator.as_ref().is_some_and(ProxyRotator::advance);
            match (&self.rotator, &proxy) {
                (Some(r), Some(dropped)) if rotated && r.mode() == ProxyMode::RemoveOnce => {
                    self.transport.retire(dropped).await;
                }
                _ => {}
            }
            delay = self.delay.next_delay(delay, rotated);
            attempt += 1;
        }

        error!(%url, attempts = attempts.len(), "Connection failed");
        FetchReport {
            url: url.to_string(),
            attempts,
            outcome: FetchOutcome::Exhausted,
            elapsed: started.elapsed(),
        }
    }

    async fn attempt(
        &self,
        url: &str,
        proxy: Option<ProxyAddress>,
    ) -> std::result::Result<Document, RetryReason> {
        let request = PageRequest {
            url: url.to_string(),
            proxy,
            timeout: self.timeout,
        };
        let response = match self.transport.get(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Request failed");
                return Err(RetryReason::Network(e));
            }
        };

        info!(%url, code = response.status, "Fetching");
        match response.status {
            200 => match self.parser.parse(response.body).await {
                Ok(page) if page.challenge => Err(RetryReason::Challenge),
                Ok(page) => Ok(page.document),
                Err(e) => Err(RetryReason::Worker(e.to_string())),
            },
            code @ (403 | 404) => {
                debug!(code, "Got forbidden or not found");
                Err(RetryReason::Forbidden(code))
            }
            code => {
                debug!(code, "Error, unexpected status");
                Err(RetryReason::Status(code))
            }
        }
    }

    /// Drop pooled connections. The engine can still be used afterwards.
    pub async fn close(&self) {
        self.transport.close().await;
    }
}

impl<T: Transport> fmt::Debug for FetchEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchEngine")
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .field("delay", &self.delay.band())
            .field("proxies", &self.rotator.as_ref().map(ProxyRotator::len))
            .field("parse_workers", &self.parser.workers())
            .finish()
    }
}
