//! HTTP transport.
//!
//! The engine talks to the network through the [`Transport`] trait so tests
//! can script responses. [`ReqwestTransport`] is the production
//! implementation: one `reqwest::Client` per proxy, built lazily on first
//! use and dropped by [`Transport::close`]. A closed transport rebuilds its
//! clients on the next request. Clients of proxies dropped in remove-once
//! mode are released through [`Transport::retire`].

use crate::config::FetchConfig;
use crate::error::{HltvError, Result, TransportError};
use crate::fetch::proxy::ProxyAddress;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Header carrying the timezone the site should render times in.
pub const TIMEZONE_HEADER: HeaderName = HeaderName::from_static("hltvtimezone");

/// One GET to perform.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    /// `None` or a direct address means no proxy.
    pub proxy: Option<ProxyAddress>,
    pub timeout: Duration,
}

/// Status and body of a completed request.
///
/// The body is only read for `200` responses; it is empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &PageRequest) -> std::result::Result<RawResponse, TransportError>;

    /// Release pooled connections. The transport stays usable.
    async fn close(&self) {}

    /// Forget per-proxy state for a proxy that will not be used again.
    async fn retire(&self, _proxy: &ProxyAddress) {}
}

/// `reqwest`-backed transport with a lazily built client per proxy.
#[derive(Debug)]
pub struct ReqwestTransport {
    headers: HeaderMap,
    clients: Mutex<HashMap<String, reqwest::Client>>,
}

impl ReqwestTransport {
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("user_agent", &cfg.user_agent)?);
        headers.insert(REFERER, header_value("referer", &cfg.referer)?);
        headers.insert(TIMEZONE_HEADER, header_value("timezone", &cfg.timezone)?);
        Ok(Self {
            headers,
            clients: Mutex::new(HashMap::new()),
        })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Number of live clients in the pool.
    pub fn pooled(&self) -> usize {
        self.clients.lock().len()
    }

    fn client_for(
        &self,
        proxy: Option<&ProxyAddress>,
    ) -> std::result::Result<reqwest::Client, TransportError> {
        let key = proxy.map(ProxyAddress::as_str).unwrap_or_default();
        let mut pool = self.clients.lock();
        if let Some(client) = pool.get(key) {
            return Ok(client.clone());
        }

        debug!(proxy = %display_key(key), "Creating session");
        let mut builder = reqwest::Client::builder();
        if !key.is_empty() {
            let proxy = reqwest::Proxy::all(key).map_err(|e| TransportError::InvalidProxy {
                proxy: key.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        pool.insert(key.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &PageRequest) -> std::result::Result<RawResponse, TransportError> {
        let client = self.client_for(request.proxy.as_ref())?;
        let response = client
            .get(&request.url)
            .headers(self.headers.clone())
            .timeout(request.timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = if status == 200 {
            response.text().await?
        } else {
            String::new()
        };
        Ok(RawResponse { status, body })
    }

    async fn close(&self) {
        let mut pool = self.clients.lock();
        if !pool.is_empty() {
            debug!(clients = pool.len(), "Closing session");
            pool.clear();
        }
    }

    async fn retire(&self, proxy: &ProxyAddress) {
        if self.clients.lock().remove(proxy.as_str()).is_some() {
            debug!(%proxy, "Dropped session of removed proxy");
        }
    }
}

fn header_value(field: &str, raw: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(raw).map_err(|e| HltvError::Config(format!("{field}: {e}")))
}

fn display_key(key: &str) -> &str {
    if key.is_empty() { "No Proxy" } else { key }
}
