//! Client configuration.
//!
//! [`FetchConfig`] is immutable once handed to the client. It can be built in
//! code with the `with_*` methods or loaded from YAML:
//!
//! ```yaml
//! timeout_secs: 5
//! max_retries: 6
//! min_delay: 1.0
//! max_delay: 4.0
//! proxy_path: ./proxies.txt
//! proxy_protocol: http
//! proxy_mode: rotate
//! ```
//!
//! Values are only validated where they are consumed: the delay band by
//! [`crate::fetch::DelayPolicy`], the proxy file by
//! [`crate::fetch::ProxyRotator`].

use crate::error::{HltvError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://www.hltv.org";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
pub const DEFAULT_REFERER: &str = "https://www.hltv.org/stats";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// What happens to the current proxy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyMode {
    /// Move the failed proxy to the back of the list.
    #[default]
    Rotate,
    /// Drop the failed proxy permanently.
    RemoveOnce,
}

/// Per-client fetch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Attempt bound. A fetch makes at most `max_retries - 1` attempts.
    pub max_retries: u32,
    /// Lower bound of the random delay band. `None` selects linear backoff.
    pub min_delay: Option<f64>,
    /// Upper bound of the band, or the backoff cap.
    pub max_delay: f64,
    /// Seed for the band's RNG; `None` seeds from the OS.
    pub delay_seed: Option<u64>,
    pub proxy_list: Vec<String>,
    /// Newline-delimited proxy file; takes precedence over `proxy_list`.
    pub proxy_path: Option<PathBuf>,
    pub proxy_protocol: Option<String>,
    pub proxy_mode: ProxyMode,
    /// Sleep the band/backoff delay before proxied attempts too, instead of
    /// relying on rotation alone.
    pub delay_with_proxies: bool,
    /// Size of the blocking pool used for parsing and extraction.
    pub parse_workers: usize,
    pub user_agent: String,
    pub referer: String,
    /// Sent as the `hltvTimeZone` hint so the site renders times in this zone.
    pub timezone: String,
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            max_retries: 10,
            min_delay: None,
            max_delay: 10.0,
            delay_seed: None,
            proxy_list: Vec::new(),
            proxy_path: None,
            proxy_protocol: None,
            proxy_mode: ProxyMode::Rotate,
            delay_with_proxies: false,
            parse_workers: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a YAML file. Missing keys keep their defaults.
    #[instrument(level = "debug", skip_all)]
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| HltvError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let cfg = Self::from_yaml_str(&raw).map_err(|e| HltvError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), ?cfg, "Loaded fetch configuration");
        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Use a random delay uniformly drawn from `[min, max]` seconds.
    #[must_use]
    pub fn with_delay_band(mut self, min: f64, max: f64) -> Self {
        self.min_delay = Some(min);
        self.max_delay = max;
        self
    }

    /// Use linear backoff (`+1s` per failure) capped at `max` seconds.
    #[must_use]
    pub fn with_backoff_cap(mut self, max: f64) -> Self {
        self.min_delay = None;
        self.max_delay = max;
        self
    }

    #[must_use]
    pub fn with_delay_seed(mut self, seed: u64) -> Self {
        self.delay_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_proxy_list<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxy_list = proxies.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_proxy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proxy_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_proxy_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.proxy_protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn with_proxy_mode(mut self, mode: ProxyMode) -> Self {
        self.proxy_mode = mode;
        self
    }

    #[must_use]
    pub fn with_delay_with_proxies(mut self, enabled: bool) -> Self {
        self.delay_with_proxies = enabled;
        self
    }

    #[must_use]
    pub fn with_parse_workers(mut self, workers: usize) -> Self {
        self.parse_workers = workers;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    #[must_use]
    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = tz.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Proxy mode is on when either a list or a file was supplied.
    pub fn use_proxy(&self) -> bool {
        self.proxy_path.is_some() || !self.proxy_list.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn effective_parse_workers(&self) -> usize {
        self.parse_workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_conservative() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.max_retries, 10);
        assert_eq!(cfg.min_delay, None);
        assert_eq!(cfg.max_delay, 10.0);
        assert_eq!(cfg.proxy_mode, ProxyMode::Rotate);
        assert!(!cfg.use_proxy());
    }

    #[test]
    fn use_proxy_follows_list_or_path() {
        assert!(FetchConfig::new().with_proxy_list(["1.2.3.4:80"]).use_proxy());
        assert!(FetchConfig::new().with_proxy_path("proxies.txt").use_proxy());
    }

    #[test]
    fn yaml_overrides_only_given_keys() {
        let cfg = FetchConfig::from_yaml_str(
            "max_retries: 4\nmin_delay: 0.5\nmax_delay: 2\nproxy_mode: remove_once\nproxy_list: ['a:1', 'b:2']\n",
        )
        .unwrap();
        assert_eq!(cfg.max_retries, 4);
        assert_eq!(cfg.min_delay, Some(0.5));
        assert_eq!(cfg.max_delay, 2.0);
        assert_eq!(cfg.proxy_mode, ProxyMode::RemoveOnce);
        assert_eq!(cfg.proxy_list, vec!["a:1", "b:2"]);
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn empty_yaml_is_default() {
        let cfg = FetchConfig::from_yaml_str("  \n").unwrap();
        assert_eq!(cfg.max_retries, 10);
    }

    #[test]
    fn yaml_file_roundtrip_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs: 9\ntimezone: Europe/Copenhagen").unwrap();
        let cfg = FetchConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(cfg.timeout_secs, 9);
        assert_eq!(cfg.timezone, "Europe/Copenhagen");

        let err = FetchConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, HltvError::ConfigFile { .. }));
    }

    #[test]
    fn parse_workers_never_zero() {
        assert_eq!(FetchConfig::new().with_parse_workers(0).effective_parse_workers(), 1);
    }
}
