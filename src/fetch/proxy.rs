//! Proxy rotation.
//!
//! The rotator owns an ordered list of proxy endpoints; the front is the
//! current candidate. After a failed attempt the engine calls
//! [`ProxyRotator::advance`], which either rotates the front to the back or
//! drops it, depending on [`ProxyMode`]. Both operations happen under one
//! lock so concurrent fetches never observe a half-rotated list.

use crate::config::{FetchConfig, ProxyMode};
use crate::error::{HltvError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// A proxy endpoint, protocol prefix already applied.
///
/// An empty address means "connect directly".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyAddress(String);

impl ProxyAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        ProxyAddress(raw.into())
    }

    pub fn direct() -> Self {
        ProxyAddress(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_direct(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_direct() {
            f.write_str("No Proxy")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Thread-safe proxy list.
#[derive(Debug)]
pub struct ProxyRotator {
    proxies: Mutex<VecDeque<String>>,
    protocol: Option<String>,
    mode: ProxyMode,
}

impl ProxyRotator {
    pub fn new<I, S>(proxies: I, protocol: Option<String>, mode: ProxyMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let proxies: VecDeque<String> = proxies.into_iter().map(Into::into).collect();
        let protocol = protocol.filter(|p| !p.is_empty());
        let bare = proxies
            .iter()
            .filter(|raw| lacks_scheme(raw, protocol.as_deref()))
            .count();
        if bare > 0 {
            warn!(
                bare,
                "Proxies without a scheme and no proxy_protocol set; requests through them will fail"
            );
        }
        Self {
            proxies: Mutex::new(proxies),
            protocol,
            mode,
        }
    }

    /// Build the rotator described by `cfg`, or `None` when proxy mode is off.
    ///
    /// The proxy file, when configured, is read once here and wins over the
    /// explicit list. An unreadable file is a hard error.
    pub fn from_config(cfg: &FetchConfig) -> Result<Option<Self>> {
        if !cfg.use_proxy() {
            return Ok(None);
        }
        let proxies = match &cfg.proxy_path {
            Some(path) => load_proxy_file(path)?,
            None => cfg.proxy_list.clone(),
        };
        info!(count = proxies.len(), mode = ?cfg.proxy_mode, "Proxy rotation enabled");
        Ok(Some(Self::new(
            proxies,
            cfg.proxy_protocol.clone(),
            cfg.proxy_mode,
        )))
    }

    pub fn mode(&self) -> ProxyMode {
        self.mode
    }

    /// The current proxy, or `None` once the list is empty.
    pub fn current(&self) -> Option<ProxyAddress> {
        let guard = self.proxies.lock();
        match guard.front() {
            Some(raw) => Some(self.with_protocol(raw)),
            None => {
                error!("No proxies left");
                None
            }
        }
    }

    /// Retire the current proxy according to the configured mode.
    ///
    /// Returns `false` (and logs) when the list was already empty.
    pub fn advance(&self) -> bool {
        self.advance_with(self.mode)
    }

    pub fn advance_with(&self, mode: ProxyMode) -> bool {
        let mut guard = self.proxies.lock();
        let Some(front) = guard.pop_front() else {
            error!("No proxies left");
            return false;
        };
        match mode {
            ProxyMode::RemoveOnce => {
                debug!(proxy = %display_raw(&front), remaining = guard.len(), "Removing proxy");
            }
            ProxyMode::Rotate => {
                debug!(proxy = %display_raw(&front), "Switching proxy");
                guard.push_back(front);
                if let Some(next) = guard.front() {
                    info!(proxy = %display_raw(next), "New proxy");
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.proxies.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.lock().is_empty()
    }

    /// Copy of the list in rotation order, without protocol prefixes.
    pub fn snapshot(&self) -> Vec<String> {
        self.proxies.lock().iter().cloned().collect()
    }

    fn with_protocol(&self, raw: &str) -> ProxyAddress {
        match &self.protocol {
            Some(proto) if !raw.is_empty() && !raw.contains(proto.as_str()) => {
                ProxyAddress(format!("{proto}://{raw}"))
            }
            _ => ProxyAddress(raw.to_string()),
        }
    }
}

/// A non-direct entry that will not parse as a proxy URL: no `scheme://`
/// and no protocol to prefix it with.
fn lacks_scheme(raw: &str, protocol: Option<&str>) -> bool {
    !raw.is_empty() && protocol.is_none() && !raw.contains("://")
}

fn display_raw(raw: &str) -> &str {
    if raw.is_empty() { "No Proxy" } else { raw }
}

/// Read a newline-delimited proxy file, trimming whitespace and skipping blanks.
pub fn load_proxy_file(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|source| HltvError::ProxyFile {
        path: path.to_path_buf(),
        source,
    })?;
    let proxies: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    debug!(path = %path.display(), count = proxies.len(), "Loaded proxy file");
    Ok(proxies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    fn rotator(list: &[&str], mode: ProxyMode) -> ProxyRotator {
        ProxyRotator::new(list.iter().copied(), None, mode)
    }

    #[test]
    fn scheme_check_flags_bare_host_port() {
        assert!(lacks_scheme("localhost:8080", None));
        assert!(!lacks_scheme("localhost:8080", Some("http")));
        assert!(!lacks_scheme("socks5://10.0.0.1:1080", None));
        assert!(!lacks_scheme("", None));
    }

    #[test]
    fn full_rotation_returns_to_first() {
        let r = rotator(&["a:1", "b:2", "c:3"], ProxyMode::Rotate);
        assert_eq!(r.current().unwrap().as_str(), "a:1");
        r.advance();
        assert_eq!(r.current().unwrap().as_str(), "b:2");
        r.advance();
        r.advance();
        assert_eq!(r.current().unwrap().as_str(), "a:1");
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn remove_once_drains_list() {
        let r = rotator(&["a:1", "b:2", "c:3"], ProxyMode::RemoveOnce);
        for _ in 0..3 {
            assert!(r.advance());
        }
        assert!(r.is_empty());
        assert_eq!(r.current(), None);
    }

    #[test]
    fn advance_on_empty_is_noop() {
        let r = rotator(&[], ProxyMode::Rotate);
        assert!(!r.advance());
        assert!(!r.advance_with(ProxyMode::RemoveOnce));
        assert_eq!(r.current(), None);
    }

    #[test]
    fn protocol_prefix_applied_once() {
        let r = ProxyRotator::new(
            ["1.2.3.4:8080", "http://5.6.7.8:3128", ""],
            Some("http".to_string()),
            ProxyMode::Rotate,
        );
        assert_eq!(r.current().unwrap().as_str(), "http://1.2.3.4:8080");
        r.advance();
        assert_eq!(r.current().unwrap().as_str(), "http://5.6.7.8:3128");
        r.advance();
        let direct = r.current().unwrap();
        assert!(direct.is_direct());
        assert_eq!(direct.to_string(), "No Proxy");
        // The stored list is untouched by prefixing.
        assert_eq!(r.snapshot(), vec!["", "1.2.3.4:8080", "http://5.6.7.8:3128"]);
    }

    #[test]
    fn file_wins_over_list_and_skips_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  10.0.0.1:80  \n\n10.0.0.2:80\n").unwrap();
        let cfg = FetchConfig::new()
            .with_proxy_list(["ignored:1"])
            .with_proxy_path(file.path());
        let r = ProxyRotator::from_config(&cfg).unwrap().unwrap();
        assert_eq!(r.snapshot(), vec!["10.0.0.1:80", "10.0.0.2:80"]);
    }

    #[test]
    fn unreadable_file_fails_construction() {
        let cfg = FetchConfig::new().with_proxy_path("/no/such/proxies.txt");
        let err = ProxyRotator::from_config(&cfg).unwrap_err();
        assert!(matches!(err, HltvError::ProxyFile { .. }));
    }

    #[test]
    fn no_rotator_without_proxies() {
        assert!(ProxyRotator::from_config(&FetchConfig::new()).unwrap().is_none());
    }

    #[test]
    fn concurrent_rotation_keeps_list_intact() {
        let r = Arc::new(rotator(&["a", "b", "c"], ProxyMode::Rotate));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = Arc::clone(&r);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let _ = r.current();
                        r.advance();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut seen = r.snapshot();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }
}
