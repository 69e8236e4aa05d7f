//! Delay between attempts.
//!
//! Two shapes exist: a uniformly random delay inside a `[min, max]` band, or
//! linear backoff that adds one second per failure up to `max`. While proxies
//! are rotating the delay is zero unless `delay_with_proxies` is set.

use crate::config::FetchConfig;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayBand {
    /// `min(previous + 1, max)` seconds.
    Backoff { max: f64 },
    /// Uniform in `[min, max]` seconds.
    Random { min: f64, max: f64 },
}

impl DelayBand {
    /// Validate the configured bounds, degrading to backoff when they are unusable.
    pub fn from_config(cfg: &FetchConfig) -> Self {
        let max = cfg.max_delay;
        match cfg.min_delay {
            Some(min) if min.is_finite() && max.is_finite() && max >= min && min >= 0.0 => {
                DelayBand::Random { min, max }
            }
            Some(min) => {
                warn!(
                    min,
                    max, "Invalid min/max delay. Delay will be increasing by 1 sec"
                );
                DelayBand::Backoff { max: sane_cap(max) }
            }
            None => DelayBand::Backoff { max: sane_cap(max) },
        }
    }
}

fn sane_cap(max: f64) -> f64 {
    if max.is_finite() { max.max(0.0) } else { 0.0 }
}

#[derive(Debug)]
pub struct DelayPolicy {
    band: DelayBand,
    delay_with_proxies: bool,
    rng: Mutex<StdRng>,
}

impl DelayPolicy {
    pub fn new(band: DelayBand, delay_with_proxies: bool, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            band,
            delay_with_proxies,
            rng: Mutex::new(rng),
        }
    }

    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self::new(
            DelayBand::from_config(cfg),
            cfg.delay_with_proxies,
            cfg.delay_seed,
        )
    }

    pub fn band(&self) -> DelayBand {
        self.band
    }

    /// Seconds to wait before the next attempt.
    pub fn next_delay(&self, previous: f64, proxy_rotated: bool) -> f64 {
        if proxy_rotated && !self.delay_with_proxies {
            return 0.0;
        }
        match self.band {
            DelayBand::Random { min, max } => {
                let delay = self.rng.lock().random_range(min..=max);
                debug!(delay = format!("{delay:.2}"), "Random delay");
                delay
            }
            DelayBand::Backoff { max } => {
                let delay = (previous + 1.0).min(max);
                if delay > previous {
                    info!(delay, "Calling again, increasing delay");
                } else {
                    debug!(delay, "Reached max delay limit, try to use proxy");
                }
                delay
            }
        }
    }
}
