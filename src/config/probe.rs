// ABOUTME: Health probe configuration for the gates between deploy layers.
// ABOUTME: Defines retry budget, interval and per-request timeout with sensible defaults.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProbeConfig {
    /// Retries after the first failed attempt.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval: default_interval(),
            timeout: default_timeout(),
        }
    }
}

fn default_attempts() -> u32 {
    60
}

fn default_interval() -> Duration {
    crate::probe::DEFAULT_INTERVAL
}

fn default_timeout() -> Duration {
    crate::probe::DEFAULT_REQUEST_TIMEOUT
}
