// src/core/threshold.rs
//
// Baseline value the aggregate uniqueness must reach. Sourced remotely with a
// local random fallback so proof generation never fails on the network.

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::ThresholdFetchError;

/// random.org decimal fraction, two places, plain text
pub const DEFAULT_THRESHOLD_URL: &str =
    "https://www.random.org/decimal-fractions/?num=1&dec=2&col=1&format=plain&rnd=new";

/// Supplies the comparison baseline for one proof. Must not fail.
pub trait ThresholdProvider: Send + Sync {
    fn fetch_threshold(&self) -> f64;
}

/// Threshold source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub url: String,
    pub timeout_secs: u64,
    /// When set, this value is used and the network is never touched
    pub fixed: Option<f64>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_THRESHOLD_URL.to_string(),
            timeout_secs: 10,
            fixed: None,
        }
    }
}

impl ThresholdConfig {
    /// Build the provider this configuration describes
    pub fn provider(&self) -> Box<dyn ThresholdProvider> {
        match self.fixed {
            Some(value) => Box::new(FixedThreshold(value)),
            None => Box::new(RemoteThreshold::new(
                self.url.clone(),
                Duration::from_secs(self.timeout_secs),
            )),
        }
    }
}

/// Constant threshold, for tests and offline runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedThreshold(pub f64);

impl ThresholdProvider for FixedThreshold {
    fn fetch_threshold(&self) -> f64 {
        self.0
    }
}

/// HTTP GET of a single decimal number, falling back to a local uniform
/// value in `[0, 1)` on any failure.
pub struct RemoteThreshold {
    url: String,
    client: Option<reqwest::blocking::Client>,
}

impl RemoteThreshold {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Failed to build HTTP client for threshold source: {}", e);
                None
            }
        };
        Self { url, client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One attempt at the remote source, without fallback
    pub fn try_fetch(&self) -> Result<f64, ThresholdFetchError> {
        let client = self
            .client
            .as_ref()
            .ok_or(ThresholdFetchError::ClientUnavailable)?;

        let response = client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ThresholdFetchError::Status(status.as_u16()));
        }

        parse_threshold(&response.text()?)
    }
}

impl ThresholdProvider for RemoteThreshold {
    fn fetch_threshold(&self) -> f64 {
        match self.try_fetch() {
            Ok(value) => {
                debug!("Fetched threshold {} from {}", value, self.url);
                value
            }
            Err(e) => {
                let value = local_random();
                warn!(
                    "Error fetching threshold: {}. Using local random {:.4}",
                    e, value
                );
                value
            }
        }
    }
}

/// Parse an untrusted response body as a non-negative finite float
pub fn parse_threshold(body: &str) -> Result<f64, ThresholdFetchError> {
    let trimmed = body.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ThresholdFetchError::Parse(trimmed.to_string()))?;

    if !value.is_finite() || value < 0.0 {
        return Err(ThresholdFetchError::OutOfRange(value));
    }
    Ok(value)
}

fn local_random() -> f64 {
    rand::thread_rng().gen::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_decimal() {
        assert_eq!(parse_threshold("0.37\n").unwrap(), 0.37);
        assert_eq!(parse_threshold("  1 ").unwrap(), 1.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_threshold("<html>"), Err(ThresholdFetchError::Parse(_))));
        assert!(matches!(parse_threshold(""), Err(ThresholdFetchError::Parse(_))));
        assert!(matches!(parse_threshold("NaN"), Err(ThresholdFetchError::OutOfRange(_))));
        assert!(matches!(parse_threshold("-0.5"), Err(ThresholdFetchError::OutOfRange(_))));
    }

    #[test]
    fn test_unreachable_source_falls_back() {
        // nothing listens on the discard port
        let provider = RemoteThreshold::new("http://127.0.0.1:9/", Duration::from_millis(200));
        assert!(provider.try_fetch().is_err());

        let value = provider.fetch_threshold();
        assert!((0.0..1.0).contains(&value));
    }

    #[test]
    fn test_fixed_config_bypasses_network() {
        let config = ThresholdConfig {
            fixed: Some(0.25),
            ..Default::default()
        };
        assert_eq!(config.provider().fetch_threshold(), 0.25);
    }
}
