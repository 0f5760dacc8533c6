// src/core/authenticity.rs
//
// Coarse authenticity signal derived from clip duration.

use serde::{Deserialize, Serialize};

/// Scores how authentic a submission looks, in `[0, 1]`.
///
/// `None` means the duration could not be determined.
pub trait AuthenticityChecker: Send + Sync {
    fn authenticity(&self, duration_secs: Option<f64>) -> f64;
}

/// Duration threshold table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticityPolicy {
    /// Clips at least this long get `full_score`
    pub min_duration_secs: f64,
    pub short_score: f64,
    pub full_score: f64,
    /// Used when the duration is unknown
    pub unknown_score: f64,
}

impl Default for AuthenticityPolicy {
    fn default() -> Self {
        Self {
            min_duration_secs: 5.0,
            short_score: 0.3,
            full_score: 1.0,
            unknown_score: 0.5,
        }
    }
}

impl AuthenticityChecker for AuthenticityPolicy {
    fn authenticity(&self, duration_secs: Option<f64>) -> f64 {
        match duration_secs {
            Some(d) if d.is_finite() && d >= 0.0 => {
                if d < self.min_duration_secs {
                    self.short_score
                } else {
                    self.full_score
                }
            }
            _ => self.unknown_score,
        }
    }
}
