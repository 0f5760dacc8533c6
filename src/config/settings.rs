// src/config/settings.rs
//
// Typed configuration for the proof engine and the submission pipeline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::{AuthenticityPolicy, MfccParams, ThresholdConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// When a scored submission is admitted into the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptancePolicy {
    /// Accept only when quality is strictly above this value
    pub quality_cutoff: f64,
    /// Additionally require `valid == true`
    pub require_valid: bool,
    /// Payout = score * multiplier
    pub payout_multiplier: f64,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            quality_cutoff: 0.5,
            require_valid: false,
            payout_multiplier: 100.0,
        }
    }
}

impl AcceptancePolicy {
    pub fn accepts(&self, quality: f64, valid: bool) -> bool {
        quality > self.quality_cutoff && (valid || !self.require_valid)
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Data-licensing program identifier copied into proof metadata
    pub dlp_id: Option<String>,
    pub features: MfccParams,
    pub threshold: ThresholdConfig,
    pub authenticity: AuthenticityPolicy,
    pub acceptance: AcceptancePolicy,
}

impl ProofConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: ProofConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.features
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("features: {}", e)))?;
        if let Some(fixed) = self.threshold.fixed {
            if !fixed.is_finite() || fixed < 0.0 {
                return Err(ConfigError::Invalid(format!("threshold.fixed {} out of range", fixed)));
            }
        }
        if self.threshold.timeout_secs == 0 {
            return Err(ConfigError::Invalid("threshold.timeout_secs must be > 0".into()));
        }
        if !self.acceptance.quality_cutoff.is_finite() {
            return Err(ConfigError::Invalid("acceptance.quality_cutoff must be finite".into()));
        }
        Ok(())
    }
}
