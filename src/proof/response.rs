//! Proof output record
//!
//! The serialized shape is the contract with callers (bots, API layers):
//! `uniqueness`, `quality`, `score`, `valid`, `authenticity`, `ownership`,
//! `attributes{total_score, score_threshold}` and `metadata{dlp_id?}`.

use serde::{Deserialize, Serialize};

/// Aggregate signals the quality and validity were derived from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProofAttributes {
    /// Sum of per-clip uniqueness
    pub total_score: f64,
    /// Threshold the total was compared against
    pub score_threshold: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProofMetadata {
    /// Data-licensing program identifier, when configured
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dlp_id: Option<String>,
}

/// Result of one proof-generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofResponse {
    pub uniqueness: f64,
    pub quality: f64,
    pub score: f64,
    pub valid: bool,
    pub authenticity: f64,
    pub ownership: f64,
    pub attributes: ProofAttributes,
    pub metadata: ProofMetadata,
}

impl ProofResponse {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
