// src/core/error.rs
//
// Classified error types for decoding, feature extraction and proof scoring.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a file into a sample buffer
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to probe file format - may be corrupted or unsupported: {0}")]
    Probe(#[source] symphonia::core::errors::Error),

    #[error("No supported audio track found in file")]
    NoTrack,

    #[error("File does not specify sample rate")]
    NoSampleRate,

    #[error("File reports 0 audio channels")]
    NoChannels,

    #[error("Failed to create decoder for audio codec: {0}")]
    Codec(#[source] symphonia::core::errors::Error),

    #[error("Packet read failed: {0}")]
    Packet(#[source] symphonia::core::errors::Error),

    #[error("No audio samples decoded from file")]
    Empty,

    #[error("Duration unavailable: {0}")]
    UnknownDuration(String),
}

/// Failure to derive an embedding from a sample buffer
#[derive(Debug, Error)]
pub enum FeatureExtractionError {
    #[error("Sample buffer is empty")]
    Empty,

    #[error("Sample buffer too short: {samples} samples, need at least {required}")]
    TooShort { samples: usize, required: usize },

    #[error("Sample buffer contains non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("Sample rate must be non-zero")]
    ZeroSampleRate,

    #[error("Resampling from {from} Hz to {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },

    #[error("FFT failed: {0}")]
    Fft(String),

    #[error("Invalid analysis parameters: {0}")]
    InvalidParams(String),
}

/// Failure to obtain the remote threshold; always recovered locally
#[derive(Debug, Error)]
pub enum ThresholdFetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP client unavailable")]
    ClientUnavailable,

    #[error("Threshold source returned status {0}")]
    Status(u16),

    #[error("Threshold body is not a decimal number: {0:?}")]
    Parse(String),

    #[error("Threshold value out of range: {0}")]
    OutOfRange(f64),
}

/// Failure of a whole proof-generation call
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Clip {clip}: {source}")]
    Decode {
        clip: usize,
        #[source]
        source: DecodeError,
    },

    #[error("Clip {clip}: feature extraction failed: {source}")]
    Extraction {
        clip: usize,
        #[source]
        source: FeatureExtractionError,
    },

    #[error("Proof generation cancelled")]
    Cancelled,
}

impl ProofError {
    /// True when the submitted audio itself is at fault, as opposed to a
    /// low score or an interrupted run.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ProofError::Decode { .. } | ProofError::Extraction { .. })
    }
}
