//! audioproof - proof-of-contribution scoring for audio clips
//!
//! Derives a compact MFCC fingerprint from each submitted clip, measures how
//! novel it is against previously accepted clips, and combines novelty with
//! a quality signal into one validity/score decision used to gate payout.
//!
//! ## Module Structure
//!
//! - `core` - Feature extraction, uniqueness, authenticity, threshold and the proof engine
//! - `proof` - The output record
//! - `config` - Typed configuration with defaults
//! - `ledger` - Content-hash dedup ledger
//! - `pipeline` - Submission flow: dedup, score, accept or reject
//! - `cli` - Command-line interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use audioproof::core::{Clip, Corpus, FixedThreshold, ProofEngine};
//!
//! let engine = ProofEngine::builder()
//!     .threshold_provider(FixedThreshold(0.5))
//!     .build()?;
//!
//! let corpus = Corpus::new();
//! let proof = engine.generate(&[Clip::File("voice.ogg".into())], &corpus)?;
//!
//! println!("score {:.2}, valid {}", proof.score, proof.valid);
//! ```
//!
//! ## Scoring
//!
//! | Signal       | Definition                                        |
//! |--------------|---------------------------------------------------|
//! | uniqueness   | mean of `1 - max cosine similarity` per clip      |
//! | quality      | `min(total / threshold, 1)`                       |
//! | score        | `0.7 * quality + 0.3 * uniqueness`                |
//! | valid        | `total >= threshold`                              |
//! | authenticity | 0.3 under 5 s, 1.0 otherwise, 0.5 when unknown    |
//!
//! The engine only reads the corpus. Admitting an accepted clip is the
//! caller's move ([`pipeline::SubmissionPipeline`] does it under one lock).

// Core scoring functionality
pub mod core;

// Command-line interface
pub mod cli;

// Configuration
pub mod config;

// Dedup ledger
pub mod ledger;

// Submission flow
pub mod pipeline;

// Output record
pub mod proof;

pub use config::{AcceptancePolicy, ConfigError, ProofConfig};
pub use core::{
    AudioData, CancelToken, Clip, Corpus, Embedding, FeatureExtractor, ProofEngine, ProofError,
    ThresholdProvider, UniquenessScorer,
};
pub use ledger::{DedupLedger, JsonFileLedger, LedgerEntry, LedgerStatus, MemoryLedger};
pub use pipeline::{PipelineError, Submission, SubmissionOutcome, SubmissionPipeline};
pub use proof::ProofResponse;
