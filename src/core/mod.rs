//! Core scoring modules

pub mod analysis;
pub mod authenticity;
pub mod decoder;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod threshold;
pub mod uniqueness;

pub use analysis::{Embedding, FeatureExtractor, MfccParams};
pub use authenticity::{AuthenticityChecker, AuthenticityPolicy};
pub use decoder::{AudioData, AudioDecoder, SymphoniaDecoder};
pub use engine::{CancelToken, Clip, EngineBuilder, PreparedBatch, ProofEngine, ScoredBatch};
pub use error::{DecodeError, FeatureExtractionError, ProofError, ThresholdFetchError};
pub use threshold::{FixedThreshold, RemoteThreshold, ThresholdConfig, ThresholdProvider};
pub use uniqueness::{cosine_similarity, uniqueness, Corpus, DimensionMismatch, UniquenessScorer};
