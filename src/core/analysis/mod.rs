//! Audio analysis algorithms
//!
//! - MFCC (clip fingerprinting)

mod mfcc;

pub use mfcc::{Embedding, FeatureExtractor, MfccParams};
