// src/core/engine.rs
//
// Proof composition: extracts every clip, scores it against the corpus and
// merges uniqueness, threshold and authenticity into one ProofResponse.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::analysis::{Embedding, FeatureExtractor, MfccParams};
use super::authenticity::{AuthenticityChecker, AuthenticityPolicy};
use super::decoder::{AudioData, AudioDecoder, SymphoniaDecoder};
use super::error::{FeatureExtractionError, ProofError};
use super::threshold::{ThresholdConfig, ThresholdProvider};
use super::uniqueness::{uniqueness, Corpus};
use crate::config::{ConfigError, ProofConfig};
use crate::proof::{ProofAttributes, ProofMetadata, ProofResponse};

/// Weight of quality in the final score; uniqueness gets the remainder
pub const QUALITY_WEIGHT: f64 = 0.7;
pub const UNIQUENESS_WEIGHT: f64 = 0.3;

/// Placeholder until ownership is verified
pub const OWNERSHIP: f64 = 1.0;

/// One input to a proof
#[derive(Debug, Clone)]
pub enum Clip {
    /// Audio file, decoded by the engine's decoder
    File(PathBuf),
    /// Already decoded mono audio
    Decoded(AudioData),
}

impl From<PathBuf> for Clip {
    fn from(path: PathBuf) -> Self {
        Clip::File(path)
    }
}

impl From<&Path> for Clip {
    fn from(path: &Path) -> Self {
        Clip::File(path.to_path_buf())
    }
}

impl From<AudioData> for Clip {
    fn from(audio: AudioData) -> Self {
        Clip::Decoded(audio)
    }
}

/// Cooperative cancellation, checked between clip extractions
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A scored batch: the public response plus what a caller needs to admit
/// the clips into the corpus afterwards.
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub response: ProofResponse,
    /// Embeddings in clip order
    pub embeddings: Vec<Embedding>,
    /// Uniqueness of each clip against the corpus as it was when scoring began
    pub clip_uniqueness: Vec<f64>,
}

/// Everything a proof needs that does not depend on the corpus
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    /// Embeddings in clip order
    pub embeddings: Vec<Embedding>,
    pub threshold: f64,
    pub authenticity: f64,
}

/// `min(total / threshold, 1)`, with a non-positive threshold counting as
/// already met (quality 1.0) instead of dividing by zero.
pub fn quality(total_score: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 1.0;
    }
    (total_score / threshold).min(1.0)
}

/// Weighted final score
pub fn composite_score(quality: f64, uniqueness_avg: f64) -> f64 {
    QUALITY_WEIGHT * quality + UNIQUENESS_WEIGHT * uniqueness_avg
}

/// Merge per-clip uniqueness, the threshold and authenticity into a response
pub fn compose_proof(
    clip_uniqueness: &[f64],
    threshold: f64,
    authenticity: f64,
    dlp_id: Option<&str>,
) -> ProofResponse {
    let total_score: f64 = clip_uniqueness.iter().sum();
    let uniqueness_avg = if clip_uniqueness.is_empty() {
        0.0
    } else {
        total_score / clip_uniqueness.len() as f64
    };

    let quality = quality(total_score, threshold);

    ProofResponse {
        uniqueness: uniqueness_avg,
        quality,
        score: composite_score(quality, uniqueness_avg),
        valid: total_score >= threshold,
        authenticity,
        ownership: OWNERSHIP,
        attributes: ProofAttributes {
            total_score,
            score_threshold: threshold,
        },
        metadata: ProofMetadata {
            dlp_id: dlp_id.map(str::to_string),
        },
    }
}

/// Builder for ProofEngine configuration
pub struct EngineBuilder {
    params: MfccParams,
    decoder: Box<dyn AudioDecoder>,
    threshold: Option<Box<dyn ThresholdProvider>>,
    authenticity: Box<dyn AuthenticityChecker>,
    dlp_id: Option<String>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            params: MfccParams::default(),
            decoder: Box::new(SymphoniaDecoder),
            threshold: None,
            authenticity: Box::new(AuthenticityPolicy::default()),
            dlp_id: None,
        }
    }

    pub fn features(mut self, params: MfccParams) -> Self {
        self.params = params;
        self
    }

    pub fn decoder(mut self, decoder: impl AudioDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    pub fn threshold_provider(mut self, provider: impl ThresholdProvider + 'static) -> Self {
        self.threshold = Some(Box::new(provider));
        self
    }

    pub fn boxed_threshold_provider(mut self, provider: Box<dyn ThresholdProvider>) -> Self {
        self.threshold = Some(provider);
        self
    }

    pub fn authenticity(mut self, checker: impl AuthenticityChecker + 'static) -> Self {
        self.authenticity = Box::new(checker);
        self
    }

    pub fn dlp_id(mut self, dlp_id: Option<String>) -> Self {
        self.dlp_id = dlp_id;
        self
    }

    /// Without an explicit provider the remote source is used. Fails when
    /// the feature parameters are unusable.
    pub fn build(self) -> Result<ProofEngine, FeatureExtractionError> {
        Ok(ProofEngine {
            extractor: FeatureExtractor::new(self.params)?,
            decoder: self.decoder,
            threshold: self
                .threshold
                .unwrap_or_else(|| ThresholdConfig::default().provider()),
            authenticity: self.authenticity,
            dlp_id: self.dlp_id,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores batches of clips. Reads the corpus, never mutates it.
pub struct ProofEngine {
    extractor: FeatureExtractor,
    decoder: Box<dyn AudioDecoder>,
    threshold: Box<dyn ThresholdProvider>,
    authenticity: Box<dyn AuthenticityChecker>,
    dlp_id: Option<String>,
}

impl ProofEngine {
    /// Engine wired from validated configuration
    pub fn new(config: &ProofConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        EngineBuilder::new()
            .features(config.features.clone())
            .boxed_threshold_provider(config.threshold.provider())
            .authenticity(config.authenticity.clone())
            .dlp_id(config.dlp_id.clone())
            .build()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Generate the proof for a batch of clips
    pub fn generate(&self, clips: &[Clip], corpus: &Corpus) -> Result<ProofResponse, ProofError> {
        self.score(clips, corpus, None).map(|batch| batch.response)
    }

    /// Generate the proof and keep the embeddings for a later corpus append.
    ///
    /// Every clip is compared with `corpus` as passed in; clips in the same
    /// batch do not see each other. Any decode or extraction failure fails
    /// the whole batch.
    pub fn score(
        &self,
        clips: &[Clip],
        corpus: &Corpus,
        cancel: Option<&CancelToken>,
    ) -> Result<ScoredBatch, ProofError> {
        let prepared = self.prepare(clips, cancel)?;
        Ok(self.finish(prepared, corpus))
    }

    /// Corpus-independent half of scoring: decode, extract, fetch the
    /// threshold and rate authenticity.
    pub fn prepare(
        &self,
        clips: &[Clip],
        cancel: Option<&CancelToken>,
    ) -> Result<PreparedBatch, ProofError> {
        info!("Starting proof generation for {} clip(s)", clips.len());

        let embeddings: Vec<Embedding> = clips
            .par_iter()
            .enumerate()
            .map(|(index, clip)| {
                if cancel.map_or(false, CancelToken::is_cancelled) {
                    return Err(ProofError::Cancelled);
                }
                self.extract_clip(index, clip)
            })
            .collect::<Result<_, _>>()?;

        if cancel.map_or(false, CancelToken::is_cancelled) {
            return Err(ProofError::Cancelled);
        }

        let threshold = self.threshold.fetch_threshold();
        let authenticity = match clips.first() {
            Some(first) => self.authenticity.authenticity(self.clip_duration(first)),
            None => 0.0,
        };

        Ok(PreparedBatch {
            embeddings,
            threshold,
            authenticity,
        })
    }

    /// Compare prepared embeddings with `corpus` and compose the response.
    /// No I/O happens here.
    pub fn finish(&self, prepared: PreparedBatch, corpus: &Corpus) -> ScoredBatch {
        let PreparedBatch {
            embeddings,
            threshold,
            authenticity,
        } = prepared;

        let clip_uniqueness: Vec<f64> = embeddings.iter().map(|e| uniqueness(e, corpus)).collect();
        for (index, u) in clip_uniqueness.iter().enumerate() {
            debug!("Clip {}: uniqueness {:.4} against {} embeddings", index, u, corpus.len());
        }

        let response = compose_proof(&clip_uniqueness, threshold, authenticity, self.dlp_id.as_deref());

        info!(
            "Proof: total {:.4} vs threshold {:.4}, quality {:.4}, score {:.4}, valid {}",
            response.attributes.total_score,
            threshold,
            response.quality,
            response.score,
            response.valid
        );

        ScoredBatch {
            response,
            embeddings,
            clip_uniqueness,
        }
    }

    fn extract_clip(&self, index: usize, clip: &Clip) -> Result<Embedding, ProofError> {
        let decoded;
        let audio = match clip {
            Clip::File(path) => {
                decoded = self
                    .decoder
                    .decode(path)
                    .map_err(|source| ProofError::Decode { clip: index, source })?;
                &decoded
            }
            Clip::Decoded(audio) => audio,
        };

        self.extractor
            .extract_audio(audio)
            .map_err(|source| ProofError::Extraction { clip: index, source })
    }

    fn clip_duration(&self, clip: &Clip) -> Option<f64> {
        match clip {
            Clip::Decoded(audio) => Some(audio.duration_secs),
            Clip::File(path) => match self.decoder.duration(path) {
                Ok(secs) => Some(secs),
                Err(e) => {
                    warn!("Duration check failed for {}: {}", path.display(), e);
                    None
                }
            },
        }
    }
}
