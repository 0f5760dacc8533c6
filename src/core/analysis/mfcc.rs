// src/core/analysis/mfcc.rs
//
// MFCC analysis for clip fingerprinting. A clip is reduced to the
// time-average of its mel-frequency cepstral coefficients.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::decoder::AudioData;
use crate::core::dsp::{
    dct_ortho_matrix, mel_filterbank, power_to_db, resample_mono, StftProcessor, WindowType,
};
use crate::core::error::FeatureExtractionError;

/// Smallest power value before taking the log
const AMIN: f64 = 1e-10;

/// MFCC analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MfccParams {
    /// Rate every clip is converted to before analysis
    pub sample_rate: u32,
    pub num_coefficients: usize,
    pub num_mel_bands: usize,
    pub fft_size: usize,
    pub hop_size: usize,
    pub window: WindowType,
    /// Dynamic range kept below the loudest mel bin
    pub top_db: Option<f64>,
}

impl Default for MfccParams {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            num_coefficients: 20,
            num_mel_bands: 128,
            fft_size: 2048,
            hop_size: 512,
            window: WindowType::Hann,
            top_db: Some(80.0),
        }
    }
}

impl MfccParams {
    /// Reject parameters the STFT and filterbank cannot work with
    pub fn validate(&self) -> Result<(), FeatureExtractionError> {
        let invalid = |msg: String| -> Result<(), FeatureExtractionError> {
            Err(FeatureExtractionError::InvalidParams(msg))
        };
        if self.sample_rate == 0 {
            return invalid("sample_rate must be > 0".into());
        }
        if self.fft_size < 2 || self.hop_size == 0 {
            return invalid("fft_size must be >= 2 and hop_size > 0".into());
        }
        if self.num_mel_bands == 0
            || self.num_coefficients == 0
            || self.num_coefficients > self.num_mel_bands
        {
            return invalid(format!(
                "num_coefficients ({}) must be in 1..={} (num_mel_bands)",
                self.num_coefficients, self.num_mel_bands
            ));
        }
        if let Some(top_db) = self.top_db {
            if top_db.is_nan() || top_db < 0.0 {
                return invalid("top_db must be >= 0".into());
            }
        }
        Ok(())
    }
}

/// Fixed-length clip fingerprint: one mean value per cepstral coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        self.0.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Converts sample buffers into [`Embedding`]s.
///
/// Filterbank, DCT basis and FFT plan are built once; `extract` only takes
/// `&self`, so one extractor can serve a whole worker pool.
pub struct FeatureExtractor {
    params: MfccParams,
    stft: StftProcessor,
    mel_basis: Vec<Vec<f64>>,
    dct: Vec<Vec<f64>>,
}

impl FeatureExtractor {
    pub fn new(params: MfccParams) -> Result<Self, FeatureExtractionError> {
        params.validate()?;
        Ok(Self::with_valid_params(params))
    }

    fn with_valid_params(params: MfccParams) -> Self {
        let stft = StftProcessor::new(params.fft_size, params.hop_size, params.window);
        let mel_basis = mel_filterbank(
            params.sample_rate,
            params.fft_size,
            params.num_mel_bands,
            0.0,
            params.sample_rate as f64 / 2.0,
        );
        let dct = dct_ortho_matrix(params.num_coefficients, params.num_mel_bands);

        Self {
            params,
            stft,
            mel_basis,
            dct,
        }
    }

    pub fn params(&self) -> &MfccParams {
        &self.params
    }

    /// Minimum number of samples, at the analysis rate, for one full window
    pub fn min_samples(&self) -> usize {
        self.params.fft_size
    }

    /// Extract the embedding of a decoded clip
    pub fn extract_audio(&self, audio: &AudioData) -> Result<Embedding, FeatureExtractionError> {
        self.extract(&audio.samples, audio.sample_rate)
    }

    /// Extract the embedding of a mono buffer recorded at `sample_rate`
    pub fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<Embedding, FeatureExtractionError> {
        let frames = self.mfcc_frames(samples, sample_rate)?;
        let num_frames = frames.len() as f64;

        let mut mean = vec![0.0f64; self.params.num_coefficients];
        for frame in &frames {
            for (acc, &c) in mean.iter_mut().zip(frame) {
                *acc += c;
            }
        }
        for value in &mut mean {
            *value /= num_frames;
        }

        Ok(Embedding::new(mean))
    }

    /// Per-frame MFCCs, `num_frames x num_coefficients`
    pub fn mfcc_frames(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Vec<Vec<f64>>, FeatureExtractionError> {
        if sample_rate == 0 {
            return Err(FeatureExtractionError::ZeroSampleRate);
        }
        if samples.is_empty() {
            return Err(FeatureExtractionError::Empty);
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(FeatureExtractionError::NonFinite { index });
        }

        let signal: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let signal = resample_mono(&signal, sample_rate, self.params.sample_rate)?;

        if signal.len() < self.min_samples() {
            return Err(FeatureExtractionError::TooShort {
                samples: signal.len(),
                required: self.min_samples(),
            });
        }

        let power = self.stft.power_frames(&signal)?;

        let mut mel_frames: Vec<Vec<f64>> = power
            .iter()
            .map(|spectrum| {
                self.mel_basis
                    .iter()
                    .map(|filter| filter.iter().zip(spectrum).map(|(w, p)| w * p).sum())
                    .collect()
            })
            .collect();

        power_to_db(&mut mel_frames, AMIN, self.params.top_db);

        let mfcc: Vec<Vec<f64>> = mel_frames
            .iter()
            .map(|mel_db| {
                self.dct
                    .iter()
                    .map(|basis| basis.iter().zip(mel_db).map(|(w, v)| w * v).sum())
                    .collect()
            })
            .collect();

        debug!(
            "MFCC: {} samples at {} Hz -> {} frames x {} coefficients",
            signal.len(),
            self.params.sample_rate,
            mfcc.len(),
            self.params.num_coefficients
        );

        Ok(mfcc)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::with_valid_params(MfccParams::default())
    }
}
