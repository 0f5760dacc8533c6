//! Short-time power spectra with centered framing

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use super::windows::{create_window, WindowType};
use crate::core::error::FeatureExtractionError;

/// Frame-wise power spectrum computation.
///
/// Frames are centered: the signal is zero-padded by `fft_size / 2` on both
/// sides, so frame `t` is centered on sample `t * hop_size` and a signal of
/// `n` samples yields `1 + n / hop_size` frames.
pub struct StftProcessor {
    fft: Arc<dyn RealToComplex<f64>>,
    window: Vec<f64>,
    fft_size: usize,
    hop_size: usize,
}

impl StftProcessor {
    pub fn new(fft_size: usize, hop_size: usize, window_type: WindowType) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            window: create_window(fft_size, window_type),
            fft_size,
            hop_size,
        }
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop_size
    }

    /// Number of frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Compute `|X|^2` for every frame
    pub fn power_frames(&self, samples: &[f64]) -> Result<Vec<Vec<f64>>, FeatureExtractionError> {
        let pad = self.fft_size / 2;
        let mut padded = vec![0.0f64; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let num_frames = self.num_frames(samples.len());
        let mut input = self.fft.make_input_vec();
        let mut spectrum: Vec<Complex<f64>> = self.fft.make_output_vec();
        let mut scratch = self.fft.make_scratch_vec();
        let mut frames = Vec::with_capacity(num_frames);

        for t in 0..num_frames {
            let start = t * self.hop_size;
            let frame = &padded[start..start + self.fft_size];

            for ((dst, &s), &w) in input.iter_mut().zip(frame).zip(&self.window) {
                *dst = s * w;
            }

            self.fft
                .process_with_scratch(&mut input, &mut spectrum, &mut scratch)
                .map_err(|e| FeatureExtractionError::Fft(e.to_string()))?;

            frames.push(spectrum.iter().map(|c| c.norm_sqr()).collect());
        }

        Ok(frames)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_frame_count_is_centered() {
        let stft = StftProcessor::new(2048, 512, WindowType::Hann);
        assert_eq!(stft.num_frames(2048), 5);
        assert_eq!(stft.num_frames(16000), 32);
        assert_eq!(stft.num_bins(), 1025);
    }

    #[test]
    fn test_sine_peaks_at_expected_bin() {
        let sr = 16000.0;
        let stft = StftProcessor::new(1024, 256, WindowType::Hann);
        // 1000 Hz lands exactly on bin 64 at this resolution
        let samples: Vec<f64> = (0..4096)
            .map(|i| (2.0 * PI * 1000.0 * i as f64 / sr).sin())
            .collect();

        let frames = stft.power_frames(&samples).unwrap();
        let middle = &frames[frames.len() / 2];
        let peak = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();

        assert_eq!(peak, 64);
    }

    #[test]
    fn test_silence_has_zero_power() {
        let stft = StftProcessor::new(512, 128, WindowType::Hann);
        let frames = stft.power_frames(&vec![0.0; 1024]).unwrap();
        assert!(frames.iter().flatten().all(|&p| p == 0.0));
    }
}
