//! Digital Signal Processing utilities
//!
//! Building blocks for the MFCC front end: window functions, centered
//! short-time power spectra, the mel filterbank and sample rate conversion.

mod mel;
mod resample;
mod stft;
mod windows;

pub use mel::{hz_to_mel, mel_filterbank, mel_to_hz};
pub use resample::resample_mono;
pub use stft::StftProcessor;
pub use windows::{create_window, WindowType};

/// Power spectrogram to decibels, referenced to 1.0.
///
/// Values below `amin` are clamped before the log, and the result is floored
/// at `max - top_db` over the whole input.
pub fn power_to_db(frames: &mut [Vec<f64>], amin: f64, top_db: Option<f64>) {
    let mut max_db = f64::NEG_INFINITY;
    for value in frames.iter_mut().flat_map(|f| f.iter_mut()) {
        *value = 10.0 * value.max(amin).log10();
        max_db = max_db.max(*value);
    }

    if let Some(top_db) = top_db {
        let floor = max_db - top_db;
        for value in frames.iter_mut().flat_map(|f| f.iter_mut()) {
            *value = value.max(floor);
        }
    }
}

/// Orthonormal DCT-II basis, `n_out` rows of `n_in` weights
pub fn dct_ortho_matrix(n_out: usize, n_in: usize) -> Vec<Vec<f64>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| {
                    scale * (std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()
                })
                .collect()
        })
        .collect()
}
