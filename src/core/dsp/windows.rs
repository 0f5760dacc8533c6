//! Window function implementations

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Periodic Hann, the usual choice for STFT analysis
    #[default]
    Hann,
    Hamming,
}

/// Create a periodic (DFT-even) window of `size` points
pub fn create_window(size: usize, window_type: WindowType) -> Vec<f64> {
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = i as f64;
            match window_type {
                WindowType::Hann => 0.5 - 0.5 * (2.0 * PI * x / n).cos(),
                WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * x / n).cos(),
            }
        })
        .collect()
}
