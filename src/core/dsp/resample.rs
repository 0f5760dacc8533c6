//! Deterministic sample rate conversion using rubato

use log::debug;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::core::error::FeatureExtractionError;

/// Resample a mono buffer to `to_rate`.
///
/// The whole buffer is processed as one chunk with a windowed-sinc
/// interpolator, then flushed and trimmed of the filter delay, so the same
/// input always yields the same output of length `ceil(len * to / from)`.
pub fn resample_mono(
    samples: &[f64],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f64>, FeatureExtractionError> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(FeatureExtractionError::ZeroSampleRate);
    }
    if samples.is_empty() {
        return Err(FeatureExtractionError::Empty);
    }

    let err = |reason: String| FeatureExtractionError::Resample {
        from: from_rate,
        to: to_rate,
        reason,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f64>::new(ratio, 1.0, params, samples.len(), 1)
        .map_err(|e| err(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * ratio).ceil() as usize;

    let mut output = resampler
        .process(&[samples], None)
        .map_err(|e| err(e.to_string()))?
        .swap_remove(0);

    while output.len() < expected + delay {
        let tail = resampler
            .process_partial(None::<&[Vec<f64>]>, None)
            .map_err(|e| err(e.to_string()))?
            .swap_remove(0);
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    let end = (delay + expected).min(output.len());
    let resampled = output[delay.min(end)..end].to_vec();

    debug!(
        "Resampled {} samples at {} Hz to {} samples at {} Hz",
        samples.len(),
        from_rate,
        resampled.len(),
        to_rate
    );

    Ok(resampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, rate: u32, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / rate as f64).sin())
            .collect()
    }

    #[test]
    fn test_same_rate_is_copy() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_mono(&input, 16000, 16000).unwrap(), input);
    }

    #[test]
    fn test_downsample_length() {
        let input = sine(440.0, 44100, 44100);
        let out = resample_mono(&input, 44100, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn test_resample_is_deterministic() {
        let input = sine(1000.0, 48000, 24000);
        let a = resample_mono(&input, 48000, 16000).unwrap();
        let b = resample_mono(&input, 48000, 16000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(
            resample_mono(&[0.0; 10], 0, 16000),
            Err(FeatureExtractionError::ZeroSampleRate)
        ));
    }
}
