// tests/test_utils/mod.rs
//
// Shared fixtures: synthetic WAV files written with hound into temp dirs,
// plus helpers for driving the built binary.

#![allow(dead_code)]

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::process::Command;

use audioproof::core::ThresholdConfig;
use audioproof::ProofConfig;

pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_audioproof"))
}

pub fn run_audioproof<I, S>(args: I) -> std::process::Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(binary_path())
        .args(args)
        .env_remove("DLP_ID")
        .output()
        .expect("Failed to execute audioproof")
}

/// Config with a fixed threshold so no test touches the network
pub fn fixed_config(threshold: f64) -> ProofConfig {
    ProofConfig {
        threshold: ThresholdConfig {
            fixed: Some(threshold),
            ..ThresholdConfig::default()
        },
        ..ProofConfig::default()
    }
}

pub fn sine(freq: f32, secs: f32, sample_rate: u32, amplitude: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * secs) as usize;
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Two-tone chord, roughly speech-band
pub fn chord(freqs: &[f32], secs: f32, sample_rate: u32) -> Vec<f32> {
    let len = (sample_rate as f32 * secs) as usize;
    let gain = 0.8 / freqs.len().max(1) as f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs.iter().map(|f| gain * (2.0 * PI * f * t).sin()).sum()
        })
        .collect()
}

/// Deterministic white noise
pub fn noise(secs: f32, sample_rate: u32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = (sample_rate as f32 * secs) as usize;
    (0..len).map(|_| rng.gen_range(-0.5..0.5)).collect()
}

/// Write interleaved samples as 16-bit PCM
pub fn write_wav_i16(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Write interleaved samples as 32-bit float
pub fn write_wav_f32(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).expect("create wav");
    for &s in samples {
        writer.write_sample(s).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// Duplicate a mono signal into interleaved stereo
pub fn to_stereo(mono: &[f32]) -> Vec<f32> {
    mono.iter().flat_map(|&s| [s, s]).collect()
}
