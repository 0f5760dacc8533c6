// src/core/decoder.rs
//
// Audio decoding collaborator. Uses Symphonia for format-agnostic decoding
// and hands the engine a mono buffer plus its duration.

use log::debug;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::error::DecodeError;

/// Decoded mono audio ready for feature extraction
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source before downmixing
    pub source_channels: usize,
    /// Duration in seconds
    pub duration_secs: f64,
}

impl AudioData {
    /// Wrap an in-memory mono buffer
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        let duration_secs = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            source_channels: 1,
            duration_secs,
        }
    }
}

/// Turns a file path into samples. Implementations must report failures as
/// [`DecodeError`] rather than panicking.
pub trait AudioDecoder: Send + Sync {
    /// Fully decode a file to mono samples
    fn decode(&self, path: &Path) -> Result<AudioData, DecodeError>;

    /// Duration of a file in seconds
    fn duration(&self, path: &Path) -> Result<f64, DecodeError> {
        self.decode(path).map(|audio| audio.duration_secs)
    }
}

/// Default decoder backed by Symphonia's probe and codec registry
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<AudioData, DecodeError> {
        decode_audio(path)
    }

    fn duration(&self, path: &Path) -> Result<f64, DecodeError> {
        match probe_duration(path) {
            Ok(secs) => Ok(secs),
            Err(DecodeError::UnknownDuration(reason)) => {
                debug!("Header has no duration for {} ({}), decoding", path.display(), reason);
                decode_audio(path).map(|audio| audio.duration_secs)
            }
            Err(e) => Err(e),
        }
    }
}

fn open_format(path: &Path) -> Result<Box<dyn FormatReader>, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(DecodeError::Probe)?;

    Ok(probed.format)
}

/// Read the duration from container headers without decoding packets
pub fn probe_duration(path: &Path) -> Result<f64, DecodeError> {
    let format = open_format(path)?;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let sample_rate = track.codec_params.sample_rate.ok_or(DecodeError::NoSampleRate)?;
    let n_frames = track
        .codec_params
        .n_frames
        .ok_or_else(|| DecodeError::UnknownDuration("frame count missing".to_string()))?;

    Ok(n_frames as f64 / sample_rate as f64)
}

/// Decode audio file to mono floating-point samples
pub fn decode_audio(path: &Path) -> Result<AudioData, DecodeError> {
    let mut format = open_format(path)?;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or(DecodeError::NoSampleRate)?;
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    if channels == 0 {
        return Err(DecodeError::NoChannels);
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(DecodeError::Codec)?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut decoded_channels = channels;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(DecodeError::Packet(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!("Skipping corrupt packet: {}", reason);
                continue;
            }
            Err(e) => return Err(DecodeError::Packet(e)),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            decoded_channels = spec.channels.count().max(1);
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    if interleaved.is_empty() {
        return Err(DecodeError::Empty);
    }

    let samples = downmix(&interleaved, decoded_channels);
    let duration_secs = samples.len() as f64 / sample_rate as f64;

    debug!(
        "Decoded {}: {} Hz, {} ch, {:.2}s",
        path.display(),
        sample_rate,
        decoded_channels,
        duration_secs
    );

    Ok(AudioData {
        samples,
        sample_rate,
        source_channels: decoded_channels,
        duration_secs,
    })
}

/// Average interleaved channels into one mono channel
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
