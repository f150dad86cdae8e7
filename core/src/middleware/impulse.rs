//! Impulse response decoding
//!
//! Reads RIFF/WAVE impulse responses (8/16/24/32-bit integer PCM or 32-bit
//! float) into interleaved samples normalized to `[-1, 1]`, and encodes them
//! as the convolution reverb's parameter block: native-endian 16-bit words,
//! the channel count first, then every interleaved sample.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use hound::{SampleFormat, WavReader};

#[derive(Debug, thiserror::Error)]
pub enum ImpulseResponseError {
    #[error("failed to read WAV data: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported sample format: {bits}-bit {format:?}")]
    UnsupportedFormat { format: SampleFormat, bits: u16 },
    #[error("impulse response contains no samples")]
    Empty,
    #[error("channel count {0} does not fit the parameter block")]
    TooManyChannels(u16),
}

/// Decoded impulse response
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl ImpulseResponse {
    /// Build from already-decoded interleaved samples
    pub fn from_samples(
        channels: u16,
        sample_rate: u32,
        samples: Vec<f32>,
    ) -> Result<Self, ImpulseResponseError> {
        if channels == 0 || samples.is_empty() {
            return Err(ImpulseResponseError::Empty);
        }
        Ok(Self {
            channels,
            sample_rate,
            samples,
        })
    }

    pub fn from_wav_path(path: impl AsRef<Path>) -> Result<Self, ImpulseResponseError> {
        let reader = WavReader::open(path.as_ref())?;
        Self::decode(reader)
    }

    pub fn from_wav_reader<R: Read>(reader: R) -> Result<Self, ImpulseResponseError> {
        Self::decode(WavReader::new(reader)?)
    }

    fn decode<R: Read>(mut reader: WavReader<R>) -> Result<Self, ImpulseResponseError> {
        let spec = reader.spec();
        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
            (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
                let scale = (1u64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / scale))
                    .collect::<Result<Vec<_>, _>>()?
            }
            (format, bits) => {
                return Err(ImpulseResponseError::UnsupportedFormat { format, bits });
            }
        };
        Self::from_samples(spec.channels, spec.sample_rate, samples)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples in `[-1, 1]`
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0, |peak, sample| peak.max(sample.abs()))
    }

    /// Parameter block for the convolution reverb
    pub fn parameter_data(&self) -> Result<Vec<u8>, ImpulseResponseError> {
        let channels = i16::try_from(self.channels)
            .map_err(|_| ImpulseResponseError::TooManyChannels(self.channels))?;
        let words: Vec<i16> = std::iter::once(channels)
            .chain(self.samples.iter().map(|&sample| to_pcm16(sample)))
            .collect();
        Ok(bytemuck::cast_slice(&words).to_vec())
    }
}

fn to_pcm16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}
