//! Finished, playable sound assets.
//!
//! An asset is immutable 16-bit PCM. Once stored in the synthesis cache it is
//! shared by `Arc` and never modified.

use std::io::Cursor;
use std::time::Duration;

use tracing::error;

use crate::error::{AudioError, AudioResult};
use crate::spatial::StereoBuffer;
use crate::tone::DEFAULT_SAMPLE_RATE;

/// Largest sample magnitude after quantization (`2^15 - 1`).
pub const PCM_FULL_SCALE: f64 = 32767.0;

/// Number of channels in every synthesized asset.
pub const STEREO_CHANNELS: u16 = 2;

/// Interleaved 16-bit PCM audio ready for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundAsset {
    sample_rate: u32,
    channels: u16,
    samples: Vec<i16>,
}

impl SoundAsset {
    /// Wrap interleaved samples.
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> AudioResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(AudioError::EncodingFailure(format!(
                "invalid layout: {sample_rate} Hz, {channels} channels"
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::EncodingFailure(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    /// An all-zero asset with `frames` frames.
    #[must_use]
    pub fn silent(sample_rate: u32, channels: u16, frames: usize) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
            samples: vec![0; frames * channels.max(1) as usize],
        }
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved samples.
    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Samples per channel.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Playback length.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }

    /// Samples of one channel, in order.
    pub fn channel(&self, index: u16) -> impl Iterator<Item = i16> + '_ {
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels as usize)
            .copied()
    }

    /// Largest absolute sample value.
    #[must_use]
    pub fn peak(&self) -> u16 {
        self.samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
    }

    /// True when every sample is zero.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|s| *s == 0)
    }

    /// Size of the PCM payload in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.samples.len() * std::mem::size_of::<i16>()
    }

    /// Encode as a RIFF/WAVE file in memory.
    pub fn to_wav_bytes(&self) -> AudioResult<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.size_bytes()));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}

/// Normalizes, quantizes and packages stereo buffers.
#[derive(Debug, Clone, Copy)]
pub struct AssetEncoder {
    sample_rate: u32,
}

impl Default for AssetEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AssetEncoder {
    /// Create an encoder for the given sample rate.
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Scale to a peak of `ceiling` (fraction of full scale) and quantize.
    ///
    /// Silent input stays silent.
    pub fn encode(&self, stereo: &StereoBuffer, ceiling: f64) -> AudioResult<SoundAsset> {
        if stereo.left.len() != stereo.right.len() {
            return Err(AudioError::EncodingFailure(format!(
                "channel length mismatch: {} vs {}",
                stereo.left.len(),
                stereo.right.len()
            )));
        }

        if stereo.left.iter().chain(&stereo.right).any(|s| !s.is_finite()) {
            return Err(AudioError::unstable("normalization", "non-finite sample"));
        }

        let peak = stereo.peak();
        // Divide first so the peak sample lands on exactly `ceiling`
        let quantize = |s: f64| {
            if peak > 0.0 {
                (s / peak * ceiling * PCM_FULL_SCALE) as i16
            } else {
                0
            }
        };
        let samples = stereo
            .left
            .iter()
            .zip(&stereo.right)
            .flat_map(|(&l, &r)| [quantize(l), quantize(r)])
            .collect();

        SoundAsset::new(self.sample_rate, STEREO_CHANNELS, samples)
    }

    /// [`encode`](Self::encode), substituting silence of the same length on failure.
    #[must_use]
    pub fn encode_or_silent(&self, stereo: &StereoBuffer, ceiling: f64) -> SoundAsset {
        match self.encode(stereo, ceiling) {
            Ok(asset) => asset,
            Err(e) => {
                error!("Failed to create sound asset: {e}. Using silent fallback.");
                let frames = stereo.left.len().max(stereo.right.len());
                SoundAsset::silent(self.sample_rate, STEREO_CHANNELS, frames)
            },
        }
    }
}
