//! Pulsating warning tones for space-weather alerts.
//!
//! Alerts bypass the spatial pipeline and the cache. They are centred (both
//! channels identical) and normalized to half of full scale so they stay
//! below the ambient bed they may be layered over.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asset::{AssetEncoder, SoundAsset};
use crate::spatial::StereoBuffer;
use crate::tone::{apply_linear_fades, DEFAULT_SAMPLE_RATE};

/// Default alert length in seconds.
pub const DEFAULT_ALERT_DURATION: f64 = 2.0;

/// Longest alert in seconds.
pub const MAX_ALERT_DURATION: f64 = 30.0;

/// Default pulses per second.
pub const DEFAULT_PULSE_RATE: f64 = 4.0;

/// Fade-in/fade-out length for alerts, in seconds.
pub const ALERT_FADE_SECONDS: f64 = 0.05;

/// Carrier level before normalization.
pub const ALERT_GAIN: f64 = 0.3;

/// Peak level of an encoded alert as a fraction of full scale.
pub const ALERT_CEILING: f64 = 0.5;

/// Kind of space-weather event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    /// Solar flare.
    #[default]
    Flare,
    /// Coronal mass ejection.
    Cme,
    /// Geomagnetic storm.
    Storm,
}

impl AlertCategory {
    /// Carrier frequency in Hz.
    #[must_use]
    pub const fn base_frequency(&self) -> f64 {
        match self {
            Self::Flare => 220.0,
            Self::Cme => 330.0,
            Self::Storm => 165.0,
        }
    }

    /// Parse "flare", "cme" or "storm".
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "flare" => Some(Self::Flare),
            "cme" => Some(Self::Cme),
            "storm" => Some(Self::Storm),
            _ => None,
        }
    }

    /// Parse a category name, falling back to [`AlertCategory::Flare`].
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            debug!("Unknown alert category '{name}', using flare tone");
            Self::default()
        })
    }
}

/// Parameters of one alert tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRequest {
    /// Event kind.
    pub category: AlertCategory,
    /// Length in seconds.
    pub duration: f64,
    /// Pulses per second.
    pub pulse_rate: f64,
}

impl AlertRequest {
    /// Request with the default duration and pulse rate.
    #[must_use]
    pub const fn new(category: AlertCategory) -> Self {
        Self {
            category,
            duration: DEFAULT_ALERT_DURATION,
            pulse_rate: DEFAULT_PULSE_RATE,
        }
    }

    /// Override the duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Override the pulse rate.
    #[must_use]
    pub const fn with_pulse_rate(mut self, pulse_rate: f64) -> Self {
        self.pulse_rate = pulse_rate;
        self
    }
}

/// Generates alert tones.
#[derive(Debug, Clone, Copy)]
pub struct AlertToneSynthesizer {
    sample_rate: u32,
    encoder: AssetEncoder,
}

impl Default for AlertToneSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl AlertToneSynthesizer {
    /// Create a synthesizer for the given sample rate.
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            encoder: AssetEncoder::new(sample_rate),
        }
    }

    /// Amplitude-modulated mono signal, faded at both ends.
    ///
    /// Durations are clamped to `0..=MAX_ALERT_DURATION`. The modulator is
    /// unipolar, `(sin + 1) / 2`, so the tone dips to silence only at the very
    /// bottom of each pulse.
    #[must_use]
    pub fn render_mono(&self, request: &AlertRequest) -> Vec<f64> {
        let rate = f64::from(self.sample_rate);
        let duration = if request.duration.is_finite() {
            request.duration.clamp(0.0, MAX_ALERT_DURATION)
        } else {
            0.0
        };
        let pulse_rate = if request.pulse_rate.is_finite() {
            request.pulse_rate
        } else {
            DEFAULT_PULSE_RATE
        };
        let freq = request.category.base_frequency();

        let mut samples: Vec<f64> = (0..(rate * duration) as usize)
            .map(|i| {
                let t = i as f64 / rate;
                let carrier = (TAU * freq * t).sin();
                let modulator = ((TAU * pulse_rate * t).sin() + 1.0) / 2.0;
                carrier * modulator * ALERT_GAIN
            })
            .collect();

        apply_linear_fades(&mut samples, (rate * ALERT_FADE_SECONDS) as usize);
        samples
    }

    /// Render and encode an alert.
    #[must_use]
    pub fn synthesize(&self, request: &AlertRequest) -> SoundAsset {
        debug!(
            category = ?request.category,
            duration = request.duration,
            pulse_rate = request.pulse_rate,
            "Synthesizing alert tone"
        );
        let stereo = StereoBuffer::duplicated(&self.render_mono(request));
        self.encoder.encode_or_silent(&stereo, ALERT_CEILING)
    }
}
