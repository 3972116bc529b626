//! Procedural tone synthesis.
//!
//! Each object type has a fixed base pitch. Distance raises the pitch along a
//! logarithmic curve so that far objects sound higher without ever leaving a
//! comfortable hearing range.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default length of an object cue in seconds.
pub const DEFAULT_TONE_DURATION: f64 = 0.2;

/// Shortest object cue in seconds.
pub const MIN_TONE_DURATION: f64 = 0.01;

/// Longest object cue in seconds.
pub const MAX_TONE_DURATION: f64 = 10.0;

/// Lowest frequency a tone may have.
pub const MIN_TONE_FREQUENCY: f64 = 100.0;

/// Highest frequency a tone may have.
pub const MAX_TONE_FREQUENCY: f64 = 2000.0;

/// Hz added per unit of `ln(1 + distance)`.
pub const DISTANCE_PITCH_SCALE: f64 = 50.0;

/// Fade-in/fade-out length for object cues, in seconds.
pub const TONE_FADE_SECONDS: f64 = 0.02;

/// Audio classification of a catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ObjectAudioType {
    /// A star (the Sun).
    Star,
    /// A major planet. Also used for unrecognised catalog types.
    #[default]
    Planet,
    /// A dwarf planet.
    DwarfPlanet,
    /// A natural satellite.
    Moon,
    /// An asteroid.
    Asteroid,
    /// A comet.
    Comet,
    /// A spacecraft.
    Spacecraft,
}

impl ObjectAudioType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Star,
        Self::Planet,
        Self::DwarfPlanet,
        Self::Moon,
        Self::Asteroid,
        Self::Comet,
        Self::Spacecraft,
    ];

    /// Base frequency in Hz.
    #[must_use]
    pub const fn base_frequency(&self) -> f64 {
        match self {
            Self::Star => 220.0,
            Self::Planet => 440.0,
            Self::DwarfPlanet => 493.88,
            Self::Moon => 523.25,
            Self::Asteroid => 587.33,
            Self::Comet => 659.25,
            Self::Spacecraft => 784.0,
        }
    }

    /// Catalog spelling of this type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Star => "Star",
            Self::Planet => "Planet",
            Self::DwarfPlanet => "Dwarf Planet",
            Self::Moon => "Moon",
            Self::Asteroid => "Asteroid",
            Self::Comet => "Comet",
            Self::Spacecraft => "Spacecraft",
        }
    }

    /// Parse a catalog type name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Parse a catalog type name, falling back to [`ObjectAudioType::Planet`].
    ///
    /// Planet carries the 440 Hz fallback pitch used for unknown types.
    #[must_use]
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            debug!("Unknown object type '{name}', using 440 Hz fallback");
            Self::default()
        })
    }
}

/// Base frequency for a catalog type name; unknown names give 440 Hz.
#[must_use]
pub fn base_frequency_for_name(name: &str) -> f64 {
    ObjectAudioType::from_name_or_default(name).base_frequency()
}

/// Apply a linear fade-in and fade-out of `fade_len` samples each.
///
/// The ramps run from exactly 0.0 to 1.0 (and back), endpoints included.
/// Short buffers get shorter ramps; at least one sample between the two
/// ramps is left untouched, and buffers under three samples are not faded.
pub fn apply_linear_fades(samples: &mut [f64], fade_len: usize) {
    let fade_len = fade_len.min(samples.len().saturating_sub(1) / 2);
    if fade_len == 0 {
        return;
    }

    let denom = (fade_len - 1).max(1) as f64;
    let len = samples.len();
    for i in 0..fade_len {
        let gain = i as f64 / denom;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}

/// Generates the mono base waveform for an object cue.
#[derive(Debug, Clone, Copy)]
pub struct ToneSynthesizer {
    sample_rate: u32,
}

impl Default for ToneSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl ToneSynthesizer {
    /// Create a synthesizer for the given sample rate.
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Carrier frequency for an object type at a distance.
    #[must_use]
    pub fn frequency(object_type: ObjectAudioType, distance_au: f64) -> f64 {
        let offset = distance_au.ln_1p() * DISTANCE_PITCH_SCALE;
        (object_type.base_frequency() + offset).clamp(MIN_TONE_FREQUENCY, MAX_TONE_FREQUENCY)
    }

    /// Number of samples in `duration` seconds, capped at [`MAX_TONE_DURATION`].
    #[must_use]
    pub fn sample_count(&self, duration: f64) -> usize {
        let duration = if duration.is_finite() {
            duration.clamp(0.0, MAX_TONE_DURATION)
        } else {
            0.0
        };
        (f64::from(self.sample_rate) * duration) as usize
    }

    /// Render the faded sine cue.
    #[must_use]
    pub fn generate(&self, object_type: ObjectAudioType, distance_au: f64, duration: f64) -> Vec<f64> {
        let freq = Self::frequency(object_type, distance_au);
        let rate = f64::from(self.sample_rate);

        let mut samples: Vec<f64> = (0..self.sample_count(duration))
            .map(|i| (TAU * freq * i as f64 / rate).sin())
            .collect();

        apply_linear_fades(&mut samples, (rate * TONE_FADE_SECONDS) as usize);
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base_frequency_at_zero_distance() {
        for t in ObjectAudioType::ALL {
            assert_eq!(ToneSynthesizer::frequency(t, 0.0), t.base_frequency());
        }
    }

    #[test]
    fn test_frequency_offset() {
        let f = ToneSynthesizer::frequency(ObjectAudioType::Planet, 1.0);
        assert!((f - (440.0 + 2.0_f64.ln() * 50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_saturates() {
        let f = ToneSynthesizer::frequency(ObjectAudioType::Spacecraft, 1e12);
        assert_eq!(f, MAX_TONE_FREQUENCY);
        let f = ToneSynthesizer::frequency(ObjectAudioType::Star, f64::MAX);
        assert_eq!(f, MAX_TONE_FREQUENCY);
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(ObjectAudioType::from_name("Dwarf Planet"), Some(ObjectAudioType::DwarfPlanet));
        assert_eq!(ObjectAudioType::from_name("Nebula"), None);
        assert_eq!(base_frequency_for_name("Nebula"), 440.0);
        assert_eq!(base_frequency_for_name("Comet"), 659.25);
    }

    #[test]
    fn test_generate_length_and_fades() {
        let synth = ToneSynthesizer::default();
        let tone = synth.generate(ObjectAudioType::Moon, 0.5, DEFAULT_TONE_DURATION);
        assert_eq!(tone.len(), 8820);
        assert_eq!(tone[0], 0.0);
        assert_eq!(tone[tone.len() - 1], 0.0);

        // Past the fade the waveform reaches full scale
        let body_peak = tone[882..tone.len() - 882]
            .iter()
            .fold(0.0_f64, |m, s| m.max(s.abs()));
        assert!(body_peak > 0.99);
    }

    #[test]
    fn test_fades_on_tiny_buffer() {
        let mut samples = vec![1.0; 3];
        apply_linear_fades(&mut samples, 882);
        assert_eq!(samples, vec![0.0, 1.0, 0.0]);

        let mut empty: Vec<f64> = Vec::new();
        apply_linear_fades(&mut empty, 882);
        assert!(empty.is_empty());

        let mut pair = vec![0.5, -0.5];
        apply_linear_fades(&mut pair, 882);
        assert_eq!(pair, vec![0.5, -0.5]);
    }

    #[test]
    fn test_two_sample_tone_is_audible() {
        let synth = ToneSynthesizer::default();
        let tone = synth.generate(ObjectAudioType::Planet, 0.0, 2.0 / 44_100.0);
        assert_eq!(tone.len(), 2);
        assert!(tone[1].abs() > 0.0);
    }

    #[test]
    fn test_sample_count_is_capped() {
        let synth = ToneSynthesizer::default();
        assert_eq!(synth.sample_count(1e15), 441_000);
        assert_eq!(synth.sample_count(f64::INFINITY), 0);
        assert_eq!(synth.sample_count(-1.0), 0);
    }

    proptest! {
        #[test]
        fn prop_frequency_in_range(distance in 0.0f64..1e9, idx in 0usize..7) {
            let f = ToneSynthesizer::frequency(ObjectAudioType::ALL[idx], distance);
            prop_assert!((MIN_TONE_FREQUENCY..=MAX_TONE_FREQUENCY).contains(&f));
        }
    }
}
