//! Spatial effects for object cues.
//!
//! Turns the mono base tone into a stereo buffer according to the listener's
//! complexity tier:
//!
//! | Tier     | Low-pass | Panning | Reverb | Attenuation |
//! |----------|----------|---------|--------|-------------|
//! | Simple   |          |         |        | yes         |
//! | Moderate |          | yes     |        | yes         |
//! | Complex  | yes      | yes     | yes    | yes         |
//!
//! Complex runs its stages in exactly the order of the table columns, with the
//! low-pass applied to the mono signal before it is panned.

use std::f64::consts::FRAC_PI_4;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::filter::ButterworthLowpass;
use crate::tone::ObjectAudioType;

/// Distance in AU that maps to a fully panned or fully bucketed position.
pub const MAX_AUDIO_DISTANCE: f64 = 40.0;

/// Low-pass cutoff for an object at the observer.
pub const NEAR_CUTOFF_HZ: f64 = 8000.0;

/// Lowest low-pass cutoff for very distant objects.
pub const FAR_CUTOFF_HZ: f64 = 200.0;

/// Cutoff reduction per AU.
pub const CUTOFF_HZ_PER_AU: f64 = 500.0;

/// Shortest reverb delay in milliseconds.
pub const MIN_REVERB_DELAY_MS: f64 = 50.0;

/// Longest reverb delay in milliseconds.
pub const MAX_REVERB_DELAY_MS: f64 = 150.0;

/// Quietest distance attenuation (keeps far objects audible).
pub const MIN_ATTENUATION: f64 = 0.05;

/// Loudest distance attenuation (hearing safety).
pub const MAX_ATTENUATION: f64 = 0.6;

/// Processing preset tied to the user experience mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    /// Attenuation only, identical channels.
    Simple,
    /// Panning and attenuation.
    #[default]
    Moderate,
    /// Low-pass, panning, reverb and attenuation.
    Complex,
}

impl ComplexityTier {
    /// Every tier, simplest first.
    pub const ALL: [Self; 3] = [Self::Simple, Self::Moderate, Self::Complex];

    /// Lowercase name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }

    /// Parse a lowercase tier name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Spoken summary of the active audio features.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Simple => "Mono audio with distance-based volume",
            Self::Moderate => "Stereo panning with distance attenuation",
            Self::Complex => {
                "Full 3D audio: stereo panning, depth filtering, reverb, distance attenuation"
            },
        }
    }
}

/// Everything needed to synthesize one object cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialInput {
    /// Object classification.
    pub object_type: ObjectAudioType,
    /// Horizontal position in AU (drives panning).
    pub x: f64,
    /// Vertical position in AU.
    pub y: f64,
    /// Depth in AU (drives reverb delay).
    pub z: f64,
    /// Distance from the listener in AU.
    pub distance_au: f64,
    /// Processing preset.
    pub tier: ComplexityTier,
}

impl SpatialInput {
    /// Create an input. Non-finite coordinates become 0 and the distance is
    /// clamped to be non-negative.
    #[must_use]
    pub fn new(
        object_type: ObjectAudioType,
        x: f64,
        y: f64,
        z: f64,
        distance_au: f64,
        tier: ComplexityTier,
    ) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            object_type,
            x: finite(x),
            y: finite(y),
            z: finite(z),
            distance_au: finite(distance_au).max(0.0),
            tier,
        }
    }
}

/// Two equally long channels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StereoBuffer {
    /// Left channel samples.
    pub left: Vec<f64>,
    /// Right channel samples.
    pub right: Vec<f64>,
}

impl StereoBuffer {
    /// Copy a mono signal into both channels.
    #[must_use]
    pub fn duplicated(mono: &[f64]) -> Self {
        Self {
            left: mono.to_vec(),
            right: mono.to_vec(),
        }
    }

    /// Frames per channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Largest absolute sample across both channels.
    #[must_use]
    pub fn peak(&self) -> f64 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0, |peak, s| peak.max(s.abs()))
    }

    /// Multiply every sample by `gain`.
    pub fn scale(&mut self, gain: f64) {
        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= gain;
        }
    }
}

/// Left/right gains for a horizontal position.
///
/// `pan = clamp(x / 40, -1, 1)` is mapped to an angle of `pan * pi/4` and the
/// gains are `(cos, sin)` of that angle. At `x = 0` this yields `(1.0, 0.0)`,
/// not an equal-power centre.
#[must_use]
pub fn pan_gains(x: f64) -> (f64, f64) {
    let pan = (x / MAX_AUDIO_DISTANCE).clamp(-1.0, 1.0);
    let angle = pan * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

/// Constant-power stereo panning.
#[must_use]
pub fn apply_stereo_panning(mono: &[f64], x: f64) -> StereoBuffer {
    let (left_gain, right_gain) = pan_gains(x);
    StereoBuffer {
        left: mono.iter().map(|s| s * left_gain).collect(),
        right: mono.iter().map(|s| s * right_gain).collect(),
    }
}

/// Low-pass cutoff in Hz for a distance: 8 kHz nearby, down to 200 Hz.
#[must_use]
pub fn low_pass_cutoff(distance_au: f64) -> f64 {
    (NEAR_CUTOFF_HZ - distance_au * CUTOFF_HZ_PER_AU).max(FAR_CUTOFF_HZ)
}

/// Muffle a mono signal according to distance.
///
/// Filter failures are logged and the input is returned unfiltered.
#[must_use]
pub fn apply_low_pass(mono: &[f64], distance_au: f64, sample_rate: u32) -> Vec<f64> {
    let cutoff = low_pass_cutoff(distance_au);
    let filtered = ButterworthLowpass::with_cutoff_hz(cutoff, sample_rate)
        .and_then(|filter| filter.filtfilt(mono));

    match filtered {
        Ok(out) => out,
        Err(e) => {
            warn!("Low-pass filter failed: {e}. Returning unfiltered audio.");
            mono.to_vec()
        },
    }
}

/// Delay and decay of the single-tap echo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Echo delay in samples.
    pub delay_samples: usize,
    /// Echo gain.
    pub decay: f64,
}

impl ReverbParams {
    /// Echo parameters for a depth and distance.
    ///
    /// Delay is `50 + |z| * 20` whole milliseconds, clamped to 50..=150 ms.
    /// Decay is `0.3 + distance * 0.05`, clamped to 0.3..=0.7.
    #[must_use]
    pub fn for_position(z: f64, distance_au: f64, sample_rate: u32) -> Self {
        let delay_ms = (MIN_REVERB_DELAY_MS + z.abs() * 20.0)
            .floor()
            .clamp(MIN_REVERB_DELAY_MS, MAX_REVERB_DELAY_MS);
        Self {
            delay_samples: (delay_ms * f64::from(sample_rate) / 1000.0) as usize,
            decay: (0.3 + distance_au * 0.05).clamp(0.3, 0.7),
        }
    }
}

/// Additive single-tap echo: `out[n + delay] += in[n] * decay`.
pub fn apply_reverb(stereo: &mut StereoBuffer, params: ReverbParams) {
    for channel in [&mut stereo.left, &mut stereo.right] {
        let len = channel.len();
        if len <= params.delay_samples {
            continue;
        }
        let dry = channel[..len - params.delay_samples].to_vec();
        for (out, src) in channel[params.delay_samples..].iter_mut().zip(dry) {
            *out += src * params.decay;
        }
    }
}

/// Inverse-square distance gain clamped to 0.05..=0.6.
#[must_use]
pub fn attenuation_factor(distance_au: f64) -> f64 {
    (1.0 / (distance_au * distance_au).max(0.5)).clamp(MIN_ATTENUATION, MAX_ATTENUATION)
}

/// Selects and runs the per-tier processing.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEffectsChain {
    sample_rate: u32,
}

impl SpatialEffectsChain {
    /// Create a chain for the given sample rate.
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Process a mono tone into a stereo buffer of the same length.
    #[must_use]
    pub fn process(&self, mono: &[f64], input: &SpatialInput) -> StereoBuffer {
        debug!(tier = input.tier.name(), "Applying spatial effects");
        match input.tier {
            ComplexityTier::Simple => Self::simple(mono, input),
            ComplexityTier::Moderate => Self::moderate(mono, input),
            ComplexityTier::Complex => self.complex(mono, input),
        }
    }

    fn simple(mono: &[f64], input: &SpatialInput) -> StereoBuffer {
        let mut stereo = StereoBuffer::duplicated(mono);
        stereo.scale(attenuation_factor(input.distance_au));
        stereo
    }

    fn moderate(mono: &[f64], input: &SpatialInput) -> StereoBuffer {
        let mut stereo = apply_stereo_panning(mono, input.x);
        stereo.scale(attenuation_factor(input.distance_au));
        stereo
    }

    fn complex(&self, mono: &[f64], input: &SpatialInput) -> StereoBuffer {
        let filtered = apply_low_pass(mono, input.distance_au, self.sample_rate);
        let mut stereo = apply_stereo_panning(&filtered, input.x);
        apply_reverb(
            &mut stereo,
            ReverbParams::for_position(input.z, input.distance_au, self.sample_rate),
        );
        stereo.scale(attenuation_factor(input.distance_au));
        stereo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(x: f64, z: f64, distance: f64, tier: ComplexityTier) -> SpatialInput {
        SpatialInput::new(ObjectAudioType::Planet, x, 0.0, z, distance, tier)
    }

    fn ramp(len: usize) -> Vec<f64> {
        (0..len).map(|i| ((i % 100) as f64 / 50.0) - 1.0).collect()
    }

    #[test]
    fn test_pan_at_origin_is_left_only() {
        let (l, r) = pan_gains(0.0);
        assert_eq!(l, 1.0);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn test_pan_extremes() {
        let (l, r) = pan_gains(100.0);
        assert!((l - r).abs() < 1e-12);
        let (l, r) = pan_gains(-40.0);
        assert!((l - FRAC_PI_4.cos()).abs() < 1e-12);
        assert!((r + FRAC_PI_4.sin()).abs() < 1e-12);
    }

    #[test]
    fn test_pan_gains_constant_power_on_right() {
        for x in [0.0, 5.0, 20.0, 40.0] {
            let (l, r) = pan_gains(x);
            assert!((l * l + r * r - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_attenuation_clamps() {
        assert_eq!(attenuation_factor(0.0), MAX_ATTENUATION);
        assert_eq!(attenuation_factor(0.5), MAX_ATTENUATION);
        assert!((attenuation_factor(3.17) - 1.0 / (3.17 * 3.17)).abs() < 1e-12);
        assert_eq!(attenuation_factor(4.48), MIN_ATTENUATION);
        assert_eq!(attenuation_factor(10.0), MIN_ATTENUATION);
        assert!((attenuation_factor(2.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_low_pass_cutoff() {
        assert_eq!(low_pass_cutoff(0.0), 8000.0);
        assert_eq!(low_pass_cutoff(10.0), 3000.0);
        assert_eq!(low_pass_cutoff(100.0), 200.0);
    }

    #[test]
    fn test_reverb_params() {
        let p = ReverbParams::for_position(0.0, 0.0, 44_100);
        assert_eq!(p.delay_samples, 2205);
        assert!((p.decay - 0.3).abs() < 1e-12);

        let p = ReverbParams::for_position(-2.5, 4.0, 44_100);
        assert_eq!(p.delay_samples, 4410);
        assert!((p.decay - 0.5).abs() < 1e-12);

        let p = ReverbParams::for_position(50.0, 50.0, 44_100);
        assert_eq!(p.delay_samples, 6615);
        assert!((p.decay - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_reverb_is_single_tap() {
        let mut stereo = StereoBuffer::duplicated(&[1.0, 0.0, 0.0, 0.0, 0.0]);
        apply_reverb(
            &mut stereo,
            ReverbParams {
                delay_samples: 2,
                decay: 0.5,
            },
        );
        assert_eq!(stereo.left, vec![1.0, 0.0, 0.5, 0.0, 0.0]);
        assert_eq!(stereo.right, stereo.left);
    }

    #[test]
    fn test_reverb_longer_than_buffer_is_noop() {
        let mut stereo = StereoBuffer::duplicated(&[1.0, 1.0]);
        apply_reverb(
            &mut stereo,
            ReverbParams {
                delay_samples: 5,
                decay: 0.5,
            },
        );
        assert_eq!(stereo.left, vec![1.0, 1.0]);
    }

    #[test]
    fn test_simple_tier_duplicates_channels() {
        let chain = SpatialEffectsChain::new(44_100);
        let mono = ramp(1000);
        let out = chain.process(&mono, &input(17.0, 3.0, 0.2, ComplexityTier::Simple));
        assert_eq!(out.left, out.right);
        assert!((out.left[10] - mono[10] * MAX_ATTENUATION).abs() < 1e-12);
    }

    #[test]
    fn test_moderate_tier_pans() {
        let chain = SpatialEffectsChain::new(44_100);
        let mono = ramp(1000);
        let out = chain.process(&mono, &input(10.0, 0.0, 10.0, ComplexityTier::Moderate));
        assert_eq!(out.len(), mono.len());
        assert_ne!(out.left, out.right);

        let (l, r) = pan_gains(10.0);
        assert!((out.left[7] - mono[7] * l * 0.05).abs() < 1e-12);
        assert!((out.right[7] - mono[7] * r * 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_moderate_at_origin_silences_right() {
        let chain = SpatialEffectsChain::new(44_100);
        let out = chain.process(&ramp(500), &input(0.0, 0.0, 1.0, ComplexityTier::Moderate));
        assert!(out.right.iter().all(|s| *s == 0.0));
        assert!(out.peak() > 0.0);
    }

    #[test]
    fn test_complex_tier_keeps_length_and_adds_echo() {
        let chain = SpatialEffectsChain::new(44_100);
        let mut mono = vec![0.0; 8820];
        mono[100] = 1.0;
        let out = chain.process(&mono, &input(20.0, 0.0, 0.0, ComplexityTier::Complex));
        assert_eq!(out.len(), 8820);

        // Echo lands 50 ms after the impulse
        let echo = out.left[100 + 2205].abs();
        assert!(echo > 0.0);
        assert!(out.left[100 + 1000].abs() < echo);
    }

    #[test]
    fn test_spatial_input_sanitizes() {
        let i = SpatialInput::new(
            ObjectAudioType::Comet,
            f64::NAN,
            1.0,
            f64::INFINITY,
            -3.0,
            ComplexityTier::Complex,
        );
        assert_eq!(i.x, 0.0);
        assert_eq!(i.z, 0.0);
        assert_eq!(i.distance_au, 0.0);
    }

    #[test]
    fn test_tier_names() {
        for tier in ComplexityTier::ALL {
            assert_eq!(ComplexityTier::from_name(tier.name()), Some(tier));
        }
        assert!(ComplexityTier::Complex.description().starts_with("Full 3D audio"));
    }
}
