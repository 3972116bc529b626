//! Audio engine facade.
//!
//! Ties tone synthesis, spatial effects, encoding and the synthesis cache
//! together behind the operations the exploration loop calls.
//!
//! # Architecture
//!
//! ```text
//! SpatialInput ──► CacheKey ──► SynthesisCache ──hit──► Arc<SoundAsset>
//!                                    │ miss
//!                                    ▼
//!              ToneSynthesizer ─► SpatialEffectsChain ─► AssetEncoder ─► put
//! ```
//!
//! The engine holds no exploration state. Tier, position mode and volume are
//! passed in with every call, so the same engine can be shared between the UI
//! thread and a regeneration worker.
//!
//! # Example
//!
//! ```
//! use atlas_audio::{AudioEngine, ComplexityTier, ObjectAudioType};
//!
//! let engine = AudioEngine::new();
//! let asset = engine.synthesize(ObjectAudioType::Planet, 10.0, 0.0, 0.0, 10.0, ComplexityTier::Moderate);
//! assert_eq!(asset.channels(), 2);
//! assert_eq!(asset.frames(), 8820);
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::alert::{AlertCategory, AlertRequest, AlertToneSynthesizer};
use crate::asset::{AssetEncoder, SoundAsset};
use crate::cache::{CacheKey, CacheStats, SynthesisCache};
use crate::spatial::{ComplexityTier, SpatialEffectsChain, SpatialInput};
use crate::tone::{
    ObjectAudioType, ToneSynthesizer, DEFAULT_SAMPLE_RATE, DEFAULT_TONE_DURATION, MAX_TONE_DURATION,
    MIN_TONE_DURATION,
};

/// Peak level of an encoded object cue as a fraction of full scale.
pub const TONE_CEILING: f64 = 1.0;

/// Audio engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioEngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Length of object cues in seconds.
    pub tone_duration: f64,
    /// Whether finished cues are memoized.
    pub enable_cache: bool,
}

impl Default for AudioEngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tone_duration: DEFAULT_TONE_DURATION,
            enable_cache: true,
        }
    }
}

impl AudioEngineConfig {
    /// Create config with a sample rate.
    #[must_use]
    pub const fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Create config with a cue duration.
    ///
    /// The engine clamps it to `MIN_TONE_DURATION..=MAX_TONE_DURATION`.
    #[must_use]
    pub const fn with_tone_duration(mut self, seconds: f64) -> Self {
        self.tone_duration = seconds;
        self
    }

    /// Create config with caching enabled/disabled.
    #[must_use]
    pub const fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }
}

/// Synthesizes and spatializes object cues and alert tones.
#[derive(Debug)]
pub struct AudioEngine {
    config: AudioEngineConfig,
    tone: ToneSynthesizer,
    effects: SpatialEffectsChain,
    encoder: AssetEncoder,
    alerts: AlertToneSynthesizer,
    cache: SynthesisCache,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AudioEngineConfig::default())
    }

    /// Create an engine with a specific configuration.
    #[must_use]
    pub fn with_config(config: AudioEngineConfig) -> Self {
        let sample_rate = config.sample_rate.max(1);
        let tone_duration = if config.tone_duration.is_finite() {
            config.tone_duration.clamp(MIN_TONE_DURATION, MAX_TONE_DURATION)
        } else {
            DEFAULT_TONE_DURATION
        };
        debug!(
            sample_rate,
            tone_duration,
            cache = config.enable_cache,
            "Created audio engine"
        );
        Self {
            config: AudioEngineConfig {
                sample_rate,
                tone_duration,
                ..config
            },
            tone: ToneSynthesizer::new(sample_rate),
            effects: SpatialEffectsChain::new(sample_rate),
            encoder: AssetEncoder::new(sample_rate),
            alerts: AlertToneSynthesizer::new(sample_rate),
            cache: SynthesisCache::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AudioEngineConfig {
        &self.config
    }

    /// Synthesize the cue for an object at a position.
    ///
    /// Never fails: numeric or encoding problems yield a silent asset of the
    /// normal length.
    #[must_use]
    pub fn synthesize(
        &self,
        object_type: ObjectAudioType,
        x: f64,
        y: f64,
        z: f64,
        distance_au: f64,
        tier: ComplexityTier,
    ) -> Arc<SoundAsset> {
        self.synthesize_input(&SpatialInput::new(object_type, x, y, z, distance_au, tier))
    }

    /// [`synthesize`](Self::synthesize) keyed by catalog type name.
    ///
    /// Unknown names are heard at the 440 Hz fallback pitch.
    #[must_use]
    pub fn synthesize_named(
        &self,
        type_name: &str,
        x: f64,
        y: f64,
        z: f64,
        distance_au: f64,
        tier: ComplexityTier,
    ) -> Arc<SoundAsset> {
        let object_type = ObjectAudioType::from_name_or_default(type_name);
        self.synthesize(object_type, x, y, z, distance_au, tier)
    }

    /// [`synthesize`](Self::synthesize) for a prepared input.
    #[must_use]
    pub fn synthesize_input(&self, input: &SpatialInput) -> Arc<SoundAsset> {
        if !self.config.enable_cache {
            return Arc::new(self.render(input));
        }

        let key = CacheKey::derive(input);
        if let Some(asset) = self.cache.get(&key) {
            return asset;
        }

        let asset = Arc::new(self.render(input));
        self.cache.put(key, Arc::clone(&asset));
        asset
    }

    /// Run the full pipeline without touching the cache.
    #[must_use]
    pub fn render(&self, input: &SpatialInput) -> SoundAsset {
        let mono = self
            .tone
            .generate(input.object_type, input.distance_au, self.config.tone_duration);
        let stereo = self.effects.process(&mono, input);
        self.encoder.encode_or_silent(&stereo, TONE_CEILING)
    }

    /// Synthesize a space-weather alert tone.
    ///
    /// `duration` defaults to 2.0 s and `pulse_rate` to 4.0 Hz.
    #[must_use]
    pub fn synthesize_alert(
        &self,
        category: AlertCategory,
        duration: Option<f64>,
        pulse_rate: Option<f64>,
    ) -> SoundAsset {
        let mut request = AlertRequest::new(category);
        if let Some(duration) = duration {
            request = request.with_duration(duration);
        }
        if let Some(pulse_rate) = pulse_rate {
            request = request.with_pulse_rate(pulse_rate);
        }
        self.alerts.synthesize(&request)
    }

    /// Cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Empty the cache and zero its counters.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{attenuation_factor, pan_gains};
    use proptest::prelude::*;

    fn tier_strategy() -> impl Strategy<Value = ComplexityTier> {
        prop_oneof![
            Just(ComplexityTier::Simple),
            Just(ComplexityTier::Moderate),
            Just(ComplexityTier::Complex),
        ]
    }

    #[test]
    fn test_planet_scenario() {
        let engine = AudioEngine::new();
        let asset = engine.synthesize(ObjectAudioType::Planet, 10.0, 0.0, 0.0, 10.0, ComplexityTier::Moderate);

        assert_eq!(asset.sample_rate(), 44_100);
        assert_eq!(asset.channels(), 2);
        assert_eq!(asset.frames(), 8820);
        assert_eq!(asset.peak(), 32_767);
        assert_eq!(attenuation_factor(10.0), 0.05);

        // Right channel is live and carries tan(pi/16) of the left level
        let left_peak = asset.channel(0).map(i16::unsigned_abs).max().unwrap_or(0);
        let right_peak = asset.channel(1).map(i16::unsigned_abs).max().unwrap_or(0);
        let (l, r) = pan_gains(10.0);
        assert!(right_peak > 0);
        let ratio = f64::from(right_peak) / f64::from(left_peak);
        assert!((ratio - r / l).abs() < 1e-3);
    }

    #[test]
    fn test_simple_tier_channels_identical() {
        let engine = AudioEngine::new();
        let asset = engine.synthesize(ObjectAudioType::Comet, 25.0, 1.0, 3.0, 2.0, ComplexityTier::Simple);
        assert!(asset.channel(0).eq(asset.channel(1)));
    }

    #[test]
    fn test_panned_tiers_differ_off_center() {
        let engine = AudioEngine::new();
        for tier in [ComplexityTier::Moderate, ComplexityTier::Complex] {
            let asset = engine.synthesize(ObjectAudioType::Moon, -15.0, 0.0, 1.0, 1.0, tier);
            assert!(!asset.channel(0).eq(asset.channel(1)), "{tier:?}");
        }
    }

    #[test]
    fn test_center_is_left_only() {
        let engine = AudioEngine::new();
        for tier in [ComplexityTier::Moderate, ComplexityTier::Complex] {
            let asset = engine.synthesize(ObjectAudioType::Star, 0.0, 0.0, 0.0, 1.0, tier);
            assert!(asset.channel(1).all(|s| s == 0));
            assert_eq!(asset.peak(), 32_767);
        }
    }

    #[test]
    fn test_same_bucket_shares_asset() {
        let engine = AudioEngine::new();
        let a = engine.synthesize(ObjectAudioType::Asteroid, 10.0, 0.0, 0.0, 10.0, ComplexityTier::Complex);
        let b = engine.synthesize(ObjectAudioType::Asteroid, 10.1, 5.0, 2.0, 10.2, ComplexityTier::Complex);

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.samples(), b.samples());

        let stats = engine.cache_stats();
        assert_eq!((stats.size, stats.hits, stats.misses), (1, 1, 1));
    }

    #[test]
    fn test_clear_cache_then_fresh_miss() {
        let engine = AudioEngine::new();
        let _ = engine.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Simple);
        let _ = engine.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Simple);

        engine.clear_cache();
        let stats = engine.cache_stats();
        assert_eq!((stats.size, stats.hits, stats.misses), (0, 0, 0));

        let _ = engine.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Simple);
        let stats = engine.cache_stats();
        assert_eq!((stats.size, stats.hits, stats.misses), (1, 0, 1));
    }

    #[test]
    fn test_cache_disabled() {
        let engine = AudioEngine::with_config(AudioEngineConfig::default().with_cache(false));
        let a = engine.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Simple);
        let b = engine.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Simple);

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        let stats = engine.cache_stats();
        assert_eq!((stats.size, stats.hits, stats.misses), (0, 0, 0));
    }

    #[test]
    fn test_unknown_type_name_uses_planet_pitch() {
        let engine = AudioEngine::new();
        let nebula = engine.synthesize_named("Nebula", 2.0, 0.0, 0.0, 2.0, ComplexityTier::Simple);
        let planet = engine.synthesize(ObjectAudioType::Planet, 2.0, 0.0, 0.0, 2.0, ComplexityTier::Simple);
        assert!(Arc::ptr_eq(&nebula, &planet));
    }

    #[test]
    fn test_tone_duration_override() {
        let engine = AudioEngine::with_config(AudioEngineConfig::default().with_tone_duration(0.5));
        let asset = engine.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Moderate);
        assert_eq!(asset.frames(), 22_050);
    }

    #[test]
    fn test_tone_duration_is_bounded() {
        let tiny = AudioEngine::with_config(AudioEngineConfig::default().with_tone_duration(2.0 / 44_100.0));
        let asset = tiny.synthesize(ObjectAudioType::Planet, 1.0, 0.0, 0.0, 1.0, ComplexityTier::Moderate);
        assert_eq!(asset.frames(), 441);
        assert!(asset.peak() > 0);

        let huge = AudioEngine::with_config(AudioEngineConfig::default().with_tone_duration(1e15));
        assert_eq!(huge.config().tone_duration, MAX_TONE_DURATION);
        let asset = huge.synthesize(ObjectAudioType::Star, 0.0, 0.0, 0.0, 1.0, ComplexityTier::Simple);
        assert_eq!(asset.frames(), 441_000);

        let broken = AudioEngine::with_config(AudioEngineConfig::default().with_tone_duration(f64::NAN));
        assert_eq!(broken.config().tone_duration, DEFAULT_TONE_DURATION);
    }

    #[test]
    fn test_oversized_alert_is_well_formed() {
        let engine = AudioEngine::new();
        let asset = engine.synthesize_alert(AlertCategory::Storm, Some(1e15), None);
        assert_eq!(asset.channels(), 2);
        assert_eq!(asset.frames(), 1_323_000);
        assert!(asset.peak() > 0);
        assert!(asset.peak() <= 16_384);
    }

    #[test]
    fn test_storm_alert_scenario() {
        let engine = AudioEngine::new();
        let asset = engine.synthesize_alert(AlertCategory::Storm, None, None);
        assert_eq!(asset.channels(), 2);
        assert_eq!(asset.frames(), 88_200);
        assert!(asset.peak() <= 16_384);
        assert!(asset.peak() > 16_000);

        // Alerts are never cached
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn test_alert_overrides() {
        let engine = AudioEngine::new();
        let asset = engine.synthesize_alert(AlertCategory::Flare, Some(1.5), Some(2.0));
        assert_eq!(asset.frames(), 66_150);
    }

    #[test]
    fn test_concurrent_misses_converge() {
        let engine = Arc::new(AudioEngine::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine.synthesize(ObjectAudioType::Comet, 5.0, 0.0, 1.0, 3.0, ComplexityTier::Complex)
                })
            })
            .collect();

        let assets: Vec<_> = handles.into_iter().map(|h| h.join().expect("thread")).collect();
        for asset in &assets[1..] {
            assert_eq!(asset.samples(), assets[0].samples());
        }
        assert_eq!(engine.cache_stats().size, 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_peak_in_range(
            idx in 0usize..7,
            x in -60.0f64..60.0,
            z in -10.0f64..10.0,
            distance in 0.0f64..80.0,
            tier in tier_strategy(),
        ) {
            let engine = AudioEngine::with_config(AudioEngineConfig::default().with_cache(false));
            let asset = engine.synthesize(ObjectAudioType::ALL[idx], x, 0.0, z, distance, tier);
            prop_assert_eq!(asset.frames(), 8820);
            prop_assert!(asset.peak() > 0);
            prop_assert!(asset.peak() <= 32_767);
        }
    }
}
