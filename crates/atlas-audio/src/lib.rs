//! # Atlas Audio
//!
//! Audio cues for the Space Atlas explorer.
//!
//! This crate provides:
//! - Distance-dependent tone synthesis per object type
//! - Spatial effects in three complexity tiers (attenuation, panning, low-pass, echo)
//! - 16-bit PCM sound assets with WAV export
//! - A quantized, thread-safe synthesis cache
//! - Pulsating space-weather alert tones
//! - Hierarchical/absolute position resolution
//! - Bulk regeneration with atomic generation swaps

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod alert;
pub mod asset;
pub mod cache;
pub mod engine;
pub mod error;
pub mod filter;
pub mod position;
pub mod regenerate;
pub mod spatial;
pub mod tone;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::alert::{AlertCategory, AlertRequest, AlertToneSynthesizer};
    pub use crate::asset::{AssetEncoder, SoundAsset};
    pub use crate::cache::{CacheKey, CacheStats, SynthesisCache};
    pub use crate::engine::{AudioEngine, AudioEngineConfig};
    pub use crate::error::{AudioError, AudioResult};
    pub use crate::filter::ButterworthLowpass;
    pub use crate::position::{PositionMode, PositionResolver, ResolvedPosition};
    pub use crate::regenerate::{
        ObjectSound, RegenerationReport, RenderContext, SoundGeneration, SoundRegenerator,
    };
    pub use crate::spatial::{ComplexityTier, SpatialEffectsChain, SpatialInput, StereoBuffer};
    pub use crate::tone::{ObjectAudioType, ToneSynthesizer};
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AudioEngine>();
        assert_send_sync::<SoundGeneration>();
    }

    #[test]
    fn test_prelude_round_trip() {
        let engine = AudioEngine::new();
        let asset = engine.synthesize(ObjectAudioType::Moon, -3.0, 0.0, 0.5, 2.0, ComplexityTier::Complex);
        let wav = asset.to_wav_bytes().expect("wav");
        assert_eq!(wav.len(), 44 + asset.size_bytes());
    }
}
