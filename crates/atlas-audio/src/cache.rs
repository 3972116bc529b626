//! Memoization of finished object cues.
//!
//! Inputs are quantized into buckets so that nearby positions share one
//! asset. The sharing is lossy: two requests that land in the same
//! bucket get the same sound even if their exact distances differ.
//!
//! The cache never evicts. Its size is bounded by the key space:
//! 7 types x 81 distance buckets x 3 tiers x 11 pan buckets.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::asset::SoundAsset;
use crate::spatial::{ComplexityTier, SpatialInput, MAX_AUDIO_DISTANCE};
use crate::tone::ObjectAudioType;

/// Distance buckets per AU.
pub const DISTANCE_BUCKETS_PER_AU: f64 = 2.0;

/// Pan buckets on each side of zero.
pub const PAN_BUCKET_RANGE: i8 = 5;

/// Upper bound on the number of distinct keys.
pub const MAX_CACHE_ENTRIES: usize = ObjectAudioType::ALL.len()
    * (MAX_AUDIO_DISTANCE as usize * DISTANCE_BUCKETS_PER_AU as usize + 1)
    * ComplexityTier::ALL.len()
    * (2 * PAN_BUCKET_RANGE as usize + 1);

/// Quantized identity of a synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Object classification.
    pub object_type: ObjectAudioType,
    /// `floor(min(distance, 40) * 2)`.
    pub distance_bucket: u8,
    /// Processing preset.
    pub tier: ComplexityTier,
    /// `clamp(round(x / 40 * 5), -5, 5)`.
    pub pan_bucket: i8,
}

impl CacheKey {
    /// Derive the key for an input.
    #[must_use]
    pub fn derive(input: &SpatialInput) -> Self {
        let distance = input.distance_au.clamp(0.0, MAX_AUDIO_DISTANCE);
        let pan = (input.x / MAX_AUDIO_DISTANCE * f64::from(PAN_BUCKET_RANGE))
            .round()
            .clamp(-f64::from(PAN_BUCKET_RANGE), f64::from(PAN_BUCKET_RANGE));

        Self {
            object_type: input.object_type,
            distance_bucket: (distance * DISTANCE_BUCKETS_PER_AU).floor() as u8,
            tier: input.tier,
            pan_bucket: pan as i8,
        }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of stored assets.
    pub size: usize,
    /// Lookups that found an asset.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
    /// `hits / (hits + misses)`, 0.0 when nothing was looked up.
    pub hit_rate: f64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cached, {} hits, {} misses, {:.1}% hit rate",
            self.size,
            self.hits,
            self.misses,
            self.hit_rate * 100.0
        )
    }
}

/// Thread-safe map from [`CacheKey`] to finished assets.
///
/// Lookups and inserts are not serialized per key. Two threads missing on the
/// same key may both synthesize and both insert; the values are equivalent so
/// whichever write lands last is fine.
#[derive(Debug, Default)]
pub struct SynthesisCache {
    entries: RwLock<AHashMap<CacheKey, Arc<SoundAsset>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SynthesisCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        debug!("Created synthesis cache");
        Self::default()
    }

    /// Look up an asset, counting the hit or miss.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<SoundAsset>> {
        let found = self.entries.read().get(key).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store an asset, replacing any previous one for the key.
    pub fn put(&self, key: CacheKey, asset: Arc<SoundAsset>) {
        self.entries.write().insert(key, asset);
        debug!("Cached sound asset {:?}", key);
    }

    /// Remove every entry and zero the counters.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        info!("Audio cache cleared");
    }

    /// Number of stored assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Lookups that found an asset.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that did not.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        CacheStats {
            size,
            hits,
            misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(x: f64, distance: f64) -> SpatialInput {
        SpatialInput::new(ObjectAudioType::Moon, x, 0.0, 0.0, distance, ComplexityTier::Complex)
    }

    #[test]
    fn test_distance_buckets() {
        assert_eq!(CacheKey::derive(&input(0.0, 0.0)).distance_bucket, 0);
        assert_eq!(CacheKey::derive(&input(0.0, 0.49)).distance_bucket, 0);
        assert_eq!(CacheKey::derive(&input(0.0, 0.5)).distance_bucket, 1);
        assert_eq!(CacheKey::derive(&input(0.0, 10.2)).distance_bucket, 20);
        assert_eq!(CacheKey::derive(&input(0.0, 40.0)).distance_bucket, 80);
        assert_eq!(CacheKey::derive(&input(0.0, 1000.0)).distance_bucket, 80);
    }

    #[test]
    fn test_pan_buckets_round() {
        assert_eq!(CacheKey::derive(&input(0.0, 1.0)).pan_bucket, 0);
        assert_eq!(CacheKey::derive(&input(3.9, 1.0)).pan_bucket, 0);
        assert_eq!(CacheKey::derive(&input(4.0, 1.0)).pan_bucket, 1);
        assert_eq!(CacheKey::derive(&input(-12.0, 1.0)).pan_bucket, -2);
        assert_eq!(CacheKey::derive(&input(500.0, 1.0)).pan_bucket, 5);
        assert_eq!(CacheKey::derive(&input(-500.0, 1.0)).pan_bucket, -5);
    }

    #[test]
    fn test_key_space_bound() {
        assert_eq!(MAX_CACHE_ENTRIES, 7 * 81 * 3 * 11);
    }

    #[test]
    fn test_get_put_counts() {
        let cache = SynthesisCache::new();
        let key = CacheKey::derive(&input(1.0, 1.0));

        assert!(cache.get(&key).is_none());
        cache.put(key, Arc::new(SoundAsset::silent(44_100, 2, 4)));
        assert!(cache.get(&key).is_some());
        assert!(cache.get(&key).is_some());

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = SynthesisCache::new();
        let key = CacheKey::derive(&input(1.0, 1.0));
        cache.put(key, Arc::new(SoundAsset::silent(44_100, 2, 4)));
        let _ = cache.get(&key);

        cache.clear();
        let stats = cache.stats();
        assert_eq!((stats.size, stats.hits, stats.misses), (0, 0, 0));
        assert_eq!(stats.hit_rate, 0.0);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_put_last_write_wins() {
        let cache = SynthesisCache::new();
        let key = CacheKey::derive(&input(1.0, 1.0));
        cache.put(key, Arc::new(SoundAsset::silent(44_100, 2, 4)));
        cache.put(key, Arc::new(SoundAsset::silent(44_100, 2, 8)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key).map(|a| a.frames()), Some(8));
    }

    #[test]
    fn test_stats_display() {
        let stats = CacheStats {
            size: 3,
            hits: 1,
            misses: 3,
            hit_rate: 0.25,
        };
        assert_eq!(stats.to_string(), "3 cached, 1 hits, 3 misses, 25.0% hit rate");
    }

    proptest! {
        #[test]
        fn prop_key_components_in_range(x in -1e6f64..1e6, d in 0.0f64..1e6) {
            let key = CacheKey::derive(&input(x, d));
            prop_assert!(key.distance_bucket <= 80);
            prop_assert!((-5..=5).contains(&key.pan_bucket));
        }
    }
}
