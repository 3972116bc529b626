//! Chooses the coordinates an object is heard at.
//!
//! In hierarchical mode a moon is heard relative to its planet, so Io pans
//! around Jupiter instead of sitting on top of it. Bodies without a parent,
//! or whose parent is missing from the catalog, fall back to heliocentric
//! coordinates.

use ahash::AHashMap;
use atlas_common::{AuPosition, CatalogEntry};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spatial::{ComplexityTier, SpatialInput};
use crate::tone::ObjectAudioType;

/// Coordinate frame for audio positioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionMode {
    /// Relative to the parent body when one is known.
    #[default]
    Hierarchical,
    /// Always heliocentric.
    Absolute,
}

/// Coordinates and distance fed into synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPosition {
    /// Horizontal offset in AU.
    pub x: f64,
    /// Vertical offset in AU.
    pub y: f64,
    /// Depth offset in AU.
    pub z: f64,
    /// Distance in AU.
    pub distance_au: f64,
    /// Parent body the offsets are relative to, `None` when absolute.
    pub relative_to: Option<String>,
}

impl ResolvedPosition {
    /// Build the synthesis input for this position.
    #[must_use]
    pub fn to_input(&self, object_type: ObjectAudioType, tier: ComplexityTier) -> SpatialInput {
        SpatialInput::new(object_type, self.x, self.y, self.z, self.distance_au, tier)
    }
}

/// Index catalog entries by name for parent lookups.
#[must_use]
pub fn index_by_name(entries: &[CatalogEntry]) -> AHashMap<&str, &CatalogEntry> {
    entries.iter().map(|e| (e.name.as_str(), e)).collect()
}

/// Resolves catalog entries to audio positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionResolver {
    mode: PositionMode,
}

impl PositionResolver {
    /// Create a resolver for a mode.
    #[must_use]
    pub const fn new(mode: PositionMode) -> Self {
        Self { mode }
    }

    /// Active mode.
    #[must_use]
    pub const fn mode(&self) -> PositionMode {
        self.mode
    }

    /// Resolve one entry against the catalog index.
    #[must_use]
    pub fn resolve(&self, entry: &CatalogEntry, index: &AHashMap<&str, &CatalogEntry>) -> ResolvedPosition {
        if self.mode == PositionMode::Hierarchical {
            if let Some(parent) = entry.parent.as_deref().and_then(|p| index.get(p)) {
                let rel: AuPosition = entry.position.relative_to(parent.position);
                debug!(
                    name = %entry.name,
                    parent = %parent.name,
                    distance = rel.norm(),
                    "Using relative position"
                );
                return ResolvedPosition {
                    x: rel.x(),
                    y: rel.y(),
                    z: rel.z(),
                    distance_au: rel.norm(),
                    relative_to: Some(parent.name.clone()),
                };
            }
        }

        debug!(name = %entry.name, distance = entry.distance_au, "Using absolute position");
        ResolvedPosition {
            x: entry.position.x(),
            y: entry.position.y(),
            z: entry.position.z(),
            distance_au: entry.distance_au,
            relative_to: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("Jupiter", "Planet", AuPosition::new(5.2, 0.0, 0.0)),
            CatalogEntry::new("Io", "Moon", AuPosition::new(5.2, 0.003, 0.0)).with_parent("Jupiter"),
            CatalogEntry::new("Phobos", "Moon", AuPosition::new(1.5, 0.0, 0.0)).with_parent("Mars"),
        ]
    }

    #[test]
    fn test_hierarchical_uses_parent_offset() {
        let entries = catalog();
        let index = index_by_name(&entries);
        let pos = PositionResolver::new(PositionMode::Hierarchical).resolve(&entries[1], &index);

        assert!(pos.x.abs() < 1e-12);
        assert!((pos.y - 0.003).abs() < 1e-12);
        assert!((pos.distance_au - 0.003).abs() < 1e-12);
        assert_eq!(pos.relative_to.as_deref(), Some("Jupiter"));
    }

    #[test]
    fn test_absolute_mode_ignores_parent() {
        let entries = catalog();
        let index = index_by_name(&entries);
        let pos = PositionResolver::new(PositionMode::Absolute).resolve(&entries[1], &index);

        assert!((pos.x - 5.2).abs() < 1e-12);
        assert_eq!(pos.distance_au, entries[1].distance_au);
        assert!(pos.relative_to.is_none());
    }

    #[test]
    fn test_missing_parent_falls_back() {
        let entries = catalog();
        let index = index_by_name(&entries);
        let pos = PositionResolver::default().resolve(&entries[2], &index);

        assert!((pos.x - 1.5).abs() < 1e-12);
        assert!(pos.relative_to.is_none());
    }

    #[test]
    fn test_root_body_is_absolute() {
        let entries = catalog();
        let index = index_by_name(&entries);
        let pos = PositionResolver::default().resolve(&entries[0], &index);
        assert!((pos.distance_au - 5.2).abs() < 1e-12);
        assert!(pos.relative_to.is_none());
    }

    #[test]
    fn test_to_input() {
        let entries = catalog();
        let index = index_by_name(&entries);
        let input = PositionResolver::default()
            .resolve(&entries[0], &index)
            .to_input(ObjectAudioType::Planet, ComplexityTier::Complex);
        assert_eq!(input.x, 5.2);
        assert_eq!(input.tier, ComplexityTier::Complex);
    }
}
