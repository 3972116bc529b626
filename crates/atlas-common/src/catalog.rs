//! Catalog entries as delivered by the ephemeris collaborator.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::coords::{AuPosition, FRAMES_PER_SECOND};
use crate::ids::ObjectId;

/// One celestial body in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable identifier.
    pub id: ObjectId,
    /// Display name ("Earth", "Io", ...).
    pub name: String,
    /// Catalog classification ("Planet", "Dwarf Planet", ...).
    pub type_name: String,
    /// Heliocentric position.
    pub position: AuPosition,
    /// Velocity in AU/day.
    pub velocity: DVec3,
    /// Name of the body this one orbits, if any.
    pub parent: Option<String>,
    /// Distance from the observer in AU.
    pub distance_au: f64,
}

impl CatalogEntry {
    /// Creates an entry at rest with its distance taken from the origin.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, position: AuPosition) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            type_name: type_name.into(),
            position,
            velocity: DVec3::ZERO,
            parent: None,
            distance_au: position.norm(),
        }
    }

    /// Set the parent body.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the velocity (AU/day).
    #[must_use]
    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Advance the entry by one frame.
    ///
    /// `time_scale` is the number of simulated days per real second.
    pub fn advance(&mut self, time_scale: f64) {
        let days = time_scale / FRAMES_PER_SECOND;
        self.position = self.position.advanced(self.velocity, days);
        self.distance_au = self.position.norm();
        trace!(name = %self.name, distance = self.distance_au, "advanced catalog entry");
    }
}
