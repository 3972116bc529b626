//! Heliocentric coordinate types.
//!
//! All positions are cartesian, measured in astronomical units (AU) with the
//! Sun at the origin. Velocities are in AU per day.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Frame rate the exploration loop advances positions at.
pub const FRAMES_PER_SECOND: f64 = 30.0;

/// Position in heliocentric space, in AU.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuPosition(pub DVec3);

impl AuPosition {
    /// The origin (the Sun).
    pub const ORIGIN: Self = Self(DVec3::ZERO);

    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self(DVec3::new(x, y, z))
    }

    /// X coordinate in AU.
    #[must_use]
    pub const fn x(self) -> f64 {
        self.0.x
    }

    /// Y coordinate in AU.
    #[must_use]
    pub const fn y(self) -> f64 {
        self.0.y
    }

    /// Z coordinate in AU (depth).
    #[must_use]
    pub const fn z(self) -> f64 {
        self.0.z
    }

    /// Euclidean length of the position vector.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.0.length()
    }

    /// This position expressed relative to `origin`.
    #[must_use]
    pub fn relative_to(self, origin: Self) -> Self {
        Self(self.0 - origin.0)
    }

    /// Advance by `velocity` (AU/day) over `days`.
    #[must_use]
    pub fn advanced(self, velocity: DVec3, days: f64) -> Self {
        Self(self.0 + velocity * days)
    }
}

impl From<DVec3> for AuPosition {
    fn from(v: DVec3) -> Self {
        Self(v)
    }
}
