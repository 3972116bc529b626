//! # Atlas Common
//!
//! Common types shared by the Space Atlas crates.
//!
//! This crate provides:
//! - Object identifiers for catalog entries
//! - Heliocentric coordinates measured in astronomical units
//! - The catalog entry value type fed into audio synthesis
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_generation() {
        let id1 = ObjectId::new();
        let id2 = ObjectId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_relative_position() {
        let earth = AuPosition::new(1.0, 0.0, 0.0);
        let moon = AuPosition::new(1.0026, 0.0, 0.0);
        let rel = moon.relative_to(earth);
        assert!((rel.x() - 0.0026).abs() < 1e-12);
        assert!((rel.norm() - 0.0026).abs() < 1e-12);
    }
}
