//! Explorer preferences.
//!
//! Loaded from `atlas.toml`. Missing or broken files fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use atlas_audio::{ComplexityTier, PositionMode, RenderContext};
use atlas_common::{AtlasError, AtlasResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "atlas.toml";

/// Experience level chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    /// Guided tour with mono cues.
    #[default]
    Educational,
    /// Free exploration with stereo cues.
    Exploration,
    /// Full spatial processing.
    Advanced,
}

impl UserMode {
    /// Audio tier for this mode.
    #[must_use]
    pub const fn tier(self) -> ComplexityTier {
        match self {
            Self::Educational => ComplexityTier::Simple,
            Self::Exploration => ComplexityTier::Moderate,
            Self::Advanced => ComplexityTier::Complex,
        }
    }

    /// Next mode in the cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Educational => Self::Exploration,
            Self::Exploration => Self::Advanced,
            Self::Advanced => Self::Educational,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Educational => "educational",
            Self::Exploration => "exploration",
            Self::Advanced => "advanced",
        }
    }
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Experience level
    pub user_mode: UserMode,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f64,
    /// Hear moons relative to their planet
    pub hierarchical_audio: bool,
    /// Memoize synthesized cues
    pub enable_cache: bool,
    /// Write rendered cues as WAV files here
    pub export_dir: Option<PathBuf>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            user_mode: UserMode::Educational,
            master_volume: 0.7,
            hierarchical_audio: true,
            enable_cache: true,
            export_dir: None,
        }
    }
}

impl AtlasConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> AtlasResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| AtlasError::Serialization(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.master_volume = if self.master_volume.is_finite() {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            Self::default().master_volume
        };
    }

    /// Position mode implied by `hierarchical_audio`.
    #[must_use]
    pub const fn position_mode(&self) -> PositionMode {
        if self.hierarchical_audio {
            PositionMode::Hierarchical
        } else {
            PositionMode::Absolute
        }
    }

    /// Settings for a regeneration pass.
    #[must_use]
    pub const fn render_context(&self) -> RenderContext {
        RenderContext {
            tier: self.user_mode.tier(),
            position_mode: self.position_mode(),
            master_volume: self.master_volume,
        }
    }
}
