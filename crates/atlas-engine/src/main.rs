//! # Atlas Engine
//!
//! Entry point for the Space Atlas audio explorer.
//!
//! This crate ties together:
//! - Common: catalog entries and coordinates
//! - Audio: tone synthesis, spatial effects, caching and regeneration
//! - Config: user preferences from `atlas.toml`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AtlasConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("atlas=info".parse()?))
        .init();

    info!("Space Atlas starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let config = AtlasConfig::load_from(&config_path);

    app::run(&config)?;

    info!("Space Atlas shutdown complete");
    Ok(())
}
