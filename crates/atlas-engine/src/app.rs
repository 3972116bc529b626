//! Headless explorer session.
//!
//! Renders the cue of every catalog body for the configured mode, cycles
//! through the remaining modes the way the mode key does in the UI, then
//! plays a storm alert. Optionally writes every cue as a WAV file.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use atlas_audio::{
    AlertCategory, AudioEngine, AudioEngineConfig, SoundAsset, SoundGeneration, SoundRegenerator,
};
use atlas_common::{AuPosition, CatalogEntry};
use glam::DVec3;
use tracing::{info, warn};

use crate::config::AtlasConfig;

/// Simulated days per real second while the session runs.
const TIME_SCALE: f64 = 1.0;

/// Frames advanced between regenerations.
const FRAMES_PER_STEP: usize = 30;

/// A small catalog of familiar bodies, heliocentric AU.
pub fn demo_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Sun", "Star", AuPosition::ORIGIN),
        CatalogEntry::new("Earth", "Planet", AuPosition::new(0.98, 0.17, 0.0))
            .with_velocity(DVec3::new(-0.003, 0.0168, 0.0)),
        CatalogEntry::new("Moon", "Moon", AuPosition::new(0.9826, 0.1712, 0.0002))
            .with_parent("Earth")
            .with_velocity(DVec3::new(-0.0034, 0.0172, 0.0)),
        CatalogEntry::new("Jupiter", "Planet", AuPosition::new(-4.1, 3.2, 0.08))
            .with_velocity(DVec3::new(-0.0046, -0.0054, 0.0001)),
        CatalogEntry::new("Io", "Moon", AuPosition::new(-4.097, 3.201, 0.08)).with_parent("Jupiter"),
        CatalogEntry::new("Ceres", "Dwarf Planet", AuPosition::new(2.1, -1.6, 0.3)),
        CatalogEntry::new("Halley", "Comet", AuPosition::new(-20.4, 27.1, 9.3)),
        CatalogEntry::new("Voyager 1", "Spacecraft", AuPosition::new(-31.0, -132.0, 98.0)),
        CatalogEntry::new("Vesta", "Asteroid", AuPosition::new(1.9, 1.2, -0.2)),
    ]
}

/// Run a session with the given preferences.
pub fn run(config: &AtlasConfig) -> Result<()> {
    let engine = Arc::new(AudioEngine::with_config(
        AudioEngineConfig::default().with_cache(config.enable_cache),
    ));
    let regenerator = SoundRegenerator::new(Arc::clone(&engine))
        .context("failed to start regeneration worker")?;

    let mut catalog = demo_catalog();
    let mut mode = config.user_mode;
    info!(
        mode = mode.name(),
        tier = mode.tier().name(),
        "{}",
        mode.tier().description()
    );

    for step in 0..3 {
        let context = AtlasConfig {
            user_mode: mode,
            ..config.clone()
        }
        .render_context();

        let requested = regenerator.submit(catalog.clone(), context);
        let report = loop {
            match regenerator.wait_completed() {
                Some(report) if report.generation == requested => break report,
                Some(_) => {},
                None => anyhow::bail!("regeneration worker stopped"),
            }
        };
        info!(
            step,
            mode = mode.name(),
            objects = report.objects,
            committed = report.committed,
            "Object sounds ready"
        );

        let current = regenerator.current();
        describe(&catalog, &current);
        if let Some(dir) = &config.export_dir {
            export_generation(dir, mode.name(), &catalog, &current)?;
        }

        for _ in 0..FRAMES_PER_STEP {
            for entry in &mut catalog {
                entry.advance(TIME_SCALE);
            }
        }
        mode = mode.next();
    }

    let stats = engine.cache_stats();
    info!("Cache: {stats}");
    info!("Cache stats: {}", serde_json::to_string(&stats)?);

    let alert = engine.synthesize_alert(AlertCategory::Storm, None, None);
    info!(
        frames = alert.frames(),
        duration_ms = alert.duration().as_millis() as u64,
        "Geomagnetic storm alert ready"
    );
    if let Some(dir) = &config.export_dir {
        write_wav(&dir.join("alert_storm.wav"), &alert)?;
    }

    Ok(())
}

fn describe(catalog: &[CatalogEntry], generation: &SoundGeneration) {
    for entry in catalog {
        match generation.get(entry.id) {
            Some(sound) => info!(
                name = %entry.name,
                kind = %entry.type_name,
                distance = entry.distance_au,
                peak = sound.asset.peak(),
                gain = sound.gain,
                "Cue"
            ),
            None => warn!(name = %entry.name, "No cue in generation {}", generation.generation()),
        }
    }
}

fn export_generation(
    dir: &Path,
    mode: &str,
    catalog: &[CatalogEntry],
    generation: &SoundGeneration,
) -> Result<()> {
    let dir = dir.join(mode);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    for entry in catalog {
        if let Some(sound) = generation.get(entry.id) {
            let file = format!("{}.wav", entry.name.to_lowercase().replace(' ', "_"));
            write_wav(&dir.join(file), &sound.asset)?;
        }
    }
    info!("Exported {} cues to {}", generation.len(), dir.display());
    Ok(())
}

fn write_wav(path: &Path, asset: &SoundAsset) -> Result<()> {
    let bytes = asset.to_wav_bytes()?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
