//! Bulk regeneration of every visible object's cue.
//!
//! A tier change, a position-mode change or a new catalog invalidates every
//! current sound at once. Regeneration builds a complete [`SoundGeneration`]
//! off to the side and publishes it with a single pointer swap, so readers
//! see either the old set or the new set, never a mix.
//!
//! Generations are numbered in request order. A pass only publishes if it is
//! still the newest request and the published generation is older. Passes that
//! lose still leave their assets in the synthesis cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ahash::AHashMap;
use atlas_common::{CatalogEntry, ObjectId};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, error, info};

use crate::asset::SoundAsset;
use crate::engine::AudioEngine;
use crate::error::AudioResult;
use crate::position::{index_by_name, PositionMode, PositionResolver};
use crate::spatial::ComplexityTier;
use crate::tone::ObjectAudioType;

/// Reports kept for [`SoundRegenerator::wait_completed`]. Older ones are dropped.
pub const REPORT_BACKLOG: usize = 16;

/// Exploration settings a pass renders with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    /// Processing preset.
    pub tier: ComplexityTier,
    /// Coordinate frame.
    pub position_mode: PositionMode,
    /// Playback gain, 0.0..=1.0.
    pub master_volume: f64,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            tier: ComplexityTier::default(),
            position_mode: PositionMode::default(),
            master_volume: 1.0,
        }
    }
}

impl RenderContext {
    /// Master volume clamped to 0.0..=1.0. Non-finite volumes mute.
    #[must_use]
    pub fn gain(&self) -> f64 {
        if self.master_volume.is_finite() {
            self.master_volume.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Current cue of one object.
#[derive(Debug, Clone)]
pub struct ObjectSound {
    /// Shared asset, usually owned by the synthesis cache.
    pub asset: Arc<SoundAsset>,
    /// Playback gain.
    pub gain: f64,
}

/// A complete, immutable set of object cues.
#[derive(Debug, Default)]
pub struct SoundGeneration {
    generation: u64,
    sounds: AHashMap<ObjectId, ObjectSound>,
}

impl SoundGeneration {
    /// Request number this set was built for. 0 before the first pass.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Cue for one object.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&ObjectSound> {
        self.sounds.get(&id)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// True when no object has a cue.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// All cues.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectSound)> {
        self.sounds.iter()
    }
}

/// Outcome of one requested pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegenerationReport {
    /// Request number.
    pub generation: u64,
    /// Whether the pass was published.
    pub committed: bool,
    /// Objects rendered (0 when the request was skipped).
    pub objects: usize,
}

/// Sending half of the report backlog.
///
/// Holds a receiver too, so a full backlog can shed its oldest report
/// instead of blocking the worker.
struct ReportSink {
    tx: Sender<RegenerationReport>,
    backlog: Receiver<RegenerationReport>,
}

impl ReportSink {
    fn publish(&self, report: RegenerationReport) {
        let mut report = report;
        loop {
            match self.tx.try_send(report) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(r)) => {
                    let _ = self.backlog.try_recv();
                    report = r;
                },
            }
        }
    }
}

struct Job {
    generation: u64,
    entries: Vec<CatalogEntry>,
    context: RenderContext,
}

struct RegenState {
    engine: Arc<AudioEngine>,
    current: RwLock<Arc<SoundGeneration>>,
    latest_requested: AtomicU64,
}

impl RegenState {
    fn reserve(&self) -> u64 {
        self.latest_requested.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.latest_requested.load(Ordering::SeqCst) != generation
    }

    fn build(&self, entries: &[CatalogEntry], context: &RenderContext) -> AHashMap<ObjectId, ObjectSound> {
        let index = index_by_name(entries);
        let resolver = PositionResolver::new(context.position_mode);
        let gain = context.gain();

        entries
            .iter()
            .map(|entry| {
                let object_type = ObjectAudioType::from_name_or_default(&entry.type_name);
                let input = resolver.resolve(entry, &index).to_input(object_type, context.tier);
                let sound = ObjectSound {
                    asset: self.engine.synthesize_input(&input),
                    gain,
                };
                (entry.id, sound)
            })
            .collect()
    }

    fn commit(&self, generation: u64, sounds: AHashMap<ObjectId, ObjectSound>) -> bool {
        let mut current = self.current.write();
        if self.is_superseded(generation) || current.generation >= generation {
            debug!(generation, current = current.generation, "Discarding stale sound generation");
            return false;
        }
        *current = Arc::new(SoundGeneration { generation, sounds });
        true
    }

    fn run(&self, generation: u64, entries: &[CatalogEntry], context: &RenderContext) -> RegenerationReport {
        let sounds = self.build(entries, context);
        let objects = sounds.len();
        let committed = self.commit(generation, sounds);
        if committed {
            info!(generation, objects, tier = context.tier.name(), "Regenerated object sounds");
        }
        RegenerationReport {
            generation,
            committed,
            objects,
        }
    }
}

/// Rebuilds every object's cue, inline or on a dedicated worker thread.
pub struct SoundRegenerator {
    state: Arc<RegenState>,
    jobs: Option<Sender<Job>>,
    reports: Receiver<RegenerationReport>,
    worker: Option<JoinHandle<()>>,
}

impl SoundRegenerator {
    /// Start the worker thread.
    pub fn new(engine: Arc<AudioEngine>) -> AudioResult<Self> {
        let state = Arc::new(RegenState {
            engine,
            current: RwLock::new(Arc::new(SoundGeneration::default())),
            latest_requested: AtomicU64::new(0),
        });
        let (job_tx, job_rx) = unbounded::<Job>();
        let (report_tx, report_rx) = bounded(REPORT_BACKLOG);
        let sink = ReportSink {
            tx: report_tx,
            backlog: report_rx.clone(),
        };

        let worker_state = Arc::clone(&state);
        let worker = std::thread::Builder::new()
            .name("atlas-regen".into())
            .spawn(move || Self::worker_loop(&worker_state, &job_rx, &sink))?;

        debug!("Started sound regeneration worker");
        Ok(Self {
            state,
            jobs: Some(job_tx),
            reports: report_rx,
            worker: Some(worker),
        })
    }

    fn worker_loop(state: &RegenState, jobs: &Receiver<Job>, reports: &ReportSink) {
        while let Ok(mut job) = jobs.recv() {
            // Only the newest queued request is worth rendering
            while let Ok(newer) = jobs.try_recv() {
                reports.publish(RegenerationReport {
                    generation: job.generation,
                    committed: false,
                    objects: 0,
                });
                job = newer;
            }

            reports.publish(state.run(job.generation, &job.entries, &job.context));
        }
        debug!("Sound regeneration worker stopped");
    }

    /// Regenerate on the calling thread.
    ///
    /// Returns the published generation, or `None` if a newer request
    /// superseded this one.
    pub fn regenerate(&self, entries: &[CatalogEntry], context: RenderContext) -> Option<u64> {
        let generation = self.state.reserve();
        let report = self.state.run(generation, entries, &context);
        report.committed.then_some(generation)
    }

    /// Queue a pass on the worker and return its generation number.
    ///
    /// Any request still queued behind it is skipped. If the worker is gone
    /// the pass runs inline.
    ///
    /// Callers that never call [`wait_completed`](Self::wait_completed) may
    /// poll [`current`](Self::current) instead; the worker keeps only the last
    /// [`REPORT_BACKLOG`] reports and drops older ones.
    pub fn submit(&self, entries: Vec<CatalogEntry>, context: RenderContext) -> u64 {
        let generation = self.state.reserve();
        let job = Job {
            generation,
            entries,
            context,
        };

        let Some(jobs) = &self.jobs else {
            let _ = self.state.run(generation, &job.entries, &job.context);
            return generation;
        };
        if let Err(e) = jobs.send(job) {
            error!("Regeneration worker unavailable, running inline");
            let job = e.into_inner();
            let _ = self.state.run(generation, &job.entries, &job.context);
        }
        generation
    }

    /// Block until the worker finishes (or skips) the next request.
    ///
    /// Reports arrive in generation order, but only the newest
    /// [`REPORT_BACKLOG`] are retained. Returns `None` once the worker has
    /// stopped.
    pub fn wait_completed(&self) -> Option<RegenerationReport> {
        self.reports.recv().ok()
    }

    /// Published generation.
    #[must_use]
    pub fn current(&self) -> Arc<SoundGeneration> {
        self.state.current.read().clone()
    }

    /// Current cue for one object.
    #[must_use]
    pub fn sound_for(&self, id: ObjectId) -> Option<ObjectSound> {
        self.state.current.read().get(id).cloned()
    }

    /// Engine used for synthesis.
    #[must_use]
    pub fn engine(&self) -> &Arc<AudioEngine> {
        &self.state.engine
    }
}

impl Drop for SoundRegenerator {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Sound regeneration worker panicked");
            }
        }
    }
}
