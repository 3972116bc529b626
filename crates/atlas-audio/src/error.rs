//! Error types for audio synthesis.
//!
//! None of these reach callers of [`AudioEngine::synthesize`](crate::AudioEngine::synthesize)
//! or [`AudioEngine::synthesize_alert`](crate::AudioEngine::synthesize_alert); both
//! recover locally and log.

use thiserror::Error;

/// Audio synthesis error types.
#[derive(Debug, Error)]
pub enum AudioError {
    /// A processing stage produced or would produce non-finite values.
    #[error("Numeric instability in {stage}: {detail}")]
    NumericInstability {
        /// Pipeline stage that failed.
        stage: &'static str,
        /// What went wrong.
        detail: String,
    },

    /// The sample buffer could not be packaged into a playable asset.
    #[error("Failed to encode sound asset: {0}")]
    EncodingFailure(String),

    /// WAV container error.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// The background regeneration worker could not be started.
    #[error("Failed to spawn regeneration worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl AudioError {
    /// Shorthand for a [`AudioError::NumericInstability`].
    pub(crate) fn unstable(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::NumericInstability {
            stage,
            detail: detail.into(),
        }
    }
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;
