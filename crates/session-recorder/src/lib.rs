//! Session Recorder
//!
//! Records joint trajectories alongside captured media:
//! - Fixed-period sampling of the joint-state table into timestamped frames
//! - Buffering encoded media chunks and assembling them on stop
//! - Timed replay of recorded frames back into the joint-state table
//! - Compact binary session export/import

pub mod driver;
pub mod player;
pub mod recorder;
pub mod session;
pub mod surface;

pub use driver::{run_player, run_sampler, Shared};
pub use player::{PlaybackHandle, Player};
pub use recorder::Recorder;
pub use session::{MediaBlob, RecordedFrame, RecordedSession};
pub use surface::{select_mime_type, CaptureSurface, MIME_PREFERENCES};

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Recording error types.
///
/// Display strings are user-facing status messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    #[error("Error: Recording source not ready.")]
    SourceNotReady,

    #[error("Error: No supported video format for recording.")]
    UnsupportedFormat,

    #[error("Recording already in progress.")]
    AlreadyActive,

    #[error("Recording not active.")]
    NotActive,

    #[error("Cannot play: Video not recorded or player unavailable.")]
    NothingToPlay,

    #[error("Session encoding error: {0}")]
    Encoding(String),
}

/// Recorder/player timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Sampling and playback period (milliseconds)
    pub sample_period_ms: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 33,
        }
    }
}

impl RecorderConfig {
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms.max(1))
    }
}

/// Wall-clock time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
