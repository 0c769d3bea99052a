//! Recorded frame playback

use joint_mapper::JointStateTable;
use tracing::debug;

use crate::session::{MediaBlob, RecordedFrame};
use crate::RecordingError;

/// Playable reference to assembled media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackHandle {
    pub mime_type: String,
    pub size_bytes: usize,
}

impl PlaybackHandle {
    /// Handle for a non-empty media blob
    pub fn from_media(media: Option<&MediaBlob>) -> Result<Self, RecordingError> {
        match media {
            Some(blob) if !blob.is_empty() => Ok(Self {
                mime_type: blob.mime_type.clone(),
                size_bytes: blob.len(),
            }),
            _ => Err(RecordingError::NothingToPlay),
        }
    }
}

/// Steps through recorded frames, one per tick
#[derive(Debug, Clone, Default)]
pub struct Player {
    frames: Vec<RecordedFrame>,
    cursor: usize,
}

impl Player {
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Write the next frame into `table`; `None` once exhausted.
    /// Returns the frame's timestamp.
    pub fn next_frame(&mut self, table: &mut JointStateTable) -> Option<i64> {
        let frame = self.frames.get(self.cursor)?;
        for (name, angle) in frame.joints.iter() {
            if name == "timestamp" {
                continue;
            }
            table.set(name, angle);
        }
        self.cursor += 1;
        if self.is_finished() {
            debug!("Playback reached final frame {}", self.cursor);
        }
        Some(frame.timestamp_ms)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
