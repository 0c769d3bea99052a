//! Recorded frames, assembled media and session export

use joint_mapper::JointStateTable;
use serde::{Deserialize, Serialize};

use crate::RecordingError;

/// One sampled joint-state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Capture time (ms since Unix epoch)
    pub timestamp_ms: i64,
    pub joints: JointStateTable,
}

/// Encoded media assembled from capture chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A finished recording: frames plus optional media
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedSession {
    pub frames: Vec<RecordedFrame>,
    pub media: Option<MediaBlob>,
}

impl RecordedSession {
    /// Encode with postcard
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordingError> {
        postcard::to_allocvec(self).map_err(|e| RecordingError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordingError> {
        postcard::from_bytes(bytes).map_err(|e| RecordingError::Encoding(e.to_string()))
    }

    /// Span between first and last frame (ms)
    pub fn duration_ms(&self) -> i64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.media.is_none()
    }
}
