//! Recording state machine

use joint_mapper::JointStateTable;
use tracing::{debug, info, warn};

use crate::session::{MediaBlob, RecordedFrame, RecordedSession};
use crate::surface::{select_mime_type, CaptureSurface};
use crate::RecordingError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Recording { mime_type: &'static str },
}

/// Collects joint snapshots and media chunks between start and stop
#[derive(Debug)]
pub struct Recorder {
    state: State,
    frames: Vec<RecordedFrame>,
    chunks: Vec<Vec<u8>>,
    media: Option<MediaBlob>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            frames: Vec::new(),
            chunks: Vec::new(),
            media: None,
        }
    }

    /// Begin a recording. Clears the previous frames, chunks and media.
    /// Returns the selected MIME type.
    pub fn start<S: CaptureSurface + ?Sized>(&mut self, surface: &S) -> Result<&'static str, RecordingError> {
        if self.is_recording() {
            return Err(RecordingError::AlreadyActive);
        }
        if !surface.is_ready() {
            warn!("Capture surface not ready");
            return Err(RecordingError::SourceNotReady);
        }
        let mime_type = select_mime_type(surface).ok_or(RecordingError::UnsupportedFormat)?;

        self.clear();
        self.state = State::Recording { mime_type };
        info!("Recording started ({})", mime_type);
        Ok(mime_type)
    }

    /// Append a snapshot of `table`. Ignored while idle.
    pub fn record_frame(&mut self, table: &JointStateTable, timestamp_ms: i64) -> bool {
        if !self.is_recording() {
            return false;
        }
        self.frames.push(RecordedFrame {
            timestamp_ms,
            joints: table.clone(),
        });
        true
    }

    /// Buffer an encoded chunk. Empty chunks and chunks while idle are dropped.
    pub fn push_chunk(&mut self, chunk: Vec<u8>) -> bool {
        if !self.is_recording() || chunk.is_empty() {
            return false;
        }
        self.chunks.push(chunk);
        true
    }

    /// Finish the recording and assemble the buffered chunks
    pub fn stop(&mut self) -> Result<&MediaBlob, RecordingError> {
        let State::Recording { mime_type } = self.state else {
            return Err(RecordingError::NotActive);
        };
        self.state = State::Idle;

        let data = self.chunks.drain(..).flatten().collect::<Vec<u8>>();
        info!(
            "Recording stopped: {} frames, {} media bytes",
            self.frames.len(),
            data.len()
        );
        Ok(self.media.insert(MediaBlob {
            mime_type: mime_type.to_string(),
            data,
        }))
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn media(&self) -> Option<&MediaBlob> {
        self.media.as_ref()
    }

    pub fn buffered_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Snapshot of the finished recording
    pub fn session(&self) -> RecordedSession {
        RecordedSession {
            frames: self.frames.clone(),
            media: self.media.clone(),
        }
    }

    /// Replace the artifacts with an imported session
    pub fn restore(&mut self, session: RecordedSession) -> Result<(), RecordingError> {
        if self.is_recording() {
            return Err(RecordingError::AlreadyActive);
        }
        self.chunks.clear();
        self.frames = session.frames;
        self.media = session.media;
        Ok(())
    }

    /// Drop all artifacts and return to idle
    pub fn clear(&mut self) {
        if self.is_recording() {
            debug!("Discarding active recording");
        }
        self.state = State::Idle;
        self.frames.clear();
        self.chunks.clear();
        self.media = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::tests::FakeSurface;

    fn table(v: f64) -> JointStateTable {
        let mut t = JointStateTable::new();
        t.set("HEAD_JOINT0", v);
        t
    }

    #[test]
    fn test_start_record_stop() {
        let mut recorder = Recorder::new();
        assert_eq!(recorder.start(&FakeSurface::webm()).unwrap(), "video/webm");

        recorder.record_frame(&table(0.1), 1);
        recorder.record_frame(&table(0.2), 34);
        assert!(recorder.push_chunk(vec![1, 2]));
        assert!(!recorder.push_chunk(Vec::new()));
        assert!(recorder.push_chunk(vec![3]));

        let media = recorder.stop().unwrap();
        assert_eq!(media.data, vec![1, 2, 3]);
        assert_eq!(media.mime_type, "video/webm");
        assert_eq!(recorder.frames().len(), 2);
        assert_eq!(recorder.buffered_chunks(), 0);
    }

    #[test]
    fn test_stop_when_idle() {
        let mut recorder = Recorder::new();
        let err = recorder.stop().unwrap_err();
        assert_eq!(err.to_string(), "Recording not active.");
    }

    #[test]
    fn test_start_failures() {
        let mut recorder = Recorder::new();
        let not_ready = FakeSurface {
            ready: false,
            formats: vec!["video/webm"],
        };
        assert_eq!(recorder.start(&not_ready), Err(RecordingError::SourceNotReady));

        let mp4_only = FakeSurface {
            ready: true,
            formats: vec!["video/mp4"],
        };
        assert_eq!(recorder.start(&mp4_only), Err(RecordingError::UnsupportedFormat));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_restart_clears_previous_session() {
        let mut recorder = Recorder::new();
        recorder.start(&FakeSurface::webm()).unwrap();
        recorder.record_frame(&table(0.1), 1);
        recorder.push_chunk(vec![9]);
        recorder.stop().unwrap();
        assert!(recorder.media().is_some());

        recorder.start(&FakeSurface::webm()).unwrap();
        assert!(recorder.frames().is_empty());
        assert!(recorder.media().is_none());
        assert_eq!(
            recorder.start(&FakeSurface::webm()),
            Err(RecordingError::AlreadyActive)
        );
    }

    #[test]
    fn test_restore_session() {
        let mut recorder = Recorder::new();
        recorder.start(&FakeSurface::webm()).unwrap();
        recorder.record_frame(&table(0.4), 10);
        recorder.stop().unwrap();
        let session = recorder.session();

        let mut other = Recorder::new();
        other.restore(session.clone()).unwrap();
        assert_eq!(other.session(), session);

        other.start(&FakeSurface::webm()).unwrap();
        assert_eq!(other.restore(session), Err(RecordingError::AlreadyActive));
    }

    #[test]
    fn test_idle_frames_ignored() {
        let mut recorder = Recorder::new();
        assert!(!recorder.record_frame(&table(0.0), 0));
        assert!(!recorder.push_chunk(vec![1]));
        assert!(recorder.session().is_empty());
    }
}
