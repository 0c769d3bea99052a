//! Landmark sources

use crate::{CaptureError, HolisticFrame};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Anything that yields detector results frame by frame
pub trait LandmarkSource {
    /// Next frame, or `None` when the source is exhausted
    fn next_frame(&mut self) -> Result<Option<HolisticFrame>, CaptureError>;
}

/// Replays detector output stored as one JSON object per line
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a JSON-lines landmark recording
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| open_error(path, e))?;
        info!("Replaying landmarks from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

fn open_error(path: &Path, err: io::Error) -> CaptureError {
    let message = format!("{}: {}", path.display(), err);
    match err.kind() {
        io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied(message),
        _ => CaptureError::Unavailable(message),
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }

    /// Lines consumed so far
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<HolisticFrame>, CaptureError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let trimmed = buf.trim();
            if trimmed.is_empty() {
                debug!("Skipping blank line {}", self.line);
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|e| CaptureError::Malformed {
                    line: self.line,
                    message: e.to_string(),
                });
        }
    }
}
