//! Pose Capture Library for the Robot Playground
//!
//! Provides the landmark side of the body-tracking pipeline:
//! - Holistic landmark frames (33 pose points, 21 points per hand)
//! - Frame admission control with a minimum inter-frame interval
//! - Landmark sources (JSON-lines replay of detector output)

pub mod landmark;
pub mod source;
pub mod throttle;

pub use landmark::{HandLandmark, HolisticFrame, Landmark, PoseLandmark, Side};
pub use source::{JsonLinesSource, LandmarkSource};
pub use throttle::{Admission, FrameThrottle};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture error types
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Landmark source access denied: {0}")]
    PermissionDenied(String),

    #[error("Landmark source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed landmark frame at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera facing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera
    Environment,
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Ideal capture width
    pub width: u32,
    /// Ideal capture height
    pub height: u32,
    /// Camera facing mode
    pub facing_mode: FacingMode,
    /// Minimum interval between admitted frames (milliseconds)
    pub throttle_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            facing_mode: FacingMode::User,
            throttle_ms: 16,
        }
    }
}

impl CaptureConfig {
    /// Higher resolution, lower rate (for slower detectors)
    pub fn detailed() -> Self {
        Self {
            width: 640,
            height: 480,
            throttle_ms: 33,
            ..Default::default()
        }
    }

    /// Build a frame throttle for this configuration
    pub fn throttle(&self) -> FrameThrottle {
        FrameThrottle::new(std::time::Duration::from_millis(self.throttle_ms))
    }
}
