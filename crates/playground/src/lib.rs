//! Robot Playground
//!
//! Ties the pose pipeline together: uploaded URDF and meshes are loaded into
//! a robot model, holistic landmark frames drive its joints through the body
//! mapper, and the joint trajectory can be recorded and replayed.
//!
//! Failures never escape as panics or hard errors to the caller's UI; every
//! operation leaves a user-facing status string behind.

pub mod config;
pub mod guard;
pub mod pipeline;
pub mod status;

pub use config::{PlaygroundConfig, Profile};
pub use guard::{Guarded, RenderGuard};
pub use pipeline::{Playground, UrdfFile};

use joint_mapper::MapperError;
use pose_capture::CaptureError;
use robot_model::ModelError;
use session_recorder::RecordingError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Playground error types.
///
/// Display strings double as status messages.
#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("Please select a URDF file first.")]
    NoUrdfSelected,

    #[error("Please select mesh files (.dae, .stl, .obj, etc.).")]
    NoMeshFiles,

    #[error("Please select a valid URDF file (.urdf extension).")]
    InvalidUrdfFile,

    #[error("No valid mesh files found. Please select .dae, .stl, .obj, .ply, .fbx, .gltf, or .glb files.")]
    NoValidMeshes,

    #[error("Error loading robot: {0}")]
    Load(String),

    #[error("Robot not loaded, cannot play recorded motion.")]
    ModelNotLoaded,

    #[error("Please load a robot before recording.")]
    NoRobotToRecord,

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Initialize logging at `level` (`trace`, `debug`, `info`, `warn`, `error`)
pub fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already installed");
    }
}
