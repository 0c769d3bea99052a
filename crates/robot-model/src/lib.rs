//! Robot Model
//!
//! Loads a URDF description together with its uploaded mesh files:
//! - URDF parsing (links, joints, limits, visual mesh references)
//! - Mesh reference resolution against the uploaded file names
//! - Per-robot scale/orientation correction and ground placement
//! - Applying joint-state tables to the loaded model

pub mod applier;
pub mod mesh;
pub mod model;
pub mod placement;
pub mod urdf;

pub use applier::{ApplyReport, ModelApplier};
pub use mesh::{is_mesh_file, MeshFileMap, MESH_EXTENSIONS};
pub use model::{ModelJoint, RobotModel};
pub use placement::{Placement, PlacementProfile};
pub use urdf::{Aabb, JointDesc, JointKind, JointLimit, LinkDesc, MeshRef, RobotDescription};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Model error types
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("URDF parse error: {0}")]
    Parse(String),

    #[error("Invalid URDF: {0}")]
    InvalidUrdf(String),

    #[error("Mesh file not found: {0}")]
    MissingMesh(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Model placement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Robot identifier selecting the placement profile
    pub robot_id: String,
    /// Uniform scale before profile correction
    pub scale: f64,
    /// Scene position before the ground offset
    pub initial_position: [f64; 3],
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            robot_id: "hexapod_robot".to_string(),
            scale: 1.0,
            initial_position: [0.0, 0.0, 0.0],
        }
    }
}

impl ModelConfig {
    pub fn for_robot(robot_id: impl Into<String>) -> Self {
        Self {
            robot_id: robot_id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ModelError::Config(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.initial_position.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Config("initial_position must be finite".into()));
        }
        Ok(())
    }
}
