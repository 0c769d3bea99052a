//! Mapper configuration

use serde::{Deserialize, Serialize};

use crate::MapperError;

/// Joint mapper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Minimum change (radians) before a limb re-emits its joints
    pub change_threshold: f64,

    /// Landmarks with visibility below this are treated as missing
    pub min_visibility: f64,

    /// Enable head yaw/pitch mapping
    pub enable_head: bool,

    /// Enable shoulder/elbow mapping
    pub enable_arms: bool,

    /// Enable hip/knee/ankle mapping
    pub enable_legs: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            change_threshold: 0.01,
            min_visibility: 0.0,
            enable_head: true,
            enable_arms: true,
            enable_legs: true,
        }
    }
}

impl MapperConfig {
    /// Upper body only (seated operator, legs out of frame)
    pub fn upper_body() -> Self {
        Self {
            enable_legs: false,
            ..Default::default()
        }
    }

    /// Ignore poorly tracked landmarks and small jitter
    pub fn steady() -> Self {
        Self {
            change_threshold: 0.03,
            min_visibility: 0.5,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), MapperError> {
        if !self.change_threshold.is_finite() || self.change_threshold < 0.0 {
            return Err(MapperError::Config(format!(
                "change_threshold must be a non-negative number, got {}",
                self.change_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(MapperError::Config(format!(
                "min_visibility must lie in [0, 1], got {}",
                self.min_visibility
            )));
        }
        Ok(())
    }
}
