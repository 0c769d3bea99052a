//! Joint Mapper
//!
//! Turns holistic body landmarks into robot joint targets:
//! - Head yaw/pitch from the nose position
//! - Shoulder roll/pitch and elbow bend from wrist and arm angle
//! - Hip pitch, knee bend and ankle pitch from leg angles
//!
//! Each limb only re-emits when one of its outputs moved by more than the
//! change threshold, and silently skips frames with missing landmarks.

pub mod config;
pub mod limbs;
pub mod math;
pub mod state;
pub mod update;

pub use config::MapperConfig;
pub use limbs::{ArmMapper, ChangeGate, HeadMapper, LegMapper, LimbMapper};
pub use math::{map_range, three_point_angle};
pub use state::JointStateTable;
pub use update::{JointSpec, JointUpdate, MappingReport};

use pose_capture::{HolisticFrame, Side};
use thiserror::Error;
use tracing::{debug, info};

/// Mapper error types
#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Whole-body mapper.
///
/// Limbs run in a fixed order (head, left arm, right arm, left leg, right leg);
/// when two limbs write the same joint in one tick the later one wins.
pub struct BodyMapper {
    config: MapperConfig,
    limbs: Vec<Box<dyn LimbMapper>>,
    frames_seen: u64,
    frames_tracked: u64,
}

impl BodyMapper {
    /// Create a body mapper with configuration
    pub fn new(config: MapperConfig) -> Result<Self, MapperError> {
        config.validate()?;

        let threshold = config.change_threshold;
        let vis = config.min_visibility;
        let mut limbs: Vec<Box<dyn LimbMapper>> = Vec::new();

        if config.enable_head {
            limbs.push(Box::new(HeadMapper::new(threshold, vis)));
        }
        if config.enable_arms {
            limbs.push(Box::new(ArmMapper::new(Side::Left, threshold, vis)));
            limbs.push(Box::new(ArmMapper::new(Side::Right, threshold, vis)));
        }
        if config.enable_legs {
            limbs.push(Box::new(LegMapper::new(Side::Left, threshold, vis)));
            limbs.push(Box::new(LegMapper::new(Side::Right, threshold, vis)));
        }

        info!(
            "Body mapper created with {} limbs (threshold {} rad)",
            limbs.len(),
            threshold
        );

        Ok(Self {
            config,
            limbs,
            frames_seen: 0,
            frames_tracked: 0,
        })
    }

    /// Map one detector frame into `table`
    pub fn update(&mut self, frame: &HolisticFrame, table: &mut JointStateTable) -> MappingReport {
        self.frames_seen += 1;

        let mut report = MappingReport {
            tracked: frame.has_pose(),
            ..Default::default()
        };
        if report.tracked {
            self.frames_tracked += 1;
        }

        for limb in self.limbs.iter_mut() {
            if let Some(update) = limb.map(frame) {
                report.joints_written += update.len();
                report.updated_limbs.push(update.limb.to_string());
                table.apply(&update);
            }
        }

        if report.has_updates() {
            debug!(
                "Frame {}: {} joints from {:?}",
                self.frames_seen, report.joints_written, report.updated_limbs
            );
        }
        report
    }

    /// Declared output ranges of every mapped joint
    pub fn joint_specs(&self) -> Vec<JointSpec> {
        self.limbs.iter().flat_map(|l| l.joint_specs()).collect()
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Fraction of frames in which the body was tracked
    pub fn tracking_ratio(&self) -> f64 {
        if self.frames_seen == 0 {
            return 0.0;
        }
        self.frames_tracked as f64 / self.frames_seen as f64
    }

    /// Forget previously emitted values (new session or robot)
    pub fn reset(&mut self) {
        for limb in self.limbs.iter_mut() {
            limb.reset();
        }
        self.frames_seen = 0;
        self.frames_tracked = 0;
    }
}
