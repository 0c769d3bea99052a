//! Applying joint-state tables to a loaded model

use joint_mapper::JointStateTable;
use tracing::trace;

use crate::model::RobotModel;

/// Table keys that carry metadata rather than joint angles
pub const RESERVED_KEYS: [&str; 2] = ["cmd", "timestamp"];

/// Outcome of one apply pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Joints whose value was set
    pub applied: usize,
    /// Joints within epsilon of their target
    pub unchanged: usize,
    /// Names the model does not have
    pub unknown: usize,
    /// Non-finite targets
    pub invalid: usize,
}

/// Sets model joints from a table when the target moved by more than epsilon
#[derive(Debug, Clone, Copy)]
pub struct ModelApplier {
    epsilon: f64,
}

impl Default for ModelApplier {
    fn default() -> Self {
        Self::new(0.001)
    }
}

impl ModelApplier {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.abs(),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Apply every table entry the model knows. Never fails.
    pub fn apply(&self, model: &mut RobotModel, table: &JointStateTable) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (name, target) in table.iter() {
            if RESERVED_KEYS.contains(&name) {
                continue;
            }
            if !target.is_finite() {
                report.invalid += 1;
                continue;
            }
            let Some(joint) = model.joint(name) else {
                report.unknown += 1;
                continue;
            };
            let target = joint.clamp(target);
            if (target - joint.angle).abs() > self.epsilon {
                model.set_joint_value(name, target);
                report.applied += 1;
            } else {
                report.unchanged += 1;
            }
        }

        trace!(
            "Applied {} joints ({} unchanged, {} unknown)",
            report.applied,
            report.unchanged,
            report.unknown
        );
        report
    }
}
