//! Per-robot scale/orientation correction and ground placement

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::urdf::Aabb;

/// Correction profile selected by robot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementProfile {
    /// Model authored in millimetres
    Millimetre,
    /// Model already upright and in metres
    Native,
    /// Unknown model: stand the longest extent up
    AutoUpright,
}

impl PlacementProfile {
    pub fn for_robot(robot_id: &str) -> Self {
        match robot_id {
            "jaxon_jvrc" => Self::Millimetre,
            "hexapod_robot" | "trial" => Self::Native,
            _ => Self::AutoUpright,
        }
    }
}

/// Uniform scale, rotation and translation applied to the loaded model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub profile: PlacementProfile,
    pub scale: f64,
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Placement {
    /// Compute the placement for `robot_id` given the model's unplaced extent
    pub fn compute(robot_id: &str, scale: f64, initial_position: [f64; 3], extent: &Aabb) -> Self {
        let profile = PlacementProfile::for_robot(robot_id);
        let (scale, rotation) = match profile {
            PlacementProfile::Millimetre => (scale * 0.001, UnitQuaternion::identity()),
            PlacementProfile::Native => (scale, UnitQuaternion::identity()),
            PlacementProfile::AutoUpright => (scale, upright_rotation(&extent.size())),
        };

        let mut placement = Self {
            profile,
            scale,
            rotation,
            translation: Vector3::zeros(),
        };

        let ground_offset = placement
            .placed_extent(extent)
            .map(|b| -b.min.y)
            .unwrap_or(0.0);
        let [x, y, z] = initial_position;
        placement.translation = Vector3::new(x, y + ground_offset, z);
        placement
    }

    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        let rotated = self.rotation * (p * self.scale);
        rotated + self.translation
    }

    /// Extent after rotation, scale and current translation
    pub fn placed_extent(&self, extent: &Aabb) -> Option<Aabb> {
        Aabb::from_points(extent.corners().iter().map(|c| self.transform_point(c)))
    }
}

fn upright_rotation(size: &Vector3<f64>) -> UnitQuaternion<f64> {
    let max = size.x.max(size.y).max(size.z);
    if size.z > size.y && size.z == max {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
    } else if size.x > size.y && size.x == max {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2)
    } else {
        UnitQuaternion::identity()
    }
}
