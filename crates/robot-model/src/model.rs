//! Loaded robot model

use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::mesh::MeshFileMap;
use crate::placement::Placement;
use crate::urdf::{Aabb, JointKind, JointLimit, RobotDescription};
use crate::{ModelConfig, ModelError};

/// Runtime state of one URDF joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelJoint {
    pub kind: JointKind,
    pub limit: Option<JointLimit>,
    pub angle: f64,
}

impl ModelJoint {
    /// `value` limited to the joint's range; continuous joints pass through
    pub fn clamp(&self, value: f64) -> f64 {
        match self.limit {
            Some(limit) if self.kind.is_limited() && limit.lower <= limit.upper => {
                value.clamp(limit.lower, limit.upper)
            }
            _ => value,
        }
    }
}

/// Visual mesh bound to an uploaded file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBinding {
    pub link: String,
    pub reference: String,
    pub file: String,
}

/// A URDF robot with every mesh resolved, placed in the scene
#[derive(Debug, Clone)]
pub struct RobotModel {
    description: RobotDescription,
    placement: Placement,
    joints: BTreeMap<String, ModelJoint>,
    meshes: Vec<MeshBinding>,
}

impl RobotModel {
    /// Parse `urdf_text`, resolve all mesh references against `meshes` and
    /// compute the placement. Fails on the first unresolved mesh.
    pub fn load(urdf_text: &str, meshes: &MeshFileMap, config: &ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let description = RobotDescription::parse(urdf_text)?;

        let mut bindings = Vec::new();
        for link in &description.links {
            for mesh in &link.meshes {
                let file = meshes
                    .resolve(&mesh.filename)
                    .ok_or_else(|| ModelError::MissingMesh(mesh.filename.clone()))?;
                debug!("Link '{}': '{}' -> '{}'", link.name, mesh.filename, file);
                bindings.push(MeshBinding {
                    link: link.name.clone(),
                    reference: mesh.filename.clone(),
                    file: file.to_string(),
                });
            }
        }

        let joints: BTreeMap<String, ModelJoint> = description
            .joints
            .iter()
            .filter(|j| j.kind.is_actuated())
            .map(|j| {
                (
                    j.name.clone(),
                    ModelJoint {
                        kind: j.kind,
                        limit: j.limit,
                        angle: 0.0,
                    },
                )
            })
            .collect();

        let extent = description.kinematic_extent().unwrap_or_else(|| {
            warn!("URDF '{}' has no reachable links, skipping ground offset", description.name);
            Aabb {
                min: Point3::origin(),
                max: Point3::origin(),
            }
        });
        let placement = Placement::compute(
            &config.robot_id,
            config.scale,
            config.initial_position,
            &extent,
        );

        info!(
            "Loaded robot '{}': {} links, {} actuated joints, {} meshes ({:?})",
            description.name,
            description.links.len(),
            joints.len(),
            bindings.len(),
            placement.profile
        );

        Ok(Self {
            description,
            placement,
            joints,
            meshes: bindings,
        })
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn description(&self) -> &RobotDescription {
        &self.description
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn meshes(&self) -> &[MeshBinding] {
        &self.meshes
    }

    /// Names of the settable joints
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.keys().map(String::as_str)
    }

    pub fn joint(&self, name: &str) -> Option<&ModelJoint> {
        self.joints.get(name)
    }

    pub fn joint_value(&self, name: &str) -> Option<f64> {
        self.joints.get(name).map(|j| j.angle)
    }

    /// Set a joint, clamped to its limits. Returns the stored value, or
    /// `None` when the model has no such joint.
    pub fn set_joint_value(&mut self, name: &str, value: f64) -> Option<f64> {
        let joint = self.joints.get_mut(name)?;
        joint.angle = joint.clamp(value);
        Some(joint.angle)
    }

    /// Return every joint to 0 (clamped)
    pub fn reset_pose(&mut self) {
        for joint in self.joints.values_mut() {
            joint.angle = joint.clamp(0.0);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ARM: &str = r#"<robot name="arm">
  <link name="base"><visual><geometry><mesh filename="package://arm/meshes/base.stl"/></geometry></visual></link>
  <link name="upper"><visual><geometry><mesh filename="package://arm/meshes/Upper.DAE"/></geometry></visual></link>
  <link name="fore"/>
  <link name="tool"/>
  <joint name="RARM_JOINT0" type="revolute">
    <parent link="base"/><child link="upper"/>
    <origin xyz="0 0 0.4"/>
    <limit lower="-1.0" upper="1.0"/>
  </joint>
  <joint name="RARM_JOINT4" type="continuous">
    <parent link="upper"/><child link="fore"/>
    <origin xyz="0 0 0.3"/>
  </joint>
  <joint name="TOOL" type="fixed">
    <parent link="fore"/><child link="tool"/>
    <origin xyz="0.1 0 0"/>
  </joint>
</robot>"#;

    pub(crate) fn arm_meshes() -> MeshFileMap {
        MeshFileMap::from_uploads(vec![("base.stl", vec![0u8; 4]), ("upper.dae", vec![0u8; 2])]).0
    }

    pub(crate) fn arm_model() -> RobotModel {
        RobotModel::load(ARM, &arm_meshes(), &ModelConfig::for_robot("trial")).unwrap()
    }

    #[test]
    fn test_load_resolves_meshes() {
        let model = arm_model();
        assert_eq!(model.name(), "arm");
        let files: Vec<_> = model.meshes().iter().map(|m| m.file.as_str()).collect();
        assert_eq!(files, vec!["base.stl", "upper.dae"]);
    }

    #[test]
    fn test_only_actuated_joints_are_settable() {
        let model = arm_model();
        let names: Vec<_> = model.joint_names().collect();
        assert_eq!(names, vec!["RARM_JOINT0", "RARM_JOINT4"]);
        assert!(model.joint("TOOL").is_none());
    }

    #[test]
    fn test_missing_mesh_fails_load() {
        let (meshes, _) = MeshFileMap::from_uploads(vec![("base.stl", vec![1u8])]);
        let err = RobotModel::load(ARM, &meshes, &ModelConfig::default()).unwrap_err();
        match err {
            ModelError::MissingMesh(name) => assert!(name.ends_with("Upper.DAE")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_revolute_is_clamped_continuous_is_not() {
        let mut model = arm_model();
        assert_eq!(model.set_joint_value("RARM_JOINT0", 2.5), Some(1.0));
        assert_eq!(model.set_joint_value("RARM_JOINT4", 5.0), Some(5.0));
        assert_eq!(model.set_joint_value("NOPE", 0.1), None);

        model.reset_pose();
        assert_eq!(model.joint_value("RARM_JOINT4"), Some(0.0));
    }

    #[test]
    fn test_placement_grounds_model() {
        let model = arm_model();
        let extent = model.description().kinematic_extent().unwrap();
        let placed = model.placement().placed_extent(&extent).unwrap();
        assert!(placed.min.y.abs() < 1e-9);
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = RobotModel::load("not xml <", &arm_meshes(), &ModelConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
