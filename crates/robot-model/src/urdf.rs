//! URDF robot description parsing

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use roxmltree::Node;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::ModelError;

/// URDF joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
    Floating,
    Planar,
}

impl JointKind {
    /// Single-DOF joints that accept a scalar value
    pub fn is_actuated(&self) -> bool {
        matches!(self, Self::Revolute | Self::Continuous | Self::Prismatic)
    }

    /// Joints whose value is clamped to their limits
    pub fn is_limited(&self) -> bool {
        matches!(self, Self::Revolute | Self::Prismatic)
    }
}

impl FromStr for JointKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revolute" => Ok(Self::Revolute),
            "continuous" => Ok(Self::Continuous),
            "prismatic" => Ok(Self::Prismatic),
            "fixed" => Ok(Self::Fixed),
            "floating" => Ok(Self::Floating),
            "planar" => Ok(Self::Planar),
            other => Err(ModelError::InvalidUrdf(format!("unknown joint type '{}'", other))),
        }
    }
}

/// Frame offset (`<origin xyz rpy>`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub xyz: [f64; 3],
    pub rpy: [f64; 3],
}

impl Origin {
    pub fn isometry(&self) -> Isometry3<f64> {
        let [x, y, z] = self.xyz;
        let [roll, pitch, yaw] = self.rpy;
        Isometry3::from_parts(
            Translation3::new(x, y, z),
            UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        )
    }
}

/// Mesh reference from a `<visual>` geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRef {
    pub filename: String,
    pub scale: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkDesc {
    pub name: String,
    pub meshes: Vec<MeshRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimit {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDesc {
    pub name: String,
    pub kind: JointKind,
    pub parent: String,
    pub child: String,
    pub origin: Origin,
    pub axis: [f64; 3],
    pub limit: Option<JointLimit>,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn from_points<I: IntoIterator<Item = Point3<f64>>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.min = aabb.min.inf(&p);
            aabb.max = aabb.max.sup(&p);
        }
        Some(aabb)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn corners(&self) -> [Point3<f64>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }
}

/// Parsed `<robot>` element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotDescription {
    pub name: String,
    pub links: Vec<LinkDesc>,
    pub joints: Vec<JointDesc>,
}

impl RobotDescription {
    /// Parse URDF XML text
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        let doc = roxmltree::Document::parse(text).map_err(|e| ModelError::Parse(e.to_string()))?;
        let root = doc.root_element();
        if !root.has_tag_name("robot") {
            return Err(ModelError::InvalidUrdf(format!(
                "root element is <{}>, expected <robot>",
                root.tag_name().name()
            )));
        }

        let mut links = Vec::new();
        let mut joints = Vec::new();
        for node in root.children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "link" => links.push(parse_link(node)?),
                "joint" => joints.push(parse_joint(node)?),
                _ => {}
            }
        }

        let name = root.attribute("name").unwrap_or("robot").to_string();
        debug!("Parsed URDF '{}': {} links, {} joints", name, links.len(), joints.len());
        Ok(Self {
            name,
            links,
            joints,
        })
    }

    /// Every mesh filename referenced by a visual
    pub fn mesh_references(&self) -> impl Iterator<Item = &MeshRef> {
        self.links.iter().flat_map(|l| l.meshes.iter())
    }

    /// Links that are nobody's child
    pub fn root_links(&self) -> Vec<&str> {
        let children: HashSet<&str> = self.joints.iter().map(|j| j.child.as_str()).collect();
        self.links
            .iter()
            .map(|l| l.name.as_str())
            .filter(|name| !children.contains(name))
            .collect()
    }

    /// World pose of every reachable link at the zero joint configuration
    pub fn link_poses(&self) -> BTreeMap<String, Isometry3<f64>> {
        let mut poses = BTreeMap::new();
        let mut queue = VecDeque::new();
        for root in self.root_links() {
            poses.insert(root.to_string(), Isometry3::identity());
            queue.push_back(root.to_string());
        }

        while let Some(parent) = queue.pop_front() {
            let parent_pose = poses[&parent];
            for joint in self.joints.iter().filter(|j| j.parent == parent) {
                if poses.contains_key(&joint.child) {
                    warn!("Link '{}' reached twice, ignoring joint '{}'", joint.child, joint.name);
                    continue;
                }
                poses.insert(joint.child.clone(), parent_pose * joint.origin.isometry());
                queue.push_back(joint.child.clone());
            }
        }
        poses
    }

    /// Bounding box of link frame origins at the zero pose
    pub fn kinematic_extent(&self) -> Option<Aabb> {
        Aabb::from_points(
            self.link_poses()
                .values()
                .map(|pose| Point3::from(pose.translation.vector)),
        )
    }
}

fn required_attr<'a>(node: Node<'a, '_>, attr: &str) -> Result<&'a str, ModelError> {
    node.attribute(attr).ok_or_else(|| {
        ModelError::InvalidUrdf(format!(
            "<{}> missing '{}' attribute",
            node.tag_name().name(),
            attr
        ))
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn parse_vec3(text: &str) -> Result<[f64; 3], ModelError> {
    let values: Vec<f64> = text
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| ModelError::InvalidUrdf(format!("bad vector '{}': {}", text, e)))?;
    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(ModelError::InvalidUrdf(format!(
            "expected 3 components, got '{}'",
            text
        ))),
    }
}

fn parse_f64(node: Node, attr: &str, default: f64) -> Result<f64, ModelError> {
    match node.attribute(attr) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| ModelError::InvalidUrdf(format!("bad {} '{}': {}", attr, v, e))),
        None => Ok(default),
    }
}

fn parse_origin(node: Node) -> Result<Origin, ModelError> {
    match child(node, "origin") {
        Some(origin) => Ok(Origin {
            xyz: origin.attribute("xyz").map(parse_vec3).transpose()?.unwrap_or_default(),
            rpy: origin.attribute("rpy").map(parse_vec3).transpose()?.unwrap_or_default(),
        }),
        None => Ok(Origin::default()),
    }
}

fn parse_link(node: Node) -> Result<LinkDesc, ModelError> {
    let name = required_attr(node, "name")?.to_string();
    let mut meshes = Vec::new();

    for visual in node.children().filter(|n| n.has_tag_name("visual")) {
        let mesh = child(visual, "geometry").and_then(|g| child(g, "mesh"));
        if let Some(mesh) = mesh {
            meshes.push(MeshRef {
                filename: required_attr(mesh, "filename")?.to_string(),
                scale: mesh
                    .attribute("scale")
                    .map(parse_vec3)
                    .transpose()?
                    .unwrap_or([1.0, 1.0, 1.0]),
            });
        }
    }

    Ok(LinkDesc { name, meshes })
}

fn parse_joint(node: Node) -> Result<JointDesc, ModelError> {
    let name = required_attr(node, "name")?.to_string();
    let kind: JointKind = required_attr(node, "type")?.parse()?;
    let parent = child(node, "parent")
        .map(|n| required_attr(n, "link"))
        .transpose()?
        .ok_or_else(|| ModelError::InvalidUrdf(format!("joint '{}' has no parent", name)))?
        .to_string();
    let child_link = child(node, "child")
        .map(|n| required_attr(n, "link"))
        .transpose()?
        .ok_or_else(|| ModelError::InvalidUrdf(format!("joint '{}' has no child", name)))?
        .to_string();
    let axis = child(node, "axis")
        .and_then(|n| n.attribute("xyz"))
        .map(parse_vec3)
        .transpose()?
        .unwrap_or([1.0, 0.0, 0.0]);
    let limit = child(node, "limit")
        .map(|n| -> Result<JointLimit, ModelError> {
            Ok(JointLimit {
                lower: parse_f64(n, "lower", 0.0)?,
                upper: parse_f64(n, "upper", 0.0)?,
            })
        })
        .transpose()?;

    Ok(JointDesc {
        name,
        kind,
        parent,
        child: child_link,
        origin: parse_origin(node)?,
        axis,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM: &str = r#"<?xml version="1.0"?>
<robot name="two_link">
  <link name="base">
    <visual><geometry><mesh filename="package://two_link/meshes/Base.STL"/></geometry></visual>
  </link>
  <link name="upper">
    <visual>
      <origin xyz="0 0 0.1"/>
      <geometry><mesh filename="meshes/upper.dae" scale="0.001 0.001 0.001"/></geometry>
    </visual>
  </link>
  <link name="tool"/>
  <joint name="shoulder" type="revolute">
    <parent link="base"/>
    <child link="upper"/>
    <origin xyz="0 0 0.5" rpy="0 0 0"/>
    <axis xyz="0 1 0"/>
    <limit lower="-1.57" upper="1.57" effort="10" velocity="1"/>
  </joint>
  <joint name="wrist" type="fixed">
    <parent link="upper"/>
    <child link="tool"/>
    <origin xyz="0.3 0 0"/>
  </joint>
</robot>"#;

    #[test]
    fn test_parse_links_and_joints() {
        let robot = RobotDescription::parse(ARM).unwrap();
        assert_eq!(robot.name, "two_link");
        assert_eq!(robot.links.len(), 3);
        assert_eq!(robot.joints.len(), 2);

        let shoulder = &robot.joints[0];
        assert_eq!(shoulder.kind, JointKind::Revolute);
        assert_eq!(shoulder.axis, [0.0, 1.0, 0.0]);
        assert_eq!(shoulder.limit, Some(JointLimit { lower: -1.57, upper: 1.57 }));
        assert_eq!(robot.joints[1].limit, None);
    }

    #[test]
    fn test_mesh_references() {
        let robot = RobotDescription::parse(ARM).unwrap();
        let refs: Vec<_> = robot.mesh_references().map(|m| m.filename.as_str()).collect();
        assert_eq!(refs, vec!["package://two_link/meshes/Base.STL", "meshes/upper.dae"]);
        assert_eq!(robot.links[1].meshes[0].scale, [0.001, 0.001, 0.001]);
    }

    #[test]
    fn test_kinematic_extent() {
        let robot = RobotDescription::parse(ARM).unwrap();
        assert_eq!(robot.root_links(), vec!["base"]);
        let extent = robot.kinematic_extent().unwrap();
        let size = extent.size();
        assert!((size.x - 0.3).abs() < 1e-12);
        assert!(size.y.abs() < 1e-12);
        assert!((size.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_robot_root() {
        let err = RobotDescription::parse("<model/>").unwrap_err();
        assert!(matches!(err, ModelError::InvalidUrdf(_)));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        let err = RobotDescription::parse("<robot>").unwrap_err();
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn test_rejects_unknown_joint_type() {
        let text = r#"<robot name="r"><link name="a"/><link name="b"/>
            <joint name="j" type="spherical"><parent link="a"/><child link="b"/></joint></robot>"#;
        assert!(RobotDescription::parse(text).is_err());
    }

    #[test]
    fn test_rejects_bad_vector() {
        let text = r#"<robot name="r"><link name="a"/><link name="b"/>
            <joint name="j" type="fixed"><parent link="a"/><child link="b"/>
            <origin xyz="1 2"/></joint></robot>"#;
        assert!(RobotDescription::parse(text).is_err());
    }
}
