//! Per-limb landmark to joint mappers

use pose_capture::{HandLandmark, HolisticFrame, Landmark, PoseLandmark, Side};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, FRAC_PI_4, FRAC_PI_6, PI};
use tracing::trace;

use crate::math::{map_range, optional_angle, three_point_angle};
use crate::update::{JointSpec, JointUpdate};

/// A limb mapper turns one detector frame into a partial joint update
pub trait LimbMapper: Send {
    /// Stable limb name used in reports and logs
    fn name(&self) -> &'static str;

    /// Joints this limb writes, with their declared output ranges
    fn joint_specs(&self) -> Vec<JointSpec>;

    /// `None` when inputs are missing or the change is below threshold
    fn map(&mut self, frame: &HolisticFrame) -> Option<JointUpdate>;

    /// Forget previously emitted values
    fn reset(&mut self);
}

/// Re-emission gate: passes when any output moved by more than the threshold
#[derive(Debug, Clone)]
pub struct ChangeGate {
    threshold: f64,
    last: Option<Vec<f64>>,
}

impl ChangeGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    /// Returns true (and remembers `values`) when the update should be emitted
    pub fn admit(&mut self, values: &[f64]) -> bool {
        let changed = match &self.last {
            None => true,
            Some(last) => {
                last.len() != values.len()
                    || last
                        .iter()
                        .zip(values)
                        .any(|(prev, next)| (prev - next).abs() > self.threshold)
            }
        };
        if changed {
            self.last = Some(values.to_vec());
        }
        changed
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

fn visible(landmark: Option<&Landmark>, min_visibility: f64) -> Option<&Landmark> {
    landmark.filter(|lm| lm.visibility >= min_visibility)
}

/// Head yaw/pitch from the nose position
pub struct HeadMapper {
    gate: ChangeGate,
    min_visibility: f64,
}

impl HeadMapper {
    pub const YAW: &'static str = "HEAD_JOINT0";
    pub const PITCH: &'static str = "HEAD_JOINT1";

    pub fn new(threshold: f64, min_visibility: f64) -> Self {
        Self {
            gate: ChangeGate::new(threshold),
            min_visibility,
        }
    }
}

impl LimbMapper for HeadMapper {
    fn name(&self) -> &'static str {
        "head"
    }

    fn joint_specs(&self) -> Vec<JointSpec> {
        vec![
            JointSpec::new(Self::YAW, FRAC_PI_4, -FRAC_PI_4),
            JointSpec::new(Self::PITCH, -FRAC_PI_4, FRAC_PI_4),
        ]
    }

    fn map(&mut self, frame: &HolisticFrame) -> Option<JointUpdate> {
        let nose = visible(frame.pose(PoseLandmark::Nose), self.min_visibility)?;

        let yaw = map_range(nose.x, 0.0, 1.0, FRAC_PI_4, -FRAC_PI_4);
        let pitch = map_range(nose.y, 0.0, 1.0, -FRAC_PI_4, FRAC_PI_4);

        if !self.gate.admit(&[yaw, pitch]) {
            trace!("Head update suppressed");
            return None;
        }

        let mut update = JointUpdate::new(self.name());
        update.push(Self::YAW, yaw);
        update.push(Self::PITCH, pitch);
        Some(update)
    }

    fn reset(&mut self) {
        self.gate.reset();
    }
}

/// Shoulder roll/pitch from the wrist position, elbow from the arm angle
pub struct ArmMapper {
    side: Side,
    gate: ChangeGate,
    min_visibility: f64,
}

impl ArmMapper {
    pub fn new(side: Side, threshold: f64, min_visibility: f64) -> Self {
        Self {
            side,
            gate: ChangeGate::new(threshold),
            min_visibility,
        }
    }

    fn joint(&self, index: u8) -> String {
        format!("{}ARM_JOINT{}", self.side.prefix(), index)
    }
}

impl LimbMapper for ArmMapper {
    fn name(&self) -> &'static str {
        match self.side {
            Side::Left => "left_arm",
            Side::Right => "right_arm",
        }
    }

    fn joint_specs(&self) -> Vec<JointSpec> {
        vec![
            JointSpec::new(self.joint(0), -FRAC_PI_4, FRAC_PI_4),
            JointSpec::new(self.joint(1), -PI, FRAC_PI_6),
            JointSpec::new(self.joint(4), -FRAC_PI_2, 0.0),
        ]
    }

    fn map(&mut self, frame: &HolisticFrame) -> Option<JointUpdate> {
        let wrist = visible(frame.hand(self.side, HandLandmark::Wrist), self.min_visibility)?;
        let shoulder = visible(frame.pose(PoseLandmark::shoulder(self.side)), self.min_visibility)?;
        let elbow = visible(frame.pose(PoseLandmark::elbow(self.side)), self.min_visibility)?;

        let shoulder_pitch = map_range(wrist.y, 0.0, 0.75, PI, -FRAC_PI_6);
        let shoulder_roll = map_range(wrist.x, 0.0, 1.0, FRAC_PI_4, -FRAC_PI_4);
        let elbow_angle = three_point_angle(shoulder, elbow, wrist);
        let elbow_joint = map_range(elbow_angle, 0.1, PI - 0.1, FRAC_PI_2, 0.0);

        if !self.gate.admit(&[shoulder_roll, shoulder_pitch, elbow_joint]) {
            trace!("{} update suppressed", self.name());
            return None;
        }

        // Robot arm axes are mirrored relative to the camera image
        let mut update = JointUpdate::new(self.name());
        update.push(self.joint(0), -shoulder_roll);
        update.push(self.joint(1), -shoulder_pitch);
        update.push(self.joint(4), -elbow_joint);
        Some(update)
    }

    fn reset(&mut self) {
        self.gate.reset();
    }
}

/// Hip pitch, knee bend and ankle pitch from leg angles
pub struct LegMapper {
    side: Side,
    gate: ChangeGate,
    min_visibility: f64,
}

impl LegMapper {
    pub fn new(side: Side, threshold: f64, min_visibility: f64) -> Self {
        Self {
            side,
            gate: ChangeGate::new(threshold),
            min_visibility,
        }
    }

    fn joint(&self, index: u8) -> String {
        format!("{}LEG_JOINT{}", self.side.prefix(), index)
    }
}

impl LimbMapper for LegMapper {
    fn name(&self) -> &'static str {
        match self.side {
            Side::Left => "left_leg",
            Side::Right => "right_leg",
        }
    }

    fn joint_specs(&self) -> Vec<JointSpec> {
        vec![
            JointSpec::new(self.joint(0), 0.0, 0.0),
            JointSpec::new(self.joint(1), -FRAC_PI_3, FRAC_PI_3),
            JointSpec::new(self.joint(2), 0.0, 0.0),
            JointSpec::new(self.joint(3), 0.0, FRAC_PI_2),
            JointSpec::new(self.joint(4), -FRAC_PI_6, FRAC_PI_6),
            JointSpec::new(self.joint(5), 0.0, 0.0),
        ]
    }

    fn map(&mut self, frame: &HolisticFrame) -> Option<JointUpdate> {
        let min_vis = self.min_visibility;
        let hip = visible(frame.pose(PoseLandmark::hip(self.side)), min_vis)?;
        let knee = visible(frame.pose(PoseLandmark::knee(self.side)), min_vis)?;
        let ankle = visible(frame.pose(PoseLandmark::ankle(self.side)), min_vis)?;
        let shoulder = visible(frame.pose(PoseLandmark::shoulder(self.side)), min_vis);
        let foot = visible(frame.pose(PoseLandmark::foot_index(self.side)), min_vis);

        let hip_angle = optional_angle(Some(knee), Some(hip), shoulder);
        let knee_angle = three_point_angle(hip, knee, ankle);
        let ankle_angle = optional_angle(Some(knee), Some(ankle), foot);

        let hip_pitch = map_range(hip_angle, 0.0, PI, -FRAC_PI_3, FRAC_PI_3);
        let knee_bend = map_range(knee_angle, 0.0, PI, 0.0, FRAC_PI_2);
        let ankle_pitch = map_range(ankle_angle, 0.0, PI, -FRAC_PI_6, FRAC_PI_6);

        if !self.gate.admit(&[hip_pitch, knee_bend, ankle_pitch]) {
            trace!("{} update suppressed", self.name());
            return None;
        }

        // Hip yaw/roll and ankle roll are held neutral
        let mut update = JointUpdate::new(self.name());
        update.push(self.joint(0), 0.0);
        update.push(self.joint(1), hip_pitch);
        update.push(self.joint(2), 0.0);
        update.push(self.joint(3), knee_bend);
        update.push(self.joint(4), ankle_pitch);
        update.push(self.joint(5), 0.0);
        Some(update)
    }

    fn reset(&mut self) {
        self.gate.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pose_with(points: &[(PoseLandmark, (f64, f64))]) -> Vec<Landmark> {
        let mut pose = vec![Landmark::new(0.5, 0.5); PoseLandmark::COUNT];
        for (index, (x, y)) in points {
            pose[*index as usize] = Landmark::new(*x, *y);
        }
        pose
    }

    fn frame_with_left_hand(pose: Vec<Landmark>, wrist: (f64, f64)) -> HolisticFrame {
        HolisticFrame {
            pose_landmarks: Some(pose),
            left_hand_landmarks: Some(vec![Landmark::new(wrist.0, wrist.1)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_head_centered_nose_is_neutral() {
        let mut head = HeadMapper::new(0.01, 0.0);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose_with(&[(PoseLandmark::Nose, (0.5, 0.5))])),
            ..Default::default()
        };

        let update = head.map(&frame).unwrap();
        assert!(update.get(HeadMapper::YAW).unwrap().abs() < 1e-12);
        assert!(update.get(HeadMapper::PITCH).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_head_extremes() {
        let mut head = HeadMapper::new(0.01, 0.0);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose_with(&[(PoseLandmark::Nose, (0.0, 1.0))])),
            ..Default::default()
        };
        let update = head.map(&frame).unwrap();
        assert!((update.get(HeadMapper::YAW).unwrap() - FRAC_PI_4).abs() < 1e-12);
        assert!((update.get(HeadMapper::PITCH).unwrap() - FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_head_without_pose_skips() {
        let mut head = HeadMapper::new(0.01, 0.0);
        assert!(head.map(&HolisticFrame::default()).is_none());
    }

    #[test]
    fn test_arm_needs_hand_landmarks() {
        let mut arm = ArmMapper::new(Side::Left, 0.01, 0.0);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose_with(&[])),
            ..Default::default()
        };
        assert!(arm.map(&frame).is_none());
    }

    #[test]
    fn test_arm_raised_straight() {
        let mut arm = ArmMapper::new(Side::Left, 0.01, 0.0);
        // Shoulder, elbow and wrist in a vertical line, wrist at the top
        let pose = pose_with(&[
            (PoseLandmark::LeftShoulder, (0.5, 0.5)),
            (PoseLandmark::LeftElbow, (0.5, 0.25)),
        ]);
        let update = arm.map(&frame_with_left_hand(pose, (0.5, 0.0))).unwrap();

        // Pitch at input minimum maps to π, negated on output
        assert!((update.get("LARM_JOINT1").unwrap() + PI).abs() < 1e-9);
        // Centered wrist gives zero roll
        assert!(update.get("LARM_JOINT0").unwrap().abs() < 1e-9);
        // Straight arm: elbow angle π clamps to π-0.1, maps to 0
        assert!(update.get("LARM_JOINT4").unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_right_arm_uses_right_side_names() {
        let mut arm = ArmMapper::new(Side::Right, 0.01, 0.0);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose_with(&[])),
            right_hand_landmarks: Some(vec![Landmark::new(0.3, 0.3)]),
            ..Default::default()
        };
        let update = arm.map(&frame).unwrap();
        let names: Vec<_> = update.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["RARM_JOINT0", "RARM_JOINT1", "RARM_JOINT4"]);
    }

    #[test]
    fn test_leg_emits_six_joints_with_neutral_axes() {
        let mut leg = LegMapper::new(Side::Left, 0.01, 0.0);
        let pose = pose_with(&[
            (PoseLandmark::LeftShoulder, (0.5, 0.2)),
            (PoseLandmark::LeftHip, (0.5, 0.5)),
            (PoseLandmark::LeftKnee, (0.5, 0.7)),
            (PoseLandmark::LeftAnkle, (0.5, 0.9)),
            (PoseLandmark::LeftFootIndex, (0.6, 0.95)),
        ]);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose),
            ..Default::default()
        };

        let update = leg.map(&frame).unwrap();
        assert_eq!(update.len(), 6);
        assert_eq!(update.get("LLEG_JOINT0"), Some(0.0));
        assert_eq!(update.get("LLEG_JOINT2"), Some(0.0));
        assert_eq!(update.get("LLEG_JOINT5"), Some(0.0));
        // Straight standing leg: hip and knee angles are π
        assert!((update.get("LLEG_JOINT1").unwrap() - FRAC_PI_3).abs() < 1e-9);
        assert!((update.get("LLEG_JOINT3").unwrap() - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_leg_missing_knee_skips() {
        let mut leg = LegMapper::new(Side::Right, 0.01, 0.0);
        let mut pose = pose_with(&[]);
        pose.truncate(PoseLandmark::RightKnee as usize);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose),
            ..Default::default()
        };
        assert!(leg.map(&frame).is_none());
    }

    #[test]
    fn test_low_visibility_treated_as_missing() {
        let mut head = HeadMapper::new(0.01, 0.5);
        let mut pose = pose_with(&[]);
        pose[0].visibility = 0.2;
        let frame = HolisticFrame {
            pose_landmarks: Some(pose),
            ..Default::default()
        };
        assert!(head.map(&frame).is_none());
    }

    #[test]
    fn test_repeated_frame_is_suppressed() {
        let mut head = HeadMapper::new(0.01, 0.0);
        let frame = HolisticFrame {
            pose_landmarks: Some(pose_with(&[(PoseLandmark::Nose, (0.4, 0.4))])),
            ..Default::default()
        };
        assert!(head.map(&frame).is_some());
        assert!(head.map(&frame).is_none());
        head.reset();
        assert!(head.map(&frame).is_some());
    }

    fn arb_landmark() -> impl Strategy<Value = Landmark> {
        (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(x, y)| Landmark::new(x, y))
    }

    proptest! {
        #[test]
        fn prop_outputs_within_declared_ranges(
            pose in proptest::collection::vec(arb_landmark(), PoseLandmark::COUNT),
            left in arb_landmark(),
            right in arb_landmark(),
        ) {
            let frame = HolisticFrame {
                timestamp_ms: 0,
                pose_landmarks: Some(pose),
                left_hand_landmarks: Some(vec![left]),
                right_hand_landmarks: Some(vec![right]),
            };
            let mut limbs: Vec<Box<dyn LimbMapper>> = vec![
                Box::new(HeadMapper::new(0.01, 0.0)),
                Box::new(ArmMapper::new(Side::Left, 0.01, 0.0)),
                Box::new(ArmMapper::new(Side::Right, 0.01, 0.0)),
                Box::new(LegMapper::new(Side::Left, 0.01, 0.0)),
                Box::new(LegMapper::new(Side::Right, 0.01, 0.0)),
            ];
            for limb in limbs.iter_mut() {
                let specs = limb.joint_specs();
                let update = limb.map(&frame);
                prop_assert!(update.is_some());
                for (name, angle) in update.unwrap().iter() {
                    let spec = specs.iter().find(|s| s.name == name).unwrap();
                    prop_assert!(spec.contains(angle), "{} = {} outside {:?}", name, angle, spec);
                }
            }
        }

        #[test]
        fn prop_gate_suppresses_iff_within_threshold(
            prev in -3.0f64..3.0,
            delta in -0.05f64..0.05,
        ) {
            // Keep clear of the exact boundary where float rounding decides
            prop_assume!((delta.abs() - 0.01).abs() > 1e-9);
            let mut gate = ChangeGate::new(0.01);
            prop_assert!(gate.admit(&[prev]));
            let emitted = gate.admit(&[prev + delta]);
            prop_assert_eq!(emitted, delta.abs() > 0.01);
        }
    }
}
