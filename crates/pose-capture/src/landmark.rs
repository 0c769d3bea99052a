//! Landmark types produced by the holistic detector

use serde::{Deserialize, Serialize};

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Joint name prefix letter used by humanoid URDFs (`L`/`R`)
    pub fn prefix(&self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
        }
    }
}

/// A single tracked keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized X coordinate (0.0 - 1.0)
    pub x: f64,
    /// Normalized Y coordinate (0.0 - 1.0, grows downwards)
    pub y: f64,
    /// Relative depth
    #[serde(default)]
    pub z: f64,
    /// Detector visibility score (0.0 - 1.0)
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

fn default_visibility() -> f64 {
    1.0
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }

    /// Both planar coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pose landmark indices (33-point holistic body model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    pub fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftShoulder,
            Side::Right => Self::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftElbow,
            Side::Right => Self::RightElbow,
        }
    }

    pub fn hip(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftHip,
            Side::Right => Self::RightHip,
        }
    }

    pub fn knee(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftKnee,
            Side::Right => Self::RightKnee,
        }
    }

    pub fn ankle(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftAnkle,
            Side::Right => Self::RightAnkle,
        }
    }

    pub fn foot_index(side: Side) -> Self {
        match side {
            Side::Left => Self::LeftFootIndex,
            Side::Right => Self::RightFootIndex,
        }
    }
}

/// Hand landmark indices (21-point hand model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbTip = 4,
    IndexTip = 8,
    MiddleTip = 12,
    RingTip = 16,
    PinkyTip = 20,
}

impl HandLandmark {
    pub const COUNT: usize = 21;
}

/// One detector result: every group is optional (out of frame, occluded)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolisticFrame {
    /// Detector timestamp (milliseconds)
    #[serde(default)]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub pose_landmarks: Option<Vec<Landmark>>,
    #[serde(default)]
    pub left_hand_landmarks: Option<Vec<Landmark>>,
    #[serde(default)]
    pub right_hand_landmarks: Option<Vec<Landmark>>,
}

impl HolisticFrame {
    /// Whether the body was tracked in this frame
    pub fn has_pose(&self) -> bool {
        self.pose_landmarks.is_some()
    }

    /// Pose landmark by index; `None` if absent or non-finite
    pub fn pose(&self, index: PoseLandmark) -> Option<&Landmark> {
        self.pose_landmarks
            .as_ref()
            .and_then(|points| points.get(index as usize))
            .filter(|lm| lm.is_finite())
    }

    /// Hand landmark by side and index; `None` if absent or non-finite
    pub fn hand(&self, side: Side, index: HandLandmark) -> Option<&Landmark> {
        let points = match side {
            Side::Left => self.left_hand_landmarks.as_ref(),
            Side::Right => self.right_hand_landmarks.as_ref(),
        };
        points
            .and_then(|points| points.get(index as usize))
            .filter(|lm| lm.is_finite())
    }

    /// Number of visible landmark groups (pose, left hand, right hand)
    pub fn tracked_groups(&self) -> usize {
        [
            self.pose_landmarks.is_some(),
            self.left_hand_landmarks.is_some(),
            self.right_hand_landmarks.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
    }
}
