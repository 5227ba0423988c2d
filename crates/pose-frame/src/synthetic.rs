//! Deterministic synthetic poses
//!
//! Builds a full 33-landmark skeleton from a handful of segment angles so
//! that tests and mock mode can produce poses with known joint angles.
//! Angles are in degrees; "forward" is +x and the image y axis grows downward.
//!
//! With thigh angle `t` (from straight down) and torso angle `s` (from
//! vertical) the hip angle is `180 - (t + s)`; with shin angle `k` the knee
//! angle is `180 - |t + k|`.

use crate::frame::PoseFrame;
use crate::landmark::{BodyPart, BodyRegion, Landmark, LANDMARK_COUNT};

/// Leg segment angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPose {
    /// Thigh angle from straight down, positive forward
    pub thigh_deg: f64,
    /// Shin angle from straight down, positive when the ankle sits behind the knee
    pub shin_deg: f64,
}

impl LegPose {
    pub fn new(thigh_deg: f64, shin_deg: f64) -> Self {
        Self { thigh_deg, shin_deg }
    }

    pub fn straight() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Parametric skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPose {
    /// Hip midpoint
    pub hip_x: f64,
    pub hip_y: f64,
    /// Torso lean from vertical, positive forward
    pub torso_deg: f64,
    pub left_leg: LegPose,
    pub right_leg: LegPose,
    /// Upper arm angle from straight down (90 = horizontal forward)
    pub upper_arm_deg: f64,
    /// Forearm angle from straight down
    pub forearm_deg: f64,
    /// Half the lateral distance between left and right joints
    pub half_width: f64,
    /// How far each knee is pulled toward the midline
    pub knee_inward: f64,
    /// Landmark confidence
    pub confidence: f32,
    /// Confidence overrides per region
    pub region_confidence: Vec<(BodyRegion, f32)>,
}

const TORSO: f64 = 0.30;
const THIGH: f64 = 0.20;
const SHIN: f64 = 0.20;
const UPPER_ARM: f64 = 0.14;
const FOREARM: f64 = 0.12;
const NECK: f64 = 0.10;

impl Default for SyntheticPose {
    fn default() -> Self {
        Self {
            hip_x: 0.5,
            hip_y: 0.5,
            torso_deg: 5.0,
            left_leg: LegPose::straight(),
            right_leg: LegPose::straight(),
            upper_arm_deg: 0.0,
            forearm_deg: 0.0,
            half_width: 0.06,
            knee_inward: 0.0,
            confidence: 0.9,
            region_confidence: Vec::new(),
        }
    }
}

fn offset(origin: (f64, f64), length: f64, deg_from_down: f64) -> (f64, f64) {
    let rad = deg_from_down.to_radians();
    (origin.0 + length * rad.sin(), origin.1 + length * rad.cos())
}

impl SyntheticPose {
    /// Standing pose with the hip midpoint at `hip_y`
    pub fn standing(hip_y: f64) -> Self {
        Self {
            hip_y,
            ..Default::default()
        }
    }

    /// Symmetric squat pose: both thighs at `thigh_deg`, shins matching so the
    /// ankles stay under the hips
    pub fn squat(hip_y: f64, thigh_deg: f64, torso_deg: f64) -> Self {
        Self {
            hip_y,
            torso_deg,
            left_leg: LegPose::new(thigh_deg, thigh_deg),
            right_leg: LegPose::new(thigh_deg, thigh_deg),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_region_confidence(mut self, region: BodyRegion, confidence: f32) -> Self {
        self.region_confidence.push((region, confidence));
        self
    }

    pub fn with_arms(mut self, upper_arm_deg: f64, forearm_deg: f64) -> Self {
        self.upper_arm_deg = upper_arm_deg;
        self.forearm_deg = forearm_deg;
        self
    }

    pub fn with_knee_inward(mut self, knee_inward: f64) -> Self {
        self.knee_inward = knee_inward;
        self
    }

    /// Expected hip angle for the left side
    pub fn hip_angle(&self) -> f64 {
        180.0 - (self.left_leg.thigh_deg + self.torso_deg).abs()
    }

    /// Expected knee angle for the left side
    pub fn knee_angle(&self) -> f64 {
        180.0 - (self.left_leg.thigh_deg + self.left_leg.shin_deg).abs()
    }

    fn confidence_for(&self, part: BodyPart) -> f32 {
        self.region_confidence
            .iter()
            .rev()
            .find(|(region, _)| *region == part.region())
            .map(|(_, c)| *c)
            .unwrap_or(self.confidence)
    }

    /// Place all 33 landmarks
    pub fn landmarks(&self) -> [Landmark; LANDMARK_COUNT] {
        let mut points = [(0.0f64, 0.0f64); LANDMARK_COUNT];
        let mut set = |part: BodyPart, p: (f64, f64)| points[part.index()] = p;

        let hip_mid = (self.hip_x, self.hip_y);
        let shoulder_mid = offset(hip_mid, TORSO, 180.0 - self.torso_deg);
        let head = offset(shoulder_mid, NECK, 180.0 - self.torso_deg);

        for (sign, leg, hip, knee, ankle, heel, toe) in [
            (
                -1.0,
                self.left_leg,
                BodyPart::LeftHip,
                BodyPart::LeftKnee,
                BodyPart::LeftAnkle,
                BodyPart::LeftHeel,
                BodyPart::LeftFootIndex,
            ),
            (
                1.0,
                self.right_leg,
                BodyPart::RightHip,
                BodyPart::RightKnee,
                BodyPart::RightAnkle,
                BodyPart::RightHeel,
                BodyPart::RightFootIndex,
            ),
        ] {
            let hip_p = (hip_mid.0 + sign * self.half_width, hip_mid.1);
            let knee_p = offset(hip_p, THIGH, leg.thigh_deg);
            let knee_p = (knee_p.0 - sign * self.knee_inward, knee_p.1);
            let ankle_p = offset(hip_p, THIGH, leg.thigh_deg);
            let ankle_p = offset(ankle_p, SHIN, -leg.shin_deg);
            set(hip, hip_p);
            set(knee, knee_p);
            set(ankle, ankle_p);
            set(heel, (ankle_p.0 - 0.02, ankle_p.1 + 0.01));
            set(toe, (ankle_p.0 + 0.05, ankle_p.1 + 0.01));
        }

        for (sign, shoulder, elbow, wrist, pinky, index, thumb) in [
            (
                -1.0,
                BodyPart::LeftShoulder,
                BodyPart::LeftElbow,
                BodyPart::LeftWrist,
                BodyPart::LeftPinky,
                BodyPart::LeftIndex,
                BodyPart::LeftThumb,
            ),
            (
                1.0,
                BodyPart::RightShoulder,
                BodyPart::RightElbow,
                BodyPart::RightWrist,
                BodyPart::RightPinky,
                BodyPart::RightIndex,
                BodyPart::RightThumb,
            ),
        ] {
            let shoulder_p = (shoulder_mid.0 + sign * self.half_width, shoulder_mid.1);
            let elbow_p = offset(shoulder_p, UPPER_ARM, self.upper_arm_deg);
            let wrist_p = offset(elbow_p, FOREARM, self.forearm_deg);
            set(shoulder, shoulder_p);
            set(elbow, elbow_p);
            set(wrist, wrist_p);
            set(pinky, offset(wrist_p, 0.03, self.forearm_deg - 10.0));
            set(index, offset(wrist_p, 0.035, self.forearm_deg));
            set(thumb, offset(wrist_p, 0.025, self.forearm_deg + 15.0));
        }

        set(BodyPart::Nose, (head.0 + 0.02, head.1));
        set(BodyPart::LeftEyeInner, (head.0 + 0.01, head.1 - 0.02));
        set(BodyPart::LeftEye, (head.0, head.1 - 0.02));
        set(BodyPart::LeftEyeOuter, (head.0 - 0.01, head.1 - 0.02));
        set(BodyPart::RightEyeInner, (head.0 + 0.03, head.1 - 0.02));
        set(BodyPart::RightEye, (head.0 + 0.04, head.1 - 0.02));
        set(BodyPart::RightEyeOuter, (head.0 + 0.05, head.1 - 0.02));
        set(BodyPart::LeftEar, (head.0 - 0.03, head.1 - 0.01));
        set(BodyPart::RightEar, (head.0 + 0.06, head.1 - 0.01));
        set(BodyPart::MouthLeft, (head.0 + 0.01, head.1 + 0.02));
        set(BodyPart::MouthRight, (head.0 + 0.03, head.1 + 0.02));

        BodyPart::ALL.map(|part| {
            let (x, y) = points[part.index()];
            Landmark::new(x as f32, y as f32, self.confidence_for(part))
        })
    }

    /// Pose frame at the given time
    pub fn frame(&self, timestamp_ms: u64, frame_index: u32) -> PoseFrame {
        PoseFrame::from_array(self.landmarks(), timestamp_ms, frame_index)
    }
}
