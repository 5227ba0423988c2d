//! Joint Angle Calculator
//!
//! Pure geometry over one pose frame. Every angle is the interior angle at a
//! vertex landmark in degrees; values outside the plausible anatomical range
//! are clamped and the joint is recorded in [`JointAngles::clamped`].

use pose_frame::{BodyPart, Landmark, PoseFrame};
use serde::Serialize;

/// Named joint angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftKnee,
    RightKnee,
    LeftHip,
    RightHip,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    SpinalAlignment,
}

impl Joint {
    /// Plausible anatomical range (degrees)
    pub fn range(self) -> (f64, f64) {
        match self {
            Joint::LeftKnee | Joint::RightKnee => (25.0, 180.0),
            Joint::LeftHip | Joint::RightHip => (30.0, 180.0),
            Joint::LeftElbow | Joint::RightElbow => (20.0, 180.0),
            Joint::LeftShoulder | Joint::RightShoulder => (0.0, 180.0),
            Joint::SpinalAlignment => (0.0, 90.0),
        }
    }

    /// Value reported when the landmarks are degenerate (coincident or non-finite points)
    fn neutral(self) -> f64 {
        match self {
            Joint::SpinalAlignment => 0.0,
            _ => self.range().1,
        }
    }
}

/// Per-frame joint geometry (degrees)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointAngles {
    pub left_knee: f64,
    pub right_knee: f64,
    pub left_hip: f64,
    pub right_hip: f64,
    pub left_shoulder: f64,
    pub right_shoulder: f64,
    pub left_elbow: f64,
    pub right_elbow: f64,
    /// Deviation of the hip-to-shoulder line from vertical
    pub spinal_alignment: f64,
    /// Joints whose raw value was out of range or degenerate
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clamped: Vec<Joint>,
}

impl JointAngles {
    pub fn get(&self, joint: Joint) -> f64 {
        match joint {
            Joint::LeftKnee => self.left_knee,
            Joint::RightKnee => self.right_knee,
            Joint::LeftHip => self.left_hip,
            Joint::RightHip => self.right_hip,
            Joint::LeftShoulder => self.left_shoulder,
            Joint::RightShoulder => self.right_shoulder,
            Joint::LeftElbow => self.left_elbow,
            Joint::RightElbow => self.right_elbow,
            Joint::SpinalAlignment => self.spinal_alignment,
        }
    }

    pub fn mean_hip(&self) -> f64 {
        (self.left_hip + self.right_hip) / 2.0
    }

    pub fn mean_knee(&self) -> f64 {
        (self.left_knee + self.right_knee) / 2.0
    }

    /// The more flexed of the two knees
    pub fn min_knee(&self) -> f64 {
        self.left_knee.min(self.right_knee)
    }

    pub fn is_clamped(&self, joint: Joint) -> bool {
        self.clamped.contains(&joint)
    }
}

/// Interior angle at `vertex` formed by `a` and `c`, in degrees.
///
/// Returns `None` when either arm has zero length.
pub fn angle_at(a: &Landmark, vertex: &Landmark, c: &Landmark) -> Option<f64> {
    let (vx, vy) = vertex.point();
    let (ax, ay) = (a.point().0 - vx, a.point().1 - vy);
    let (cx, cy) = (c.point().0 - vx, c.point().1 - vy);

    let norm = (ax * ax + ay * ay).sqrt() * (cx * cx + cy * cy).sqrt();
    if norm < f64::EPSILON {
        return None;
    }
    let cos = ((ax * cx + ay * cy) / norm).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Angle of the segment from `lower` to `upper` relative to image vertical
fn deviation_from_vertical(lower: &Landmark, upper: &Landmark) -> Option<f64> {
    let (lx, ly) = lower.point();
    let (ux, uy) = upper.point();
    let (dx, dy) = (ux - lx, uy - ly);
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return None;
    }
    // Up is -y in image coordinates
    Some((-dy / len).clamp(-1.0, 1.0).acos().to_degrees())
}

struct Clamp {
    clamped: Vec<Joint>,
}

impl Clamp {
    fn apply(&mut self, joint: Joint, raw: Option<f64>) -> f64 {
        let (min, max) = joint.range();
        match raw {
            Some(value) if !value.is_finite() => {
                self.clamped.push(joint);
                joint.neutral()
            }
            Some(value) if value < min || value > max => {
                self.clamped.push(joint);
                value.clamp(min, max)
            }
            Some(value) => value,
            None => {
                self.clamped.push(joint);
                joint.neutral()
            }
        }
    }
}

/// Compute all joint angles of one frame
pub fn compute_joint_angles(frame: &PoseFrame) -> JointAngles {
    let lm = |part: BodyPart| frame.landmark(part);
    let mut clamp = Clamp { clamped: Vec::new() };

    let left_knee = clamp.apply(
        Joint::LeftKnee,
        angle_at(lm(BodyPart::LeftHip), lm(BodyPart::LeftKnee), lm(BodyPart::LeftAnkle)),
    );
    let right_knee = clamp.apply(
        Joint::RightKnee,
        angle_at(lm(BodyPart::RightHip), lm(BodyPart::RightKnee), lm(BodyPart::RightAnkle)),
    );
    let left_hip = clamp.apply(
        Joint::LeftHip,
        angle_at(lm(BodyPart::LeftShoulder), lm(BodyPart::LeftHip), lm(BodyPart::LeftKnee)),
    );
    let right_hip = clamp.apply(
        Joint::RightHip,
        angle_at(lm(BodyPart::RightShoulder), lm(BodyPart::RightHip), lm(BodyPart::RightKnee)),
    );
    let left_shoulder = clamp.apply(
        Joint::LeftShoulder,
        angle_at(lm(BodyPart::LeftHip), lm(BodyPart::LeftShoulder), lm(BodyPart::LeftElbow)),
    );
    let right_shoulder = clamp.apply(
        Joint::RightShoulder,
        angle_at(lm(BodyPart::RightHip), lm(BodyPart::RightShoulder), lm(BodyPart::RightElbow)),
    );
    let left_elbow = clamp.apply(
        Joint::LeftElbow,
        angle_at(lm(BodyPart::LeftShoulder), lm(BodyPart::LeftElbow), lm(BodyPart::LeftWrist)),
    );
    let right_elbow = clamp.apply(
        Joint::RightElbow,
        angle_at(lm(BodyPart::RightShoulder), lm(BodyPart::RightElbow), lm(BodyPart::RightWrist)),
    );
    let spinal_alignment = clamp.apply(
        Joint::SpinalAlignment,
        deviation_from_vertical(&frame.hip_midpoint(), &frame.shoulder_midpoint()),
    );

    JointAngles {
        left_knee,
        right_knee,
        left_hip,
        right_hip,
        left_shoulder,
        right_shoulder,
        left_elbow,
        right_elbow,
        spinal_alignment,
        clamped: clamp.clamped,
    }
}
