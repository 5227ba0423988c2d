//! Body landmark enumeration and landmark points

use serde::{Deserialize, Serialize};

/// Number of fixed anatomical landmark slots per frame
pub const LANDMARK_COUNT: usize = 33;

/// Fixed landmark slots. The discriminant is the slot index and is
/// referenced by `FormError::affected_landmarks`, so the order must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl BodyPart {
    /// All slots in index order
    pub const ALL: [BodyPart; LANDMARK_COUNT] = [
        BodyPart::Nose,
        BodyPart::LeftEyeInner,
        BodyPart::LeftEye,
        BodyPart::LeftEyeOuter,
        BodyPart::RightEyeInner,
        BodyPart::RightEye,
        BodyPart::RightEyeOuter,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::MouthLeft,
        BodyPart::MouthRight,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftPinky,
        BodyPart::RightPinky,
        BodyPart::LeftIndex,
        BodyPart::RightIndex,
        BodyPart::LeftThumb,
        BodyPart::RightThumb,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
        BodyPart::LeftHeel,
        BodyPart::RightHeel,
        BodyPart::LeftFootIndex,
        BodyPart::RightFootIndex,
    ];

    /// Slot index
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slot for an index, if in range
    pub fn from_index(index: usize) -> Option<BodyPart> {
        Self::ALL.get(index).copied()
    }

    /// Anatomical region this slot belongs to
    pub fn region(self) -> BodyRegion {
        match self.index() {
            0..=10 => BodyRegion::Face,
            11 | 12 | 23 | 24 => BodyRegion::Trunk,
            13 | 15 | 17 | 19 | 21 => BodyRegion::LeftArm,
            14 | 16 | 18 | 20 | 22 => BodyRegion::RightArm,
            _ => BodyRegion::LowerBody,
        }
    }
}

/// Coarse anatomical grouping used for per-region confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Face,
    Trunk,
    LeftArm,
    RightArm,
    LowerBody,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 5] = [
        BodyRegion::Face,
        BodyRegion::Trunk,
        BodyRegion::LeftArm,
        BodyRegion::RightArm,
        BodyRegion::LowerBody,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyRegion::Face => "face",
            BodyRegion::Trunk => "trunk",
            BodyRegion::LeftArm => "left_arm",
            BodyRegion::RightArm => "right_arm",
            BodyRegion::LowerBody => "lower_body",
        }
    }
}

/// One tracked body point in normalized image coordinates (y grows downward)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth estimate, when the detector provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Detection confidence (0-1)
    pub confidence: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Position as f64 pair for geometry
    pub fn point(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// Height above the bottom of the image (1 - y)
    pub fn height(&self) -> f64 {
        1.0 - self.y as f64
    }

    /// Position, depth and confidence are all finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.confidence.is_finite() && self.z.map_or(true, f32::is_finite)
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }

    /// Midpoint of two landmarks, keeping the weaker confidence
    pub fn midpoint(&self, other: &Landmark) -> Landmark {
        Landmark {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: match (self.z, other.z) {
                (Some(a), Some(b)) => Some((a + b) / 2.0),
                _ => None,
            },
            confidence: self.confidence.min(other.confidence),
        }
    }

    pub fn distance_to(&self, other: &Landmark) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_indices_are_stable() {
        assert_eq!(BodyPart::Nose.index(), 0);
        assert_eq!(BodyPart::LeftShoulder.index(), 11);
        assert_eq!(BodyPart::LeftHip.index(), 23);
        assert_eq!(BodyPart::RightKnee.index(), 26);
        assert_eq!(BodyPart::RightFootIndex.index(), 32);
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            assert_eq!(part.index(), i);
            assert_eq!(BodyPart::from_index(i), Some(*part));
        }
        assert_eq!(BodyPart::from_index(LANDMARK_COUNT), None);
    }

    #[test]
    fn test_regions() {
        assert_eq!(BodyPart::RightEar.region(), BodyRegion::Face);
        assert_eq!(BodyPart::LeftHip.region(), BodyRegion::Trunk);
        assert_eq!(BodyPart::LeftThumb.region(), BodyRegion::LeftArm);
        assert_eq!(BodyPart::RightWrist.region(), BodyRegion::RightArm);
        assert_eq!(BodyPart::LeftHeel.region(), BodyRegion::LowerBody);
    }

    #[test]
    fn test_midpoint_and_distance() {
        let a = Landmark::new(0.0, 0.0, 0.9);
        let b = Landmark::new(0.6, 0.8, 0.5);
        let mid = a.midpoint(&b);
        assert!((mid.x - 0.3).abs() < 1e-6);
        assert!((mid.y - 0.4).abs() < 1e-6);
        assert_eq!(mid.confidence, 0.5);
        assert!((a.distance_to(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Landmark::new(0.1, 0.1, 1.7).confidence, 1.0);
        assert_eq!(Landmark::new(0.1, 0.1, -0.2).confidence, 0.0);
    }
}
