//! Movement types and their phase layouts

use std::fmt;
use std::str::FromStr;

use kinematics::{PhaseKind, ReferencePoint, Segmentation};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Enumerated movement identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Squat,
    Lunge,
    PushUp,
    Deadlift,
    BaseballPitch,
    GolfSwing,
    TennisServe,
}

/// Broad grouping used for suggestion wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementFamily {
    Strength,
    Sport,
}

const BASEBALL_PITCH: &[(PhaseKind, f64)] = &[
    (PhaseKind::Windup, 0.25),
    (PhaseKind::Stride, 0.20),
    (PhaseKind::ArmCocking, 0.20),
    (PhaseKind::Acceleration, 0.10),
    (PhaseKind::Deceleration, 0.10),
    (PhaseKind::FollowThrough, 0.15),
];

const GOLF_SWING: &[(PhaseKind, f64)] = &[
    (PhaseKind::Address, 0.10),
    (PhaseKind::Backswing, 0.30),
    (PhaseKind::Downswing, 0.15),
    (PhaseKind::Impact, 0.05),
    (PhaseKind::FollowThrough, 0.40),
];

const TENNIS_SERVE: &[(PhaseKind, f64)] = &[
    (PhaseKind::Windup, 0.35),
    (PhaseKind::ArmCocking, 0.25),
    (PhaseKind::Acceleration, 0.15),
    (PhaseKind::FollowThrough, 0.25),
];

impl MovementType {
    pub const ALL: [MovementType; 7] = [
        MovementType::Squat,
        MovementType::Lunge,
        MovementType::PushUp,
        MovementType::Deadlift,
        MovementType::BaseballPitch,
        MovementType::GolfSwing,
        MovementType::TennisServe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Squat => "squat",
            MovementType::Lunge => "lunge",
            MovementType::PushUp => "push_up",
            MovementType::Deadlift => "deadlift",
            MovementType::BaseballPitch => "baseball_pitch",
            MovementType::GolfSwing => "golf_swing",
            MovementType::TennisServe => "tennis_serve",
        }
    }

    pub fn family(&self) -> MovementFamily {
        match self {
            MovementType::Squat | MovementType::Lunge | MovementType::PushUp | MovementType::Deadlift => {
                MovementFamily::Strength
            }
            MovementType::BaseballPitch | MovementType::GolfSwing | MovementType::TennisServe => {
                MovementFamily::Sport
            }
        }
    }

    /// Phase layout used by the segmenter
    pub fn segmentation(&self) -> Segmentation {
        match self {
            MovementType::Squat | MovementType::Lunge | MovementType::Deadlift => {
                Segmentation::Velocity(ReferencePoint::HipMidpoint)
            }
            MovementType::PushUp => Segmentation::Velocity(ReferencePoint::ShoulderMidpoint),
            MovementType::BaseballPitch => Segmentation::Proportional(BASEBALL_PITCH),
            MovementType::GolfSwing => Segmentation::Proportional(GOLF_SWING),
            MovementType::TennisServe => Segmentation::Proportional(TENNIS_SERVE),
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = AnalysisError;

    /// Accepts snake_case, kebab-case, spaced or camelCase names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        MovementType::ALL
            .into_iter()
            .find(|m| m.as_str().replace('_', "") == normalized)
            .ok_or_else(|| AnalysisError::UnsupportedMovementType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("squat".parse::<MovementType>().unwrap(), MovementType::Squat);
        assert_eq!("baseball_pitch".parse::<MovementType>().unwrap(), MovementType::BaseballPitch);
        assert_eq!("pushUp".parse::<MovementType>().unwrap(), MovementType::PushUp);
        assert_eq!("Golf Swing".parse::<MovementType>().unwrap(), MovementType::GolfSwing);
        assert!(matches!(
            "cartwheel".parse::<MovementType>(),
            Err(AnalysisError::UnsupportedMovementType(name)) if name == "cartwheel"
        ));
    }

    #[test]
    fn test_round_trip_names() {
        for movement in MovementType::ALL {
            assert_eq!(movement.as_str().parse::<MovementType>().unwrap(), movement);
        }
    }

    #[test]
    fn test_proportional_layouts_are_valid() {
        for movement in MovementType::ALL {
            assert!(movement.segmentation().validate().is_ok(), "{movement}");
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(MovementType::Deadlift.family(), MovementFamily::Strength);
        assert_eq!(MovementType::TennisServe.family(), MovementFamily::Sport);
    }

    proptest! {
        #[test]
        fn prop_decorated_names_parse(
            index in 0..MovementType::ALL.len(),
            separator in prop::sample::select(vec!["_", "-", " ", ""]),
            upper in any::<bool>(),
            padding in "[ ]{0,3}",
        ) {
            let movement = MovementType::ALL[index];
            let mut name = movement.as_str().replace('_', separator);
            if upper {
                name = name.to_ascii_uppercase();
            }
            let decorated = format!("{padding}{name}{padding}");
            prop_assert_eq!(decorated.parse::<MovementType>().unwrap(), movement);
        }
    }
}
