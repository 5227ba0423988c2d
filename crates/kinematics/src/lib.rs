//! Kinematics Engine
//!
//! Per-frame joint geometry and sequence-level motion analysis:
//! - Joint angles from landmark triplets, clamped to plausible ranges
//! - Signal statistics and median smoothing
//! - Phase segmentation (velocity state machine or proportional windows)

mod angles;
mod filter;
mod phases;
mod statistics;

pub use angles::{angle_at, compute_joint_angles, Joint, JointAngles};
pub use filter::MedianFilter;
pub use phases::{
    MovementPhase, PhaseConfig, PhaseKind, PhaseSegmentation, PhaseSegmenter, ReferencePoint, Segmentation,
};
pub use statistics::SignalStats;

use thiserror::Error;

/// Errors raised while configuring kinematic computations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KinematicsError {
    #[error("Median window must be odd and > 0, got {0}")]
    InvalidWindow(usize),
    #[error("Phase proportions must be positive and sum to 1.0, got {0}")]
    InvalidProportions(f64),
}
