//! Form Analysis
//!
//! Movement-specific analyzers that turn a pose sequence, its per-frame
//! joint angles and its phases into sub-metrics, 0-100 sub-scores and
//! fault observations:
//! - Squat and lunge (velocity-segmented strength movements)
//! - Baseball pitch (proportionally segmented sport movement)
//!
//! Movements without an analyzer resolve to [`AnalysisError::NotImplemented`].

pub mod analyzer;
pub mod config;
mod cyclic;
mod measure;
pub mod metrics;
pub mod movement;
mod pitch;

pub use analyzer::{AnalyzerRegistry, MovementAnalyzer};
pub use config::AnalyzerConfig;
pub use cyclic::CyclicAnalyzer;
pub use metrics::{
    AlignmentMetrics, BalanceMetrics, ConsistencyMetrics, DepthMetrics, FaultKind, MovementAssessment,
    MovementMetrics, Observation, ScoreDimension, SubScores, TempoMetrics, WeightDistribution,
};
pub use movement::{MovementFamily, MovementType};
pub use pitch::PitchAnalyzer;

use kinematics::KinematicsError;
use thiserror::Error;

/// Form analysis error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Unsupported movement type: {0}")]
    UnsupportedMovementType(String),

    #[error("No analyzer is implemented for {0}")]
    NotImplemented(MovementType),

    #[error("Pose sequence is empty")]
    EmptySequence,

    #[error("Expected {frames} joint angle records, got {angles}")]
    AngleCountMismatch { frames: usize, angles: usize },

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),
}
