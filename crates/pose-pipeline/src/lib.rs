//! Pose Pipeline
//!
//! Drives a pose detector over sampled frames and judges the result:
//! - `PoseDetector` seam for the external detection model
//! - Frame batch processor with bounded concurrency and per-frame fault tolerance
//! - Confidence evaluator and coverage gate
//! - Deterministic scripted detector for mock mode and tests

mod batch;
mod confidence;
mod detector;
mod scripted;

pub use batch::{BatchOutcome, FrameBatchProcessor, PerformanceConfig};
pub use confidence::{ConfidenceEvaluator, ConfidenceMetrics, GateConfig, QualityIndicator, Reliability};
pub use detector::PoseDetector;
pub use scripted::{squat_cycle_pose, ScriptedDetector};

use pose_frame::FrameError;
use thiserror::Error;

/// Errors from detection and the confidence gate
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No pose found in frame {0}")]
    NoPose(u32),

    #[error("Detection timed out after {0}ms")]
    Timeout(u64),

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Detector panicked: {0}")]
    Panicked(String),

    #[error("Invalid detector output: {0}")]
    Frame(#[from] FrameError),

    #[error("Only {frames} frames with a pose, at least {min} required")]
    InsufficientFrames { frames: usize, min: usize },

    #[error("Pose coverage {coverage:.3} is below the required {min:.3}")]
    InsufficientCoverage { coverage: f64, min: f64 },
}
