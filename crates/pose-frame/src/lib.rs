//! Pose Frame Library for Movement Analysis
//!
//! Shared types for the pose pipeline:
//! - 33-slot body landmark enumeration and landmarks
//! - Per-frame poses and time-ordered pose sequences
//! - Video handles, frame extraction parameters and the frame source seam
//! - A deterministic synthetic pose builder for tests and mock mode

pub mod frame;
pub mod landmark;
pub mod source;
pub mod synthetic;

pub use frame::{FrameHandle, PoseFrame, PoseSequence};
pub use landmark::{BodyPart, BodyRegion, Landmark, LANDMARK_COUNT};
pub use source::{FrameSource, StaticFrameSource};
pub use synthetic::{LegPose, SyntheticPose};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Landmark slot {slot} has a non-finite value")]
    NonFinite { slot: usize },

    #[error("Frame timestamp {next}ms precedes previous frame at {previous}ms")]
    OutOfOrder { previous: u64, next: u64 },

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Frame source failed: {0}")]
    Source(String),
}

/// Opaque identity of the video under analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoHandle {
    /// Video identifier as known by the frame source
    pub video_id: String,
    /// Owner of the video, used to key history records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl VideoHandle {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Extraction quality requested from the frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// Frame sampling parameters handed to the frame source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameExtraction {
    /// Target sampling rate (frames per second)
    pub frame_rate: f64,
    /// Upper bound on extracted frames
    pub max_frames: u32,
    /// Decode quality
    pub quality: ExtractionQuality,
    /// Window start (seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_s: Option<f64>,
    /// Window end (seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_s: Option<f64>,
}

impl Default for FrameExtraction {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            max_frames: 300,
            quality: ExtractionQuality::Medium,
            start_time_s: None,
            end_time_s: None,
        }
    }
}

impl FrameExtraction {
    /// Nominal interval between sampled frames (milliseconds)
    pub fn frame_interval_ms(&self) -> u64 {
        if self.frame_rate <= 0.0 {
            return 0;
        }
        (1000.0 / self.frame_rate).round() as u64
    }
}
