//! Analysis request options and results

use std::fmt;

use form_analysis::{MovementMetrics, MovementType, SubScores};
use form_feedback::{FormError, FormSuggestion, ScoreBreakdown};
use kinematics::{JointAngles, MovementPhase};
use pose_frame::{FrameExtraction, VideoHandle};
use pose_pipeline::ConfidenceMetrics;
use serde::{Deserialize, Serialize};

/// Per-request options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub frame_extraction: FrameExtraction,
    /// Append a record to the history store on success
    pub save_to_history: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            frame_extraction: FrameExtraction::default(),
            save_to_history: true,
        }
    }
}

/// Cache and de-duplication key for a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(video: &VideoHandle, movement: MovementType) -> Self {
        Self::from_parts(video, movement.as_str())
    }

    /// Key for a movement name that may not parse.
    ///
    /// User and video ids are escaped so neither can contain a separator;
    /// the first `:` always ends the identity part and a `/` before it
    /// always marks an owned video.
    pub fn from_parts(video: &VideoHandle, movement: &str) -> Self {
        let movement = movement.trim().to_ascii_lowercase();
        let video_id = escape(&video.video_id);
        match &video.user_id {
            Some(user) => Self(format!("{}/{}:{}", escape(user), video_id, movement)),
            None => Self(format!("{}:{}", video_id, movement)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn escape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            ':' => out.push_str("%3A"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    VideoValidationFailed,
    InsufficientFrames,
    InsufficientPoseCoverage,
    PoseDetectionFailed,
    UnsupportedMovementType,
    NotImplemented,
    /// The computation task panicked
    Internal,
}

impl AnalysisErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisErrorKind::VideoValidationFailed => "video_validation_failed",
            AnalysisErrorKind::InsufficientFrames => "insufficient_frames",
            AnalysisErrorKind::InsufficientPoseCoverage => "insufficient_pose_coverage",
            AnalysisErrorKind::PoseDetectionFailed => "pose_detection_failed",
            AnalysisErrorKind::UnsupportedMovementType => "unsupported_movement_type",
            AnalysisErrorKind::NotImplemented => "not_implemented",
            AnalysisErrorKind::Internal => "internal",
        }
    }
}

/// One entry in a failed result's error list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisIssue {
    pub kind: AnalysisErrorKind,
    pub message: String,
    /// Resubmitting the request may succeed
    pub recoverable: bool,
}

impl AnalysisIssue {
    pub fn fatal(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recoverable: false,
        }
    }

    pub fn recoverable(kind: AnalysisErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recoverable: true,
        }
    }
}

/// Scored, explainable assessment of one movement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormAnalysis {
    pub movement: MovementType,
    pub overall_score: u8,
    pub breakdown: ScoreBreakdown,
    pub sub_scores: SubScores,
    pub metrics: MovementMetrics,
    pub phases: Vec<MovementPhase>,
    pub repetitions: u32,
    /// One record per analyzed frame
    pub joint_angles: Vec<JointAngles>,
    pub errors: Vec<FormError>,
    pub suggestions: Vec<FormSuggestion>,
}

/// Outcome of an analysis request. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub fingerprint: Fingerprint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<FormAnalysis>,
    pub errors: Vec<AnalysisIssue>,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
    /// Frames sent to the pose detector
    pub frames_processed: usize,
    pub confidence: ConfidenceMetrics,
}

impl AnalysisResult {
    /// Failed result with zeroed confidence
    pub fn failed(
        fingerprint: Fingerprint,
        errors: Vec<AnalysisIssue>,
        frames_processed: usize,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: false,
            fingerprint,
            analysis: None,
            errors,
            warnings: Vec::new(),
            processing_time_ms,
            frames_processed,
            confidence: ConfidenceMetrics::zeroed(),
        }
    }

    pub fn overall_score(&self) -> Option<u8> {
        self.analysis.as_ref().map(|a| a.overall_score)
    }

    pub fn has_error(&self, kind: AnalysisErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let video = VideoHandle::new("clip-1");
        assert_eq!(
            Fingerprint::new(&video, MovementType::Squat),
            Fingerprint::new(&video, MovementType::Squat)
        );
        assert_ne!(
            Fingerprint::new(&video, MovementType::Squat),
            Fingerprint::new(&video, MovementType::Lunge)
        );
        assert_eq!(Fingerprint::new(&video, MovementType::Squat).as_str(), "clip-1:squat");
    }

    #[test]
    fn test_fingerprint_separates_users() {
        let a = VideoHandle::new("clip-1").with_user("ana");
        let b = VideoHandle::new("clip-1").with_user("ben");
        assert_ne!(
            Fingerprint::new(&a, MovementType::Squat),
            Fingerprint::new(&b, MovementType::Squat)
        );
        assert_eq!(Fingerprint::from_parts(&a, " Squat ").as_str(), "ana/clip-1:squat");
    }

    #[test]
    fn test_fingerprint_owner_cannot_be_forged_through_video_id() {
        let owned = VideoHandle::new("clip-1").with_user("ana");
        let anonymous = VideoHandle::new("ana/clip-1");
        assert_ne!(
            Fingerprint::new(&owned, MovementType::Squat),
            Fingerprint::new(&anonymous, MovementType::Squat)
        );
        assert_eq!(Fingerprint::new(&anonymous, MovementType::Squat).as_str(), "ana%2Fclip-1:squat");

        let colon_user = VideoHandle::new("b").with_user("a:x");
        let colon_video = VideoHandle::new("x/b").with_user("a");
        assert_ne!(
            Fingerprint::new(&colon_user, MovementType::Squat),
            Fingerprint::new(&colon_video, MovementType::Squat)
        );

        let escaped = VideoHandle::new("ana%2Fclip-1");
        assert_ne!(
            Fingerprint::new(&escaped, MovementType::Squat),
            Fingerprint::new(&anonymous, MovementType::Squat)
        );
    }

    #[test]
    fn test_failed_result_shape() {
        let result = AnalysisResult::failed(
            Fingerprint::new(&VideoHandle::new("v"), MovementType::Squat),
            vec![AnalysisIssue::fatal(AnalysisErrorKind::InsufficientFrames, "no frames")],
            0,
            3,
        );
        assert!(!result.success);
        assert!(result.has_error(AnalysisErrorKind::InsufficientFrames));
        assert_eq!(result.overall_score(), None);
        assert_eq!(result.confidence.frame_coverage, 0.0);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["errors"][0]["kind"], "insufficient_frames");
        assert_eq!(json["fingerprint"], "v:squat");
        assert!(json.get("analysis").is_none());
    }
}
