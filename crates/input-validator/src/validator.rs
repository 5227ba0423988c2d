//! Request Validator for Range Checking

use crate::error::ValidationError;
use pose_frame::{FrameExtraction, VideoHandle};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Frame rate valid range (fps)
    pub frame_rate_range: (f64, f64),
    /// Max frames valid range
    pub max_frames_range: (f64, f64),
    /// Longest time window that may be requested (seconds)
    pub max_window_s: f64,
    /// Longest accepted video identifier
    pub max_video_id_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            frame_rate_range: (1.0, 120.0),
            max_frames_range: (1.0, 1800.0),
            max_window_s: 600.0,
            max_video_id_len: 256,
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }
}

/// Validator for analysis requests
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() || value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate the video identifier
    pub fn validate_video(&self, video: &VideoHandle) -> Result<(), ValidationError> {
        let id = video.video_id.trim();
        if id.is_empty() {
            return Err(ValidationError::MissingField("video_id"));
        }
        if id.len() > self.config.max_video_id_len {
            return Err(ValidationError::InvalidFormat(format!(
                "video_id longer than {} characters",
                self.config.max_video_id_len
            )));
        }
        if id.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFormat(
                "video_id contains control characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate frame rate
    pub fn validate_frame_rate(&self, frame_rate: f64) -> Result<(), ValidationError> {
        self.validate_range("frame_rate", frame_rate, self.config.frame_rate_range)
    }

    /// Validate max frames
    pub fn validate_max_frames(&self, max_frames: u32) -> Result<(), ValidationError> {
        self.validate_range("max_frames", max_frames as f64, self.config.max_frames_range)
    }

    /// Validate the optional time window
    pub fn validate_window(&self, start: Option<f64>, end: Option<f64>) -> Result<(), ValidationError> {
        if let Some(start) = start {
            self.validate_range("start_time", start, (0.0, f64::MAX))?;
        }
        if let Some(end) = end {
            self.validate_range("end_time", end, (0.0, f64::MAX))?;
        }
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(ValidationError::InvalidWindow { start, end });
            }
            self.validate_range("time_window", end - start, (0.0, self.config.max_window_s))?;
        }
        Ok(())
    }

    /// Validate a whole request, collecting every problem
    pub fn validate(&self, video: &VideoHandle, extraction: &FrameExtraction) -> ValidationResult {
        let checks = [
            self.validate_video(video),
            self.validate_frame_rate(extraction.frame_rate),
            self.validate_max_frames(extraction.max_frames),
            self.validate_window(extraction.start_time_s, extraction.end_time_s),
        ];
        let fields_checked = checks.len();
        let errors: Vec<ValidationError> = checks.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            debug!("Request for {} failed validation: {:?}", video.video_id, errors);
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let validator = Validator::default();
        let result = validator.validate(&VideoHandle::new("squat-001"), &FrameExtraction::default());
        assert!(result.valid);
        assert_eq!(result.fields_checked, 4);
    }

    #[test]
    fn test_frame_rate_range() {
        let validator = Validator::default();
        assert!(validator.validate_frame_rate(30.0).is_ok());
        assert!(validator.validate_frame_rate(1.0).is_ok());
        assert!(validator.validate_frame_rate(0.0).is_err());
        assert!(validator.validate_frame_rate(240.0).is_err());
        assert!(validator.validate_frame_rate(f64::NAN).is_err());
    }

    #[test]
    fn test_video_id() {
        let validator = Validator::default();
        assert_eq!(
            validator.validate_video(&VideoHandle::new("  ")),
            Err(ValidationError::MissingField("video_id"))
        );
        assert!(validator.validate_video(&VideoHandle::new("bad\nid")).is_err());
        assert!(validator.validate_video(&VideoHandle::new("x".repeat(300))).is_err());
    }

    #[test]
    fn test_window() {
        let validator = Validator::default();
        assert!(validator.validate_window(None, None).is_ok());
        assert!(validator.validate_window(Some(1.0), Some(4.0)).is_ok());
        assert!(matches!(
            validator.validate_window(Some(4.0), Some(1.0)),
            Err(ValidationError::InvalidWindow { .. })
        ));
        assert!(validator.validate_window(Some(-1.0), None).is_err());
        assert!(validator.validate_window(Some(0.0), Some(900.0)).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let validator = Validator::default();
        let extraction = FrameExtraction {
            frame_rate: 0.0,
            max_frames: 0,
            ..Default::default()
        };
        let result = validator.validate(&VideoHandle::new(""), &extraction);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 3);
    }
}
