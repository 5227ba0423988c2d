//! Analyzer configuration

use serde::{Deserialize, Serialize};

/// Thresholds used by the movement analyzers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Hip angle at or below which a squat counts as parallel (degrees)
    pub squat_depth_hip_angle: f64,

    /// Front knee angle a lunge should reach (degrees)
    pub lunge_depth_knee_angle: f64,

    /// Sub-score points lost per degree short of the depth target
    pub depth_points_per_degree: f64,

    /// Allowed knee valgus (fraction of ankle separation)
    pub max_knee_valgus: f64,

    /// Allowed forward lean of the trunk (degrees from vertical)
    pub max_forward_lean: f64,

    /// Normalized hip-over-ankle shift still considered centered
    pub balance_tolerance: f64,

    /// Allowed standard deviation of the hip midpoint x position
    pub max_sway: f64,

    /// Ideal descent:ascent duration ratio for squats
    pub squat_tempo_ratio: f64,

    /// Ideal descent:ascent duration ratio for lunges
    pub lunge_tempo_ratio: f64,

    /// Accepted descent duration per repetition (milliseconds)
    pub descent_band_ms: (u64, u64),

    /// Accepted ascent duration per repetition (milliseconds)
    pub ascent_band_ms: (u64, u64),

    /// Longest acceptable pause at the bottom (milliseconds)
    pub max_bottom_ms: u64,

    /// Target stride length as a fraction of body height
    pub stride_target: f64,

    /// Elbow height above the shoulder that counts as a high elbow
    pub elbow_height_margin: f64,

    /// Allowed trunk tilt during a pitch (degrees)
    pub max_trunk_tilt: f64,

    /// Allowed lead knee flexion after foot plant (degrees)
    pub max_lead_knee_collapse: f64,

    /// Allowed head sway relative to the hips during a pitch
    pub max_head_sway: f64,

    /// Accepted total delivery duration (milliseconds)
    pub delivery_band_ms: (u64, u64),
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            squat_depth_hip_angle: 85.0,
            lunge_depth_knee_angle: 95.0,
            depth_points_per_degree: 3.0,
            max_knee_valgus: 0.10,
            max_forward_lean: 45.0,
            balance_tolerance: 0.15,
            max_sway: 0.02,
            squat_tempo_ratio: 2.0,
            lunge_tempo_ratio: 1.5,
            descent_band_ms: (800, 4000),
            ascent_band_ms: (500, 3000),
            max_bottom_ms: 3000,
            stride_target: 0.8,
            elbow_height_margin: 0.02,
            max_trunk_tilt: 60.0,
            max_lead_knee_collapse: 20.0,
            max_head_sway: 0.03,
            delivery_band_ms: (700, 2500),
        }
    }
}

impl AnalyzerConfig {
    /// Create strict config (deeper targets, tighter tolerances)
    pub fn strict() -> Self {
        Self {
            squat_depth_hip_angle: 80.0,
            lunge_depth_knee_angle: 90.0,
            max_knee_valgus: 0.05,
            max_forward_lean: 35.0,
            balance_tolerance: 0.10,
            max_sway: 0.015,
            ..Default::default()
        }
    }

    /// Create lenient config (shallower targets, looser tolerances)
    pub fn lenient() -> Self {
        Self {
            squat_depth_hip_angle: 95.0,
            lunge_depth_knee_angle: 105.0,
            max_knee_valgus: 0.15,
            max_forward_lean: 55.0,
            balance_tolerance: 0.20,
            max_sway: 0.03,
            ..Default::default()
        }
    }
}
