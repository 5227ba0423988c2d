//! Engine configuration

use form_analysis::AnalyzerConfig;
use form_feedback::FeedbackConfig;
use input_validator::ValidationConfig;
use kinematics::PhaseConfig;
use pose_pipeline::{GateConfig, PerformanceConfig};
use serde::{Deserialize, Serialize};
use storage::HistoryConfig;

use crate::cache::CacheConfig;

/// Every tunable of the analysis engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub performance: PerformanceConfig,
    pub gate: GateConfig,
    pub validation: ValidationConfig,
    pub phases: PhaseConfig,
    pub analyzer: AnalyzerConfig,
    pub feedback: FeedbackConfig,
    pub cache: CacheConfig,
    pub history: HistoryConfig,
}

impl EngineConfig {
    /// Tighter analyzer thresholds, matching error bands and a higher coverage bar
    pub fn strict() -> Self {
        let analyzer = AnalyzerConfig::strict();
        Self {
            feedback: FeedbackConfig::aligned_with(&analyzer),
            analyzer,
            gate: GateConfig {
                min_coverage: 0.9,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Looser analyzer thresholds and matching error bands
    pub fn lenient() -> Self {
        let analyzer = AnalyzerConfig::lenient();
        Self {
            feedback: FeedbackConfig::aligned_with(&analyzer),
            analyzer,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_analysis::FaultKind;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "gate": { "min_coverage": 0.5 }, "cache": { "capacity": 4 } }"#).unwrap();
        assert_eq!(config.gate.min_coverage, 0.5);
        assert_eq!(config.gate.min_frames, 10);
        assert_eq!(config.cache.capacity, 4);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.performance.batch_size, 8);
        assert_eq!(config.history.retention, 1000);
    }

    #[test]
    fn test_presets() {
        assert!(EngineConfig::strict().gate.min_coverage > EngineConfig::default().gate.min_coverage);
        assert_eq!(EngineConfig::lenient().gate.min_coverage, 0.8);
    }

    #[test]
    fn test_presets_flag_what_they_penalize() {
        let strict = EngineConfig::strict();
        let valgus = strict.feedback.bands[&FaultKind::KneeValgus];
        assert_eq!(valgus.low, strict.analyzer.max_knee_valgus);
        assert!(valgus.classify(0.08).is_some());
        assert!(EngineConfig::default().feedback.bands[&FaultKind::KneeValgus].classify(0.08).is_none());

        let lenient = EngineConfig::lenient();
        assert_eq!(
            lenient.feedback.bands[&FaultKind::ExcessiveForwardLean].low,
            lenient.analyzer.max_forward_lean
        );
    }
}
