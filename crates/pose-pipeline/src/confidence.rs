//! Confidence Evaluator
//!
//! Quality of the detected sequence relative to the frames that were sent
//! to the detector, and the gate that decides whether analysis may proceed.

use std::collections::BTreeMap;

use pose_frame::{BodyPart, BodyRegion, PoseSequence};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::PipelineError;

/// Minimums an analysis must meet before any movement analysis runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Fewest frames with a detected pose
    pub min_frames: usize,
    /// Lowest accepted frame coverage
    pub min_coverage: f64,
    /// Mean confidence below which a warning indicator is raised
    pub low_confidence_warning: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_frames: 10,
            min_coverage: 0.8,
            low_confidence_warning: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    High,
    Medium,
    #[default]
    Low,
}

/// Qualitative notes on detection quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "indicator", content = "region")]
pub enum QualityIndicator {
    LowLandmarkConfidence,
    PartialCoverage,
    WeakRegion(BodyRegion),
}

/// Trust signal for a whole analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfidenceMetrics {
    /// Mean of every landmark confidence in the sequence (0 when empty)
    pub average_landmark_confidence: f64,
    /// Detected frames / frames sent to the detector, in [0, 1]
    pub frame_coverage: f64,
    /// average_landmark_confidence × frame_coverage
    pub composite_reliability: f64,
    pub reliability: Reliability,
    /// Mean confidence per body region
    pub region_confidence: BTreeMap<BodyRegion, f64>,
    pub indicators: Vec<QualityIndicator>,
    pub frames_analyzed: usize,
    pub total_frames: usize,
}

impl ConfidenceMetrics {
    /// All-zero metrics used on failed analyses
    pub fn zeroed() -> Self {
        Self::default()
    }
}

/// Computes confidence metrics and applies the gate
#[derive(Debug, Clone, Default)]
pub struct ConfidenceEvaluator {
    config: GateConfig,
}

impl ConfidenceEvaluator {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Evaluate `sequence` against the number of frames that were sampled
    pub fn evaluate(&self, sequence: &PoseSequence, total_frames: usize) -> ConfidenceMetrics {
        let mut region_sums: BTreeMap<BodyRegion, (f64, usize)> = BTreeMap::new();
        let mut total = 0.0;
        let mut count = 0usize;

        for frame in sequence.iter() {
            for (slot, landmark) in frame.landmarks().iter().enumerate() {
                let confidence = landmark.confidence as f64;
                total += confidence;
                count += 1;
                if let Some(part) = BodyPart::from_index(slot) {
                    let entry = region_sums.entry(part.region()).or_insert((0.0, 0));
                    entry.0 += confidence;
                    entry.1 += 1;
                }
            }
        }

        let average_landmark_confidence = if count == 0 { 0.0 } else { total / count as f64 };
        let frame_coverage = if total_frames == 0 {
            0.0
        } else {
            (sequence.len() as f64 / total_frames as f64).min(1.0)
        };
        let composite_reliability = average_landmark_confidence * frame_coverage;
        let reliability = if composite_reliability >= 0.75 {
            Reliability::High
        } else if composite_reliability >= 0.5 {
            Reliability::Medium
        } else {
            Reliability::Low
        };

        let region_confidence: BTreeMap<BodyRegion, f64> = region_sums
            .into_iter()
            .map(|(region, (sum, n))| (region, sum / n as f64))
            .collect();

        let mut indicators = Vec::new();
        if count > 0 && average_landmark_confidence < self.config.low_confidence_warning {
            indicators.push(QualityIndicator::LowLandmarkConfidence);
        }
        if frame_coverage < 1.0 {
            indicators.push(QualityIndicator::PartialCoverage);
        }
        indicators.extend(
            region_confidence
                .iter()
                .filter(|(_, c)| **c < self.config.low_confidence_warning)
                .map(|(region, _)| QualityIndicator::WeakRegion(*region)),
        );

        debug!(
            "Confidence: avg {:.3}, coverage {:.3} ({}/{}), reliability {:?}",
            average_landmark_confidence,
            frame_coverage,
            sequence.len(),
            total_frames,
            reliability
        );

        ConfidenceMetrics {
            average_landmark_confidence,
            frame_coverage,
            composite_reliability,
            reliability,
            region_confidence,
            indicators,
            frames_analyzed: sequence.len(),
            total_frames,
        }
    }

    /// Frame count is checked before coverage
    pub fn gate(&self, metrics: &ConfidenceMetrics) -> Result<(), PipelineError> {
        if metrics.frames_analyzed < self.config.min_frames {
            return Err(PipelineError::InsufficientFrames {
                frames: metrics.frames_analyzed,
                min: self.config.min_frames,
            });
        }
        if metrics.frame_coverage < self.config.min_coverage {
            return Err(PipelineError::InsufficientCoverage {
                coverage: metrics.frame_coverage,
                min: self.config.min_coverage,
            });
        }
        Ok(())
    }

    /// Human-readable warnings for a result that passed the gate
    pub fn warnings(&self, metrics: &ConfidenceMetrics) -> Vec<String> {
        metrics
            .indicators
            .iter()
            .filter_map(|indicator| match indicator {
                QualityIndicator::LowLandmarkConfidence => Some(format!(
                    "Low average landmark confidence ({:.2})",
                    metrics.average_landmark_confidence
                )),
                QualityIndicator::WeakRegion(region) => Some(format!(
                    "Low detection confidence for {} ({:.2})",
                    region.as_str(),
                    metrics.region_confidence.get(region).copied().unwrap_or(0.0)
                )),
                QualityIndicator::PartialCoverage => None,
            })
            .collect()
    }
}
