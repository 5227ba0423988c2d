//! Baseball pitch analysis
//!
//! Windows come from proportional segmentation. The pitch is judged on
//! stride length, arm path through cocking, lead leg bracing after foot
//! plant, delivery time and head stability.

use kinematics::{JointAngles, PhaseKind, PhaseSegmentation, SignalStats};
use pose_frame::{BodyPart, PoseFrame, PoseSequence};
use tracing::debug;

use crate::analyzer::{check_inputs, MovementAnalyzer};
use crate::config::AnalyzerConfig;
use crate::measure;
use crate::metrics::{
    AlignmentMetrics, ConsistencyMetrics, DepthMetrics, FaultKind, MovementAssessment, MovementMetrics, SubScores,
    TempoMetrics,
};
use crate::movement::MovementType;
use crate::AnalysisError;

/// Lower bound for the nose-to-ankle body height
const MIN_BODY_HEIGHT: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Analyzer for a pitching delivery
#[derive(Debug, Clone)]
pub struct PitchAnalyzer {
    config: AnalyzerConfig,
}

impl PitchAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn elbow_above_shoulder(&self, frame: &PoseFrame) -> bool {
        let margin = self.config.elbow_height_margin as f32;
        let high = |elbow: BodyPart, shoulder: BodyPart| {
            frame.landmark(elbow).y < frame.landmark(shoulder).y - margin
        };
        high(BodyPart::LeftElbow, BodyPart::LeftShoulder) || high(BodyPart::RightElbow, BodyPart::RightShoulder)
    }

    /// The leg whose ankle travels furthest is the stride (lead) leg
    fn lead_side(sequence: &PoseSequence) -> Side {
        let travel = |part: BodyPart| match (sequence.frames().first(), sequence.frames().last()) {
            (Some(first), Some(last)) => (last.landmark(part).x - first.landmark(part).x).abs(),
            _ => 0.0,
        };
        if travel(BodyPart::LeftAnkle) >= travel(BodyPart::RightAnkle) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn tempo(&self, sequence: &PoseSequence) -> TempoMetrics {
        let total_ms = sequence.duration_ms();
        let (lo, hi) = self.config.delivery_band_ms;
        let relative_deviation = if total_ms < lo {
            (lo - total_ms) as f64 / lo.max(1) as f64
        } else if total_ms > hi {
            (total_ms - hi) as f64 / hi.max(1) as f64
        } else {
            0.0
        };

        TempoMetrics {
            total_ms,
            relative_deviation,
            ..Default::default()
        }
    }
}

impl MovementAnalyzer for PitchAnalyzer {
    fn movement(&self) -> MovementType {
        MovementType::BaseballPitch
    }

    fn analyze(
        &self,
        sequence: &PoseSequence,
        angles: &[JointAngles],
        phases: &PhaseSegmentation,
    ) -> Result<MovementAssessment, AnalysisError> {
        check_inputs(sequence, angles)?;
        let cfg = &self.config;
        let whole = measure::whole(sequence);
        let mut observations = Vec::new();

        // Stride length relative to body height
        let body_height = sequence
            .frames()
            .first()
            .map(|f| f.ankle_midpoint().y as f64 - f.landmark(BodyPart::Nose).y as f64)
            .unwrap_or(0.0)
            .max(MIN_BODY_HEIGHT);
        let stride: Vec<f64> = sequence
            .iter()
            .map(|f| f.landmark(BodyPart::LeftAnkle).distance_to(f.landmark(BodyPart::RightAnkle)) / body_height)
            .collect();
        let stride_stats = SignalStats::compute(&stride);
        let stride_deficit = ((cfg.stride_target - stride_stats.max) / cfg.stride_target).max(0.0);
        let depth = DepthMetrics {
            target: cfg.stride_target,
            achieved: stride_stats.max,
            reached_target: stride_stats.max >= cfg.stride_target,
            deficit: stride_deficit,
            frame: stride_stats.argmax,
        };
        let stride_span = measure::phase_span(phases.first(PhaseKind::Stride)).unwrap_or(whole);
        observations.push(measure::observe(sequence, FaultKind::ShortStride, stride_deficit, stride_span));

        // Arm path during cocking
        let cocking = measure::phase_span(phases.first(PhaseKind::ArmCocking)).unwrap_or(whole);
        let cocking_frames = &sequence.frames()[cocking.0..=cocking.1];
        let high_elbows = cocking_frames.iter().filter(|f| self.elbow_above_shoulder(f)).count();
        let high_elbow_fraction = high_elbows as f64 / cocking_frames.len().max(1) as f64;
        let trunk_tilt = SignalStats::compute(&angles.iter().map(|a| a.spinal_alignment).collect::<Vec<_>>()).max;
        let alignment = AlignmentMetrics {
            knee_valgus: 0.0,
            forward_lean: trunk_tilt,
            high_elbow_fraction: Some(high_elbow_fraction),
        };
        observations.push(measure::observe(sequence, FaultKind::HighElbow, high_elbow_fraction, cocking));

        // Lead leg bracing after foot plant
        let lead_knee: Vec<f64> = match Self::lead_side(sequence) {
            Side::Left => angles.iter().map(|a| a.left_knee).collect(),
            Side::Right => angles.iter().map(|a| a.right_knee).collect(),
        };
        let plant = phases
            .first(PhaseKind::Stride)
            .map(|p| p.end_frame)
            .unwrap_or(sequence.len() / 2);
        let after_plant = SignalStats::compute(&lead_knee[plant..]);
        let collapse = (lead_knee[plant] - after_plant.min).max(0.0);
        let mut balance = measure::balance(sequence, cfg);
        balance.lead_knee_collapse = Some(collapse);
        observations.push(measure::observe(
            sequence,
            FaultKind::LeadLegCollapse,
            collapse,
            (plant, whole.1),
        ));

        // Delivery time
        let tempo = self.tempo(sequence);
        observations.push(measure::observe(
            sequence,
            FaultKind::TempoImbalance,
            tempo.relative_deviation,
            whole,
        ));

        // Head stability relative to the hips
        let head_offset: Vec<f64> = sequence
            .iter()
            .map(|f| f.landmark(BodyPart::Nose).x as f64 - f.hip_midpoint().x as f64)
            .collect();
        let head_sway = SignalStats::compute(&head_offset).std_dev;
        let consistency = ConsistencyMetrics {
            head_sway: Some(head_sway),
            ..Default::default()
        };

        let sub_scores = SubScores::clamped(
            100.0 - 150.0 * stride_deficit,
            100.0 - 100.0 * high_elbow_fraction - 2.0 * (trunk_tilt - cfg.max_trunk_tilt).max(0.0),
            100.0 - 2.0 * (collapse - cfg.max_lead_knee_collapse).max(0.0),
            100.0 * (1.0 - tempo.relative_deviation.min(1.0)),
            100.0 - 1000.0 * (head_sway - cfg.max_head_sway).max(0.0),
        );

        debug!(
            "Pitch analysis: stride {:.2} (target {:.2}), high elbow {:.0}%, lead knee collapse {:.1}",
            depth.achieved,
            depth.target,
            high_elbow_fraction * 100.0,
            collapse
        );

        Ok(MovementAssessment {
            metrics: MovementMetrics {
                depth,
                alignment,
                balance,
                tempo,
                consistency,
            },
            sub_scores,
            observations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinematics::{compute_joint_angles, PhaseSegmenter};
    use pose_frame::{LegPose, SyntheticPose};

    /// Stride opens until frame 13 (the end of the stride window for 30
    /// evenly spaced frames), then the lead knee bends by `collapse` degrees.
    /// Arms are raised above the shoulders when `high_elbow` is set.
    fn delivery(frames: usize, interval_ms: u64, collapse: f64, high_elbow: bool) -> PoseSequence {
        let plant = 13;
        let frames = (0..frames)
            .map(|i| {
                let progress = (i.min(plant) as f64) / plant as f64;
                let mut pose = SyntheticPose::standing(0.5);
                let extra = if i > plant { collapse } else { 0.0 };
                pose.left_leg = LegPose::new(50.0 * progress + extra / 2.0, 10.0 * progress + extra / 2.0);
                if high_elbow {
                    pose = pose.with_arms(170.0, 90.0);
                }
                pose.frame(i as u64 * interval_ms, i as u32)
            })
            .collect();
        PoseSequence::from_frames(frames).unwrap()
    }

    fn run(sequence: &PoseSequence) -> MovementAssessment {
        let angles: Vec<JointAngles> = sequence.iter().map(compute_joint_angles).collect();
        let phases = PhaseSegmenter::default().segment(sequence, &MovementType::BaseballPitch.segmentation());
        PitchAnalyzer::new(&AnalyzerConfig::default())
            .analyze(sequence, &angles, &phases)
            .unwrap()
    }

    #[test]
    fn test_clean_delivery() {
        let assessment = run(&delivery(30, 50, 0.0, false));
        assert_eq!(assessment.metrics.tempo.total_ms, 1450);
        assert_eq!(assessment.sub_scores.tempo, 100.0);
        assert_eq!(assessment.metrics.alignment.high_elbow_fraction, Some(0.0));
        assert!(assessment.metrics.balance.lead_knee_collapse.unwrap() < 0.1);
        assert!(assessment.sub_scores.balance > 99.9);
    }

    #[test]
    fn test_high_elbow_through_cocking() {
        let assessment = run(&delivery(30, 50, 0.0, true));
        assert_eq!(assessment.metrics.alignment.high_elbow_fraction, Some(1.0));
        assert!(assessment.sub_scores.alignment < 1e-9);
    }

    #[test]
    fn test_lead_leg_collapse_measured() {
        let assessment = run(&delivery(30, 50, 30.0, false));
        let collapse = assessment.metrics.balance.lead_knee_collapse.unwrap();
        assert!((collapse - 30.0).abs() < 0.5);
        assert!((assessment.sub_scores.balance - 80.0).abs() < 1.0);
    }

    #[test]
    fn test_slow_delivery_loses_tempo() {
        let assessment = run(&delivery(30, 125, 0.0, false));
        // 3625 ms against a 2500 ms ceiling
        assert_eq!(assessment.metrics.tempo.total_ms, 3625);
        assert!((assessment.metrics.tempo.relative_deviation - 0.45).abs() < 1e-9);
        assert!((assessment.sub_scores.tempo - 55.0).abs() < 1e-6);
    }
}
