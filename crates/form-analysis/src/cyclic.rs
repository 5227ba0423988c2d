//! Squat and lunge analysis
//!
//! Both movements repeat standing → descent → bottom → ascent cycles and are
//! scored on the same five dimensions; they differ in which joint measures
//! depth, the ideal tempo ratio and whether left/right symmetry is expected.

use kinematics::{JointAngles, PhaseKind, PhaseSegmentation, SignalStats};
use pose_frame::PoseSequence;
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

/// Sub-score points per out-of-band phase
const TEMPO_BAND_PENALTY: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DepthJoint {
    /// Mean of left and right hip angles
    Hips,
    /// The more flexed knee
    FrontKnee,
}

/// Analyzer for cyclic strength movements
#[derive(Debug, Clone)]
pub struct CyclicAnalyzer {
    movement: MovementType,
    depth_joint: DepthJoint,
    depth_target: f64,
    tempo_ratio: f64,
    symmetric: bool,
    config: AnalyzerConfig,
}

impl CyclicAnalyzer {
    pub fn squat(config: &AnalyzerConfig) -> Self {
        Self {
            movement: MovementType::Squat,
            depth_joint: DepthJoint::Hips,
            depth_target: config.squat_depth_hip_angle,
            tempo_ratio: config.squat_tempo_ratio,
            symmetric: true,
            config: config.clone(),
        }
    }

    pub fn lunge(config: &AnalyzerConfig) -> Self {
        Self {
            movement: MovementType::Lunge,
            depth_joint: DepthJoint::FrontKnee,
            depth_target: config.lunge_depth_knee_angle,
            tempo_ratio: config.lunge_tempo_ratio,
            symmetric: false,
            config: config.clone(),
        }
    }

    fn depth_series(&self, angles: &[JointAngles]) -> Vec<f64> {
        angles
            .iter()
            .map(|a| match self.depth_joint {
                DepthJoint::Hips => a.mean_hip(),
                DepthJoint::FrontKnee => a.min_knee(),
            })
            .collect()
    }

    fn tempo(&self, phases: &PhaseSegmentation) -> TempoMetrics {
        let per_rep = |kind: PhaseKind| -> Option<u64> {
            let count = phases.phases.iter().filter(|p| p.kind == kind).count() as u64;
            (count > 0).then(|| phases.total_duration_ms(kind) / count)
        };
        let descent = per_rep(PhaseKind::Descent);
        let bottom = per_rep(PhaseKind::Bottom);
        let ascent = per_rep(PhaseKind::Ascent);

        let ratio = match (descent, ascent) {
            (Some(d), Some(a)) if d > 0 && a > 0 => Some(d as f64 / a as f64),
            _ => None,
        };
        let relative_deviation = ratio
            .map(|r| (r - self.tempo_ratio).abs() / self.tempo_ratio)
            .unwrap_or(1.0);

        let in_band = |value: u64, (lo, hi): (u64, u64)| value >= lo && value <= hi;
        let mut out_of_band = Vec::new();
        if descent.is_some_and(|d| !in_band(d, self.config.descent_band_ms)) {
            out_of_band.push(PhaseKind::Descent);
        }
        if bottom.is_some_and(|b| b > self.config.max_bottom_ms) {
            out_of_band.push(PhaseKind::Bottom);
        }
        if ascent.is_some_and(|a| !in_band(a, self.config.ascent_band_ms)) {
            out_of_band.push(PhaseKind::Ascent);
        }

        TempoMetrics {
            descent_ms: descent.unwrap_or(0),
            bottom_ms: bottom.unwrap_or(0),
            ascent_ms: ascent.unwrap_or(0),
            total_ms: phases
                .phases
                .iter()
                .filter(|p| p.kind != PhaseKind::Standing)
                .map(|p| p.duration_ms)
                .sum(),
            ratio,
            ideal_ratio: self.tempo_ratio,
            relative_deviation,
            out_of_band,
        }
    }
}

impl MovementAnalyzer for CyclicAnalyzer {
    fn movement(&self) -> MovementType {
        self.movement
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

        // Depth: lowest angle reached
        let depth_series = self.depth_series(angles);
        let depth_stats = SignalStats::compute(&depth_series);
        let deficit = (depth_stats.min - self.depth_target).max(0.0);
        let depth = DepthMetrics {
            target: self.depth_target,
            achieved: depth_stats.min,
            reached_target: depth_stats.min <= self.depth_target,
            deficit,
            frame: depth_stats.argmin,
        };
        let depth_span = measure::phase_span(phases.first(PhaseKind::Bottom))
            .unwrap_or((depth_stats.argmin, depth_stats.argmin));
        observations.push(measure::observe(sequence, FaultKind::ShallowDepth, deficit, depth_span));

        // Alignment: knee tracking and trunk lean
        let valgus: Vec<f64> = sequence
            .iter()
            .map(|f| measure::knee_valgus(f).unwrap_or(0.0))
            .collect();
        let lean: Vec<f64> = angles.iter().map(|a| a.spinal_alignment).collect();
        let alignment = AlignmentMetrics {
            knee_valgus: SignalStats::compute(&valgus).max,
            forward_lean: SignalStats::compute(&lean).max,
            high_elbow_fraction: None,
        };
        observations.push(measure::observe(
            sequence,
            FaultKind::KneeValgus,
            alignment.knee_valgus,
            measure::span_where(&valgus, |v| v > cfg.max_knee_valgus).unwrap_or(whole),
        ));
        observations.push(measure::observe(
            sequence,
            FaultKind::ExcessiveForwardLean,
            alignment.forward_lean,
            measure::span_where(&lean, |v| v > cfg.max_forward_lean).unwrap_or(whole),
        ));

        // Balance
        let balance = measure::balance(sequence, cfg);
        observations.push(measure::observe(
            sequence,
            FaultKind::WeightShift,
            balance.lateral_shift.abs(),
            whole,
        ));
        observations.push(measure::observe(sequence, FaultKind::ExcessiveSway, balance.sway, whole));

        // Tempo
        let tempo = self.tempo(phases);
        observations.push(measure::observe(
            sequence,
            FaultKind::TempoImbalance,
            tempo.relative_deviation,
            whole,
        ));

        // Consistency: left/right symmetry and rep-to-rep depth
        let knee_asymmetry = measure::mean(angles.iter().map(|a| (a.left_knee - a.right_knee).abs()));
        let hip_asymmetry = measure::mean(angles.iter().map(|a| (a.left_hip - a.right_hip).abs()));
        let rep_depths: Vec<f64> = phases
            .phases
            .iter()
            .filter(|p| p.kind == PhaseKind::Bottom)
            .map(|p| SignalStats::compute(&depth_series[p.start_frame..=p.end_frame]).min)
            .collect();
        let rep_variability = (rep_depths.len() >= 2).then(|| SignalStats::compute(&rep_depths).std_dev);
        let consistency = ConsistencyMetrics {
            knee_asymmetry,
            hip_asymmetry,
            rep_variability,
            head_sway: None,
        };
        let mut consistency_score = 100.0 - 2.0 * rep_variability.unwrap_or(0.0);
        if self.symmetric {
            let asymmetry = (knee_asymmetry + hip_asymmetry) / 2.0;
            consistency_score -= 2.0 * asymmetry;
            observations.push(measure::observe(
                sequence,
                FaultKind::Asymmetry,
                knee_asymmetry.max(hip_asymmetry),
                whole,
            ));
        }

        let sub_scores = SubScores::clamped(
            100.0 - cfg.depth_points_per_degree * deficit,
            100.0
                - 200.0 * (alignment.knee_valgus - cfg.max_knee_valgus).max(0.0)
                - 2.0 * (alignment.forward_lean - cfg.max_forward_lean).max(0.0),
            measure::balance_score(&balance, cfg),
            100.0 * (1.0 - tempo.relative_deviation.min(1.0)) - TEMPO_BAND_PENALTY * tempo.out_of_band.len() as f64,
            consistency_score,
        );

        debug!(
            "{} analysis: depth {:.1} (target {:.1}), valgus {:.3}, lean {:.1}, tempo ratio {:?}",
            self.movement, depth.achieved, depth.target, alignment.knee_valgus, alignment.forward_lean, tempo.ratio
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
