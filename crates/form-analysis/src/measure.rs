//! Geometry shared by the analyzers

use kinematics::{MovementPhase, SignalStats};
use pose_frame::{BodyPart, PoseFrame, PoseSequence};

use crate::config::AnalyzerConfig;
use crate::metrics::{BalanceMetrics, FaultKind, Observation, WeightDistribution};

/// Ankle separation below which frontal knee tracking is not measurable
const MIN_ANKLE_SEPARATION: f64 = 0.01;

/// Floor for the lateral shift normalizer
const MIN_STANCE_WIDTH: f64 = 0.05;

fn horizontal_gap(frame: &PoseFrame, left: BodyPart, right: BodyPart) -> f64 {
    (frame.landmark(left).x as f64 - frame.landmark(right).x as f64).abs()
}

/// How far the knees cave in relative to the ankles (0 = tracking over the feet)
pub(crate) fn knee_valgus(frame: &PoseFrame) -> Option<f64> {
    let ankles = horizontal_gap(frame, BodyPart::LeftAnkle, BodyPart::RightAnkle);
    if ankles < MIN_ANKLE_SEPARATION {
        return None;
    }
    let knees = horizontal_gap(frame, BodyPart::LeftKnee, BodyPart::RightKnee);
    Some((1.0 - knees / ankles).max(0.0))
}

/// Hip midpoint offset over the ankle midpoint, normalized by stance width
pub(crate) fn hip_offset(frame: &PoseFrame) -> f64 {
    let ankles = horizontal_gap(frame, BodyPart::LeftAnkle, BodyPart::RightAnkle);
    let offset = frame.hip_midpoint().x as f64 - frame.ankle_midpoint().x as f64;
    offset / ankles.max(MIN_STANCE_WIDTH)
}

/// First and last index where `pred` holds
pub(crate) fn span_where(values: &[f64], pred: impl Fn(f64) -> bool) -> Option<(usize, usize)> {
    let first = values.iter().position(|&v| pred(v))?;
    let last = values.iter().rposition(|&v| pred(v))?;
    Some((first, last))
}

pub(crate) fn whole(sequence: &PoseSequence) -> (usize, usize) {
    (0, sequence.len().saturating_sub(1))
}

pub(crate) fn phase_span(phase: Option<&MovementPhase>) -> Option<(usize, usize)> {
    phase.map(|p| (p.start_frame, p.end_frame))
}

pub(crate) fn observe(sequence: &PoseSequence, kind: FaultKind, value: f64, span: (usize, usize)) -> Observation {
    Observation {
        kind,
        value,
        start_ms: sequence.timestamp_at(span.0),
        end_ms: sequence.timestamp_at(span.1),
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Weight distribution and sway of the hips over the feet
pub(crate) fn balance(sequence: &PoseSequence, config: &AnalyzerConfig) -> BalanceMetrics {
    let lateral_shift = mean(sequence.iter().map(hip_offset));
    let hip_x: Vec<f64> = sequence.iter().map(|f| f.hip_midpoint().x as f64).collect();
    let sway = SignalStats::compute(&hip_x).std_dev;

    let distribution = if lateral_shift.abs() <= config.balance_tolerance {
        WeightDistribution::Centered
    } else if lateral_shift < 0.0 {
        WeightDistribution::LeftBiased
    } else {
        WeightDistribution::RightBiased
    };

    BalanceMetrics {
        distribution,
        lateral_shift,
        sway,
        lead_knee_collapse: None,
    }
}

pub(crate) fn balance_score(metrics: &BalanceMetrics, config: &AnalyzerConfig) -> f64 {
    100.0
        - 100.0 * (metrics.lateral_shift.abs() - config.balance_tolerance).max(0.0)
        - 1000.0 * (metrics.sway - config.max_sway).max(0.0)
}
