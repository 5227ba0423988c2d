//! Sub-metrics, sub-scores and fault observations produced by analyzers

use kinematics::PhaseKind;
use serde::{Deserialize, Serialize};

/// Scored biomechanical dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDimension {
    Depth,
    Alignment,
    Balance,
    Tempo,
    Consistency,
}

impl ScoreDimension {
    pub const ALL: [ScoreDimension; 5] = [
        ScoreDimension::Depth,
        ScoreDimension::Alignment,
        ScoreDimension::Balance,
        ScoreDimension::Tempo,
        ScoreDimension::Consistency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreDimension::Depth => "depth",
            ScoreDimension::Alignment => "alignment",
            ScoreDimension::Balance => "balance",
            ScoreDimension::Tempo => "tempo",
            ScoreDimension::Consistency => "consistency",
        }
    }
}

/// One 0-100 score per dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub depth: f64,
    pub alignment: f64,
    pub balance: f64,
    pub tempo: f64,
    pub consistency: f64,
}

impl SubScores {
    /// Build from raw values, clamping each into [0, 100]
    pub fn clamped(depth: f64, alignment: f64, balance: f64, tempo: f64, consistency: f64) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        Self {
            depth: c(depth),
            alignment: c(alignment),
            balance: c(balance),
            tempo: c(tempo),
            consistency: c(consistency),
        }
    }

    pub fn get(&self, dimension: ScoreDimension) -> f64 {
        match dimension {
            ScoreDimension::Depth => self.depth,
            ScoreDimension::Alignment => self.alignment,
            ScoreDimension::Balance => self.balance,
            ScoreDimension::Tempo => self.tempo,
            ScoreDimension::Consistency => self.consistency,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreDimension, f64)> + '_ {
        ScoreDimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Technique faults an analyzer can measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    ShallowDepth,
    KneeValgus,
    ExcessiveForwardLean,
    WeightShift,
    ExcessiveSway,
    TempoImbalance,
    Asymmetry,
    ShortStride,
    HighElbow,
    LeadLegCollapse,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::ShallowDepth => "shallow_depth",
            FaultKind::KneeValgus => "knee_valgus",
            FaultKind::ExcessiveForwardLean => "excessive_forward_lean",
            FaultKind::WeightShift => "weight_shift",
            FaultKind::ExcessiveSway => "excessive_sway",
            FaultKind::TempoImbalance => "tempo_imbalance",
            FaultKind::Asymmetry => "asymmetry",
            FaultKind::ShortStride => "short_stride",
            FaultKind::HighElbow => "high_elbow",
            FaultKind::LeadLegCollapse => "lead_leg_collapse",
        }
    }
}

/// A measured deviation, judged later by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub kind: FaultKind,
    /// Magnitude in the unit of the fault kind (degrees, fraction, ...)
    pub value: f64,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Range of motion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepthMetrics {
    /// Target the movement should reach
    pub target: f64,
    /// Best value reached
    pub achieved: f64,
    pub reached_target: bool,
    /// How far the achieved value falls short of the target
    pub deficit: f64,
    /// Frame where the achieved value occurred
    pub frame: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignmentMetrics {
    /// Worst knee valgus (fraction of ankle separation)
    pub knee_valgus: f64,
    /// Worst trunk angle from vertical (degrees)
    pub forward_lean: f64,
    /// Fraction of arm-cocking frames with an elbow above the shoulder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_elbow_fraction: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightDistribution {
    #[default]
    Centered,
    LeftBiased,
    RightBiased,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalanceMetrics {
    pub distribution: WeightDistribution,
    /// Mean normalized hip-over-ankle offset (negative = left)
    pub lateral_shift: f64,
    /// Standard deviation of the hip midpoint x position
    pub sway: f64,
    /// Lead knee flexion gained after foot plant (degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_knee_collapse: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TempoMetrics {
    pub descent_ms: u64,
    pub bottom_ms: u64,
    pub ascent_ms: u64,
    pub total_ms: u64,
    /// Observed descent:ascent ratio, when both phases exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    pub ideal_ratio: f64,
    /// |ratio - ideal| / ideal, or distance outside the duration band
    pub relative_deviation: f64,
    /// Phases whose duration fell outside the accepted band
    pub out_of_band: Vec<PhaseKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyMetrics {
    /// Mean |left - right| knee angle (degrees)
    pub knee_asymmetry: f64,
    /// Mean |left - right| hip angle (degrees)
    pub hip_asymmetry: f64,
    /// Standard deviation of per-repetition depth (degrees)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_variability: Option<f64>,
    /// Head movement relative to the hips
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_sway: Option<f64>,
}

/// All movement-specific measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovementMetrics {
    pub depth: DepthMetrics,
    pub alignment: AlignmentMetrics,
    pub balance: BalanceMetrics,
    pub tempo: TempoMetrics,
    pub consistency: ConsistencyMetrics,
}

/// Analyzer output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementAssessment {
    pub metrics: MovementMetrics,
    pub sub_scores: SubScores,
    #[serde(skip)]
    pub observations: Vec<Observation>,
}

impl MovementAssessment {
    pub fn observation(&self, kind: FaultKind) -> Option<&Observation> {
        self.observations.iter().find(|o| o.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sub_scores_clamp() {
        let scores = SubScores::clamped(120.0, -5.0, 50.0, f64::NAN, 100.0);
        assert_eq!(scores.depth, 100.0);
        assert_eq!(scores.alignment, 0.0);
        assert_eq!(scores.tempo, 0.0);
        assert_eq!(scores.iter().count(), 5);
        assert_eq!(scores.get(ScoreDimension::Balance), 50.0);
    }

    proptest! {
        #[test]
        fn prop_sub_scores_always_in_range(
            depth in prop::num::f64::ANY,
            alignment in prop::num::f64::ANY,
            balance in -1e6f64..1e6,
            tempo in prop::num::f64::ANY,
            consistency in 0.0f64..=100.0,
        ) {
            let scores = SubScores::clamped(depth, alignment, balance, tempo, consistency);
            for (_, value) in scores.iter() {
                prop_assert!((0.0..=100.0).contains(&value));
            }
            prop_assert_eq!(scores.consistency, consistency);
        }
    }
}
