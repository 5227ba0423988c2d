//! Score Aggregator

use form_analysis::{MovementType, ScoreDimension, SubScores};
use serde::{Deserialize, Serialize};

use crate::rules::FormError;
use crate::FeedbackError;

const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Per-dimension weights; always sums to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    depth: f64,
    alignment: f64,
    balance: f64,
    tempo: f64,
    consistency: f64,
}

impl WeightVector {
    /// Weights in dimension order: depth, alignment, balance, tempo, consistency
    pub fn new(movement: MovementType, weights: [f64; 5]) -> Result<Self, FeedbackError> {
        let sum: f64 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(FeedbackError::InvalidWeights { movement, sum });
        }
        let [depth, alignment, balance, tempo, consistency] = weights;
        Ok(Self {
            depth,
            alignment,
            balance,
            tempo,
            consistency,
        })
    }

    /// Built-in weights for a movement type
    pub fn for_movement(movement: MovementType) -> Self {
        let [depth, alignment, balance, tempo, consistency] = match movement {
            MovementType::Squat | MovementType::PushUp | MovementType::Deadlift => [0.30, 0.25, 0.20, 0.15, 0.10],
            MovementType::Lunge => [0.25, 0.25, 0.25, 0.15, 0.10],
            MovementType::BaseballPitch | MovementType::GolfSwing | MovementType::TennisServe => {
                [0.20, 0.30, 0.20, 0.15, 0.15]
            }
        };
        Self {
            depth,
            alignment,
            balance,
            tempo,
            consistency,
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

    pub fn sum(&self) -> f64 {
        ScoreDimension::ALL.iter().map(|d| self.get(*d)).sum()
    }
}

/// How the overall score was reached
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Σ sub-score × weight
    pub weighted: f64,
    /// Summed severity penalties
    pub penalty: f64,
    /// Clamped and rounded result
    pub overall: u8,
}

/// Weighted sum minus error penalty, clamped to [0, 100]
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, scores: &SubScores, weights: &WeightVector, errors: &[FormError]) -> ScoreBreakdown {
        let weighted: f64 = scores.iter().map(|(d, s)| s * weights.get(d)).sum();
        let penalty: f64 = errors.iter().map(|e| e.severity.penalty()).sum();
        let raw = weighted - penalty;
        let overall = if raw.is_finite() {
            raw.clamp(0.0, 100.0).round() as u8
        } else {
            0
        };

        ScoreBreakdown {
            weighted,
            penalty,
            overall,
        }
    }
}
