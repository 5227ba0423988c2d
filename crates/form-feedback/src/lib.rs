//! Form Feedback
//!
//! Turns analyzer output into user-facing feedback:
//! - Severity-banded form errors with corrections and affected landmarks
//! - Prioritized improvement suggestions for weak dimensions
//! - Weighted overall score with an error penalty

mod rules;
mod score;
mod suggestions;

pub use rules::{Feedback, FeedbackConfig, FeedbackGenerator, FormError, Severity, SeverityBands};
pub use score::{ScoreAggregator, ScoreBreakdown, WeightVector};
pub use suggestions::{FormSuggestion, SuggestionPriority};

use form_analysis::{FaultKind, MovementType};
use thiserror::Error;

/// Feedback error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedbackError {
    #[error("Weights for {movement} sum to {sum}, expected 1.0")]
    InvalidWeights { movement: MovementType, sum: f64 },

    #[error("Severity bands for {0:?} must be increasing")]
    InvalidBands(FaultKind),

    #[error("Priority cutoffs must satisfy high < medium < good")]
    InvalidCutoffs,
}
