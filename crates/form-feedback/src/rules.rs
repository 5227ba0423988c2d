//! Form error rule engine
//!
//! Every observation is judged against its severity bands independently;
//! all rules that fire produce an error.

use std::collections::BTreeMap;

use form_analysis::{AnalyzerConfig, FaultKind, MovementAssessment, MovementType, Observation};
use pose_frame::BodyPart;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::suggestions::{self, FormSuggestion};
use crate::FeedbackError;

/// Error severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Points subtracted from the overall score
    pub fn penalty(&self) -> f64 {
        match self {
            Severity::Low => 5.0,
            Severity::Medium => 10.0,
            Severity::High => 15.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Lower bounds (exclusive) of each severity tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityBands {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl SeverityBands {
    pub const fn new(low: f64, medium: f64, high: f64) -> Self {
        Self { low, medium, high }
    }

    pub fn is_valid(&self) -> bool {
        self.low < self.medium && self.medium < self.high
    }

    /// Severity for a measured value, `None` when within tolerance
    pub fn classify(&self, value: f64) -> Option<Severity> {
        if value > self.high {
            Some(Severity::High)
        } else if value > self.medium {
            Some(Severity::Medium)
        } else if value > self.low {
            Some(Severity::Low)
        } else {
            None
        }
    }
}

/// A detected technique fault
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormError {
    pub kind: FaultKind,
    pub severity: Severity,
    pub start_ms: u64,
    pub end_ms: u64,
    /// The measured value that triggered the rule
    pub value: f64,
    pub description: String,
    pub correction: String,
    /// Landmark slot indices involved
    pub affected_landmarks: Vec<usize>,
}

/// Rule engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Severity bands per fault kind
    pub bands: BTreeMap<FaultKind, SeverityBands>,
    /// Sub-scores at or above this need no suggestion
    pub good_cutoff: f64,
    /// Sub-scores below this get a high priority suggestion
    pub high_priority_below: f64,
    /// Sub-scores below this get a medium priority suggestion
    pub medium_priority_below: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        let bands = [
            (FaultKind::ShallowDepth, SeverityBands::new(0.0, 10.0, 25.0)),
            (FaultKind::KneeValgus, SeverityBands::new(0.10, 0.20, 0.35)),
            (FaultKind::ExcessiveForwardLean, SeverityBands::new(45.0, 55.0, 65.0)),
            (FaultKind::WeightShift, SeverityBands::new(0.15, 0.30, 0.50)),
            (FaultKind::ExcessiveSway, SeverityBands::new(0.02, 0.04, 0.08)),
            (FaultKind::TempoImbalance, SeverityBands::new(0.5, 0.75, 1.0)),
            (FaultKind::Asymmetry, SeverityBands::new(10.0, 20.0, 30.0)),
            (FaultKind::ShortStride, SeverityBands::new(0.10, 0.25, 0.40)),
            (FaultKind::HighElbow, SeverityBands::new(0.20, 0.40, 0.60)),
            (FaultKind::LeadLegCollapse, SeverityBands::new(20.0, 30.0, 45.0)),
        ];
        Self {
            bands: bands.into_iter().collect(),
            good_cutoff: 80.0,
            high_priority_below: 50.0,
            medium_priority_below: 65.0,
        }
    }
}

impl FeedbackConfig {
    /// Default bands moved so that each tolerance-based fault starts at the
    /// analyzer's tolerance. Tier widths are kept.
    pub fn aligned_with(analyzer: &AnalyzerConfig) -> Self {
        let mut config = Self::default();
        for (kind, tolerance) in [
            (FaultKind::KneeValgus, analyzer.max_knee_valgus),
            (FaultKind::ExcessiveForwardLean, analyzer.max_forward_lean),
            (FaultKind::WeightShift, analyzer.balance_tolerance),
            (FaultKind::ExcessiveSway, analyzer.max_sway),
            (FaultKind::LeadLegCollapse, analyzer.max_lead_knee_collapse),
        ] {
            if let Some(bands) = config.bands.get_mut(&kind) {
                let shift = tolerance - bands.low;
                *bands = SeverityBands::new(tolerance, bands.medium + shift, bands.high + shift);
            }
        }
        config
    }
}

struct Rule {
    kind: FaultKind,
    description: &'static str,
    correction: &'static str,
    landmarks: &'static [BodyPart],
}

const HIPS_KNEES: &[BodyPart] = &[
    BodyPart::LeftHip,
    BodyPart::RightHip,
    BodyPart::LeftKnee,
    BodyPart::RightKnee,
];

const KNEES_ANKLES: &[BodyPart] = &[
    BodyPart::LeftKnee,
    BodyPart::RightKnee,
    BodyPart::LeftAnkle,
    BodyPart::RightAnkle,
];

const TRUNK: &[BodyPart] = &[
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
    BodyPart::LeftHip,
    BodyPart::RightHip,
];

const HIPS_ANKLES: &[BodyPart] = &[
    BodyPart::LeftHip,
    BodyPart::RightHip,
    BodyPart::LeftAnkle,
    BodyPart::RightAnkle,
];

const HIPS: &[BodyPart] = &[BodyPart::LeftHip, BodyPart::RightHip];

const ARMS: &[BodyPart] = &[
    BodyPart::LeftShoulder,
    BodyPart::RightShoulder,
    BodyPart::LeftElbow,
    BodyPart::RightElbow,
];

const LEGS: &[BodyPart] = &[
    BodyPart::LeftHip,
    BodyPart::RightHip,
    BodyPart::LeftKnee,
    BodyPart::RightKnee,
    BodyPart::LeftAnkle,
    BodyPart::RightAnkle,
];

const RULES: &[Rule] = &[
    Rule {
        kind: FaultKind::ShallowDepth,
        description: "Movement did not reach the target depth",
        correction: "Sit back and lower until the hips reach knee height, keeping the chest up",
        landmarks: HIPS_KNEES,
    },
    Rule {
        kind: FaultKind::KneeValgus,
        description: "Knees cave inward relative to the feet",
        correction: "Push the knees out so they track over the toes",
        landmarks: KNEES_ANKLES,
    },
    Rule {
        kind: FaultKind::ExcessiveForwardLean,
        description: "Torso leans too far forward",
        correction: "Brace the core and keep the chest tall through the movement",
        landmarks: TRUNK,
    },
    Rule {
        kind: FaultKind::WeightShift,
        description: "Weight shifts to one side",
        correction: "Keep the hips centered between the feet and press evenly through both legs",
        landmarks: HIPS_ANKLES,
    },
    Rule {
        kind: FaultKind::ExcessiveSway,
        description: "Hips sway side to side during the movement",
        correction: "Slow down and stabilize the hips before each repetition",
        landmarks: HIPS,
    },
    Rule {
        kind: FaultKind::TempoImbalance,
        description: "Movement tempo is uneven",
        correction: "Control the lowering phase and drive up smoothly",
        landmarks: HIPS,
    },
    Rule {
        kind: FaultKind::Asymmetry,
        description: "Left and right sides move differently",
        correction: "Focus on matching depth and joint angles on both sides",
        landmarks: HIPS_KNEES,
    },
    Rule {
        kind: FaultKind::ShortStride,
        description: "Stride is short relative to body height",
        correction: "Drive off the back leg and reach further toward the target",
        landmarks: HIPS_ANKLES,
    },
    Rule {
        kind: FaultKind::HighElbow,
        description: "Elbow rises above shoulder height during arm cocking, a pattern associated with elevated shoulder stress",
        correction: "Keep the elbow at or slightly below shoulder height as the arm comes up",
        landmarks: ARMS,
    },
    Rule {
        kind: FaultKind::LeadLegCollapse,
        description: "Lead knee keeps bending after foot plant, which may reduce power transfer and load the knee",
        correction: "Firm up the front leg at landing and brace against it as the arm comes through",
        landmarks: LEGS,
    },
];

/// Feedback for one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feedback {
    pub errors: Vec<FormError>,
    pub suggestions: Vec<FormSuggestion>,
}

/// Rule engine over analyzer observations and sub-scores
#[derive(Debug, Clone)]
pub struct FeedbackGenerator {
    config: FeedbackConfig,
}

impl FeedbackGenerator {
    /// Create a generator, checking that bands and cutoffs are ordered
    pub fn new(config: FeedbackConfig) -> Result<Self, FeedbackError> {
        if let Some((kind, _)) = config.bands.iter().find(|(_, bands)| !bands.is_valid()) {
            return Err(FeedbackError::InvalidBands(*kind));
        }
        if !(config.high_priority_below < config.medium_priority_below
            && config.medium_priority_below <= config.good_cutoff)
        {
            return Err(FeedbackError::InvalidCutoffs);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    fn judge(&self, observation: &Observation) -> Option<FormError> {
        let bands = self.config.bands.get(&observation.kind)?;
        let severity = bands.classify(observation.value)?;
        let rule = RULES.iter().find(|r| r.kind == observation.kind)?;

        Some(FormError {
            kind: observation.kind,
            severity,
            start_ms: observation.start_ms,
            end_ms: observation.end_ms,
            value: observation.value,
            description: rule.description.to_string(),
            correction: rule.correction.to_string(),
            affected_landmarks: rule.landmarks.iter().map(|p| p.index()).collect(),
        })
    }

    /// Errors for every observation outside tolerance, most severe first
    pub fn errors(&self, assessment: &MovementAssessment) -> Vec<FormError> {
        let mut errors: Vec<FormError> = assessment.observations.iter().filter_map(|o| self.judge(o)).collect();
        errors.sort_by(|a, b| b.severity.cmp(&a.severity));
        errors
    }

    /// Errors plus suggestions for weak dimensions
    pub fn generate(&self, movement: MovementType, assessment: &MovementAssessment) -> Feedback {
        let errors = self.errors(assessment);
        let suggestions = suggestions::suggest(movement.family(), &assessment.sub_scores, &self.config);
        debug!(
            "{} feedback: {} errors, {} suggestions",
            movement,
            errors.len(),
            suggestions.len()
        );
        Feedback { errors, suggestions }
    }
}

impl Default for FeedbackGenerator {
    fn default() -> Self {
        Self {
            config: FeedbackConfig::default(),
        }
    }
}
