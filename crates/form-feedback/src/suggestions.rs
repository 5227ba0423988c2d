//! Improvement suggestions for weak dimensions

use form_analysis::{MovementFamily, ScoreDimension, SubScores};
use serde::Serialize;

use crate::rules::FeedbackConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionPriority {
    Low,
    Medium,
    High,
}

/// A prioritized improvement recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSuggestion {
    pub category: ScoreDimension,
    pub priority: SuggestionPriority,
    pub text: String,
    pub expected_benefit: String,
}

/// (text, expected benefit)
fn wording(family: MovementFamily, dimension: ScoreDimension) -> (&'static str, &'static str) {
    match (family, dimension) {
        (MovementFamily::Strength, ScoreDimension::Depth) => (
            "Work on reaching full depth with box or tempo squats",
            "Greater range of motion and stronger glutes",
        ),
        (MovementFamily::Strength, ScoreDimension::Alignment) => (
            "Practice with a band above the knees and cue an upright chest",
            "Healthier knee tracking and less lower-back load",
        ),
        (MovementFamily::Strength, ScoreDimension::Balance) => (
            "Spread the weight across the whole foot and keep the hips centered",
            "More stable base and even loading of both legs",
        ),
        (MovementFamily::Strength, ScoreDimension::Tempo) => (
            "Count a slow descent and a controlled, steady drive up",
            "Better muscle control and time under tension",
        ),
        (MovementFamily::Strength, ScoreDimension::Consistency) => (
            "Use lighter load and film sets to match every repetition",
            "Repeatable technique that holds up under fatigue",
        ),
        (MovementFamily::Sport, ScoreDimension::Depth) => (
            "Drill stride length with markers on the ground",
            "More momentum transferred toward the target",
        ),
        (MovementFamily::Sport, ScoreDimension::Alignment) => (
            "Rehearse the arm path slowly in front of a mirror",
            "Efficient mechanics with less joint stress",
        ),
        (MovementFamily::Sport, ScoreDimension::Balance) => (
            "Practice landing on a firm front leg and holding the finish",
            "Better energy transfer through the lead side",
        ),
        (MovementFamily::Sport, ScoreDimension::Tempo) => (
            "Work on a consistent rhythm from first move to release",
            "Repeatable timing and sequencing",
        ),
        (MovementFamily::Sport, ScoreDimension::Consistency) => (
            "Keep the eyes on the target and the head quiet through release",
            "Improved accuracy and repeatability",
        ),
    }
}

/// One suggestion per dimension below the good cutoff, highest priority first
pub(crate) fn suggest(family: MovementFamily, scores: &SubScores, config: &FeedbackConfig) -> Vec<FormSuggestion> {
    let mut suggestions: Vec<FormSuggestion> = scores
        .iter()
        .filter(|(_, score)| *score < config.good_cutoff)
        .map(|(dimension, score)| {
            let priority = if score < config.high_priority_below {
                SuggestionPriority::High
            } else if score < config.medium_priority_below {
                SuggestionPriority::Medium
            } else {
                SuggestionPriority::Low
            };
            let (text, benefit) = wording(family, dimension);
            FormSuggestion {
                category: dimension,
                priority,
                text: text.to_string(),
                expected_benefit: benefit.to_string(),
            }
        })
        .collect();
    suggestions.sort_by(|a, b| b.priority.cmp(&a.priority));
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities_and_order() {
        let scores = SubScores::clamped(55.0, 90.0, 40.0, 72.0, 80.0);
        let suggestions = suggest(MovementFamily::Strength, &scores, &FeedbackConfig::default());

        let summary: Vec<(ScoreDimension, SuggestionPriority)> =
            suggestions.iter().map(|s| (s.category, s.priority)).collect();
        assert_eq!(
            summary,
            vec![
                (ScoreDimension::Balance, SuggestionPriority::High),
                (ScoreDimension::Depth, SuggestionPriority::Medium),
                (ScoreDimension::Tempo, SuggestionPriority::Low),
            ]
        );
    }

    #[test]
    fn test_sport_wording() {
        let scores = SubScores::clamped(30.0, 100.0, 100.0, 100.0, 100.0);
        let suggestions = suggest(MovementFamily::Sport, &scores, &FeedbackConfig::default());
        assert_eq!(suggestions.len(), 1);
        assert!(suggestions[0].text.contains("stride"));
    }
}
