//! Analyzer trait and registry

use std::collections::HashMap;

use kinematics::{JointAngles, PhaseSegmentation};
use pose_frame::PoseSequence;
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::cyclic::CyclicAnalyzer;
use crate::metrics::MovementAssessment;
use crate::movement::MovementType;
use crate::pitch::PitchAnalyzer;
use crate::AnalysisError;

/// One analyzer per supported movement type
pub trait MovementAnalyzer: Send + Sync {
    fn movement(&self) -> MovementType;

    /// Compute sub-metrics, sub-scores and observations.
    ///
    /// `angles` holds one record per frame of `sequence`.
    fn analyze(
        &self,
        sequence: &PoseSequence,
        angles: &[JointAngles],
        phases: &PhaseSegmentation,
    ) -> Result<MovementAssessment, AnalysisError>;
}

/// Reject inputs no analyzer can work with
pub(crate) fn check_inputs(sequence: &PoseSequence, angles: &[JointAngles]) -> Result<(), AnalysisError> {
    if sequence.is_empty() {
        return Err(AnalysisError::EmptySequence);
    }
    if sequence.len() != angles.len() {
        return Err(AnalysisError::AngleCountMismatch {
            frames: sequence.len(),
            angles: angles.len(),
        });
    }
    Ok(())
}

/// Maps movement types to analyzer implementations
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<MovementType, Box<dyn MovementAnalyzer>>,
}

impl AnalyzerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the squat, lunge and baseball pitch analyzers
    pub fn with_defaults(config: &AnalyzerConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CyclicAnalyzer::squat(config)));
        registry.register(Box::new(CyclicAnalyzer::lunge(config)));
        registry.register(Box::new(PitchAnalyzer::new(config)));
        registry
    }

    /// Register an analyzer, replacing any previous one for the same movement
    pub fn register(&mut self, analyzer: Box<dyn MovementAnalyzer>) {
        debug!("Registering analyzer for {}", analyzer.movement());
        self.analyzers.insert(analyzer.movement(), analyzer);
    }

    /// Look up the analyzer for a movement
    pub fn get(&self, movement: MovementType) -> Result<&dyn MovementAnalyzer, AnalysisError> {
        self.analyzers
            .get(&movement)
            .map(|a| a.as_ref())
            .ok_or(AnalysisError::NotImplemented(movement))
    }

    pub fn supports(&self, movement: MovementType) -> bool {
        self.analyzers.contains_key(&movement)
    }

    /// Supported movements in declaration order
    pub fn supported(&self) -> Vec<MovementType> {
        MovementType::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = AnalyzerRegistry::with_defaults(&AnalyzerConfig::default());
        assert_eq!(
            registry.supported(),
            vec![MovementType::Squat, MovementType::Lunge, MovementType::BaseballPitch]
        );
        assert_eq!(registry.get(MovementType::Lunge).unwrap().movement(), MovementType::Lunge);
    }

    #[test]
    fn test_unregistered_is_not_implemented() {
        let registry = AnalyzerRegistry::with_defaults(&AnalyzerConfig::default());
        for movement in [
            MovementType::PushUp,
            MovementType::Deadlift,
            MovementType::GolfSwing,
            MovementType::TennisServe,
        ] {
            assert_eq!(
                registry.get(movement).err(),
                Some(AnalysisError::NotImplemented(movement))
            );
        }
    }

    #[test]
    fn test_check_inputs() {
        let sequence = PoseSequence::new();
        assert_eq!(check_inputs(&sequence, &[]), Err(AnalysisError::EmptySequence));
    }
}
