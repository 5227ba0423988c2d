//! Movement Analysis Engine
//!
//! Request-level orchestration around the analysis pipeline:
//! - Fingerprinting of requests and de-duplication of concurrent identical ones
//! - Bounded, time-limited cache of completed results
//! - Uniform success/failure results with an error taxonomy
//! - History records for successful analyses

pub mod cache;
pub mod config;
pub mod orchestrator;
pub mod result;

pub use cache::CacheConfig;
pub use config::EngineConfig;
pub use orchestrator::Orchestrator;
pub use result::{AnalysisErrorKind, AnalysisIssue, AnalysisOptions, AnalysisResult, Fingerprint, FormAnalysis};

use form_feedback::FeedbackError;
use kinematics::KinematicsError;
use thiserror::Error;

/// Engine construction errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid phase configuration: {0}")]
    Phases(#[from] KinematicsError),

    #[error("Invalid feedback configuration: {0}")]
    Feedback(#[from] FeedbackError),
}
