//! Analysis Orchestrator
//!
//! Validates a request, resolves the analyzer, drives frame extraction and
//! pose detection, gates on confidence, then analyzes, explains and scores
//! the movement.
//!
//! At most one computation runs per fingerprint. Later callers with the same
//! fingerprint await the shared in-flight computation, which runs in its own
//! task so that a caller giving up never cancels it for the others.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use form_analysis::{AnalysisError, AnalyzerRegistry, MovementType};
use form_feedback::{FeedbackGenerator, ScoreAggregator, WeightVector};
use futures::future::{BoxFuture, FutureExt, Shared};
use input_validator::Validator;
use kinematics::{compute_joint_angles, JointAngles, PhaseSegmenter};
use pose_frame::{FrameSource, VideoHandle};
use pose_pipeline::{ConfidenceEvaluator, FrameBatchProcessor, PipelineError, PoseDetector};
use storage::{AnalysisRecord, ResultStore, StorageError};
use tracing::{debug, error, info, warn};

use crate::cache::ResultCache;
use crate::config::EngineConfig;
use crate::result::{AnalysisErrorKind, AnalysisIssue, AnalysisOptions, AnalysisResult, Fingerprint, FormAnalysis};
use crate::EngineError;

type InFlight = Shared<BoxFuture<'static, AnalysisResult>>;

/// Aborted computation: issues plus how many frames reached the detector
struct Failure {
    issues: Vec<AnalysisIssue>,
    frames_processed: usize,
}

impl Failure {
    fn new(issue: AnalysisIssue) -> Self {
        Self {
            issues: vec![issue],
            frames_processed: 0,
        }
    }

    fn after(mut self, frames_processed: usize) -> Self {
        self.frames_processed = frames_processed;
        self
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State stays consistent across a panic; every critical section is a single map operation
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Inner {
    config: EngineConfig,
    validator: Validator,
    registry: AnalyzerRegistry,
    source: Arc<dyn FrameSource>,
    processor: FrameBatchProcessor,
    evaluator: ConfidenceEvaluator,
    segmenter: PhaseSegmenter,
    feedback: FeedbackGenerator,
    aggregator: ScoreAggregator,
    store: Arc<dyn ResultStore>,
    cache: Mutex<ResultCache>,
    in_flight: Mutex<HashMap<Fingerprint, InFlight>>,
}

/// Removes the fingerprint from the in-flight map when the computation ends,
/// including by panic
struct InFlightGuard {
    inner: Arc<Inner>,
    fingerprint: Fingerprint,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.inner.in_flight).remove(&self.fingerprint);
    }
}

/// Request-level façade over the analysis pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn FrameSource>,
        detector: Arc<dyn PoseDetector>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self, EngineError> {
        let registry = AnalyzerRegistry::with_defaults(&config.analyzer);
        Self::with_registry(config, registry, source, detector, store)
    }

    /// Engine with a caller-supplied analyzer registry
    pub fn with_registry(
        config: EngineConfig,
        registry: AnalyzerRegistry,
        source: Arc<dyn FrameSource>,
        detector: Arc<dyn PoseDetector>,
        store: Arc<dyn ResultStore>,
    ) -> Result<Self, EngineError> {
        let segmenter = PhaseSegmenter::new(config.phases.clone())?;
        let feedback = FeedbackGenerator::new(config.feedback.clone())?;

        info!(
            "Creating analysis engine: {} analyzers, batch size {}, cache capacity {}",
            registry.supported().len(),
            config.performance.batch_size,
            config.cache.capacity
        );

        Ok(Self {
            inner: Arc::new(Inner {
                validator: Validator::new(config.validation.clone()),
                processor: FrameBatchProcessor::new(config.performance.clone(), detector),
                evaluator: ConfidenceEvaluator::new(config.gate.clone()),
                cache: Mutex::new(ResultCache::new(&config.cache)),
                in_flight: Mutex::new(HashMap::new()),
                aggregator: ScoreAggregator::new(),
                registry,
                source,
                segmenter,
                feedback,
                store,
                config,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn supported_movements(&self) -> Vec<MovementType> {
        self.inner.registry.supported()
    }

    /// Analyze a movement given by name
    pub async fn analyze_named(&self, video: VideoHandle, movement: &str, options: AnalysisOptions) -> AnalysisResult {
        match movement.parse::<MovementType>() {
            Ok(movement) => self.analyze(video, movement, options).await,
            Err(e) => {
                let fingerprint = Fingerprint::from_parts(&video, movement);
                warn!("Rejecting {}: {}", fingerprint, e);
                metrics::counter!("movement_analyses_total", "outcome" => "failure").increment(1);
                AnalysisResult::failed(
                    fingerprint,
                    vec![AnalysisIssue::fatal(AnalysisErrorKind::UnsupportedMovementType, e.to_string())],
                    0,
                    0,
                )
            }
        }
    }

    /// Analyze `video` as `movement`. Failures are reported through the
    /// result's success flag and error list.
    pub async fn analyze(&self, video: VideoHandle, movement: MovementType, options: AnalysisOptions) -> AnalysisResult {
        let fingerprint = Fingerprint::new(&video, movement);

        if let Some(cached) = lock(&self.inner.cache).get(&fingerprint) {
            debug!("Cache hit for {}", fingerprint);
            metrics::counter!("analysis_cache_hits_total").increment(1);
            return cached;
        }

        let shared = {
            let mut in_flight = lock(&self.inner.in_flight);
            match in_flight.get(&fingerprint) {
                Some(existing) => {
                    debug!("Joining in-flight analysis for {}", fingerprint);
                    metrics::counter!("analysis_dedup_joins_total").increment(1);
                    existing.clone()
                }
                None => {
                    // A run may have finished between the first cache check and this lock
                    if let Some(cached) = lock(&self.inner.cache).get(&fingerprint) {
                        debug!("Cache hit for {} after its run completed", fingerprint);
                        metrics::counter!("analysis_cache_hits_total").increment(1);
                        return cached;
                    }
                    let shared = self.spawn(fingerprint.clone(), video, movement, options);
                    in_flight.insert(fingerprint, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    fn spawn(&self, fingerprint: Fingerprint, video: VideoHandle, movement: MovementType, options: AnalysisOptions) -> InFlight {
        let inner = self.inner.clone();
        let key = fingerprint.clone();
        let handle = tokio::spawn(async move {
            let _guard = InFlightGuard {
                inner: inner.clone(),
                fingerprint: key.clone(),
            };
            inner.compute(key, video, movement, options).await
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Analysis task for {} failed: {}", fingerprint, e);
                    metrics::counter!("movement_analyses_total", "outcome" => "failure").increment(1);
                    AnalysisResult::failed(
                        fingerprint,
                        vec![AnalysisIssue::recoverable(
                            AnalysisErrorKind::Internal,
                            format!("analysis task failed: {}", e),
                        )],
                        0,
                        0,
                    )
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Most recent history records
    pub async fn history(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        self.inner.store.list_recent(limit).await
    }

    /// Most recent history records of one video
    pub async fn video_history(&self, video_id: &str, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        self.inner.store.list_for_video(video_id, limit).await
    }

    pub async fn history_count(&self) -> Result<usize, StorageError> {
        self.inner.store.count().await
    }

    /// Drop a cached result; returns whether one was present
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        lock(&self.inner.cache).remove(fingerprint)
    }

    pub fn cache_len(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    pub fn in_flight_len(&self) -> usize {
        lock(&self.inner.in_flight).len()
    }
}

impl Inner {
    async fn compute(
        &self,
        fingerprint: Fingerprint,
        video: VideoHandle,
        movement: MovementType,
        options: AnalysisOptions,
    ) -> AnalysisResult {
        let started = Instant::now();
        let outcome = self.run(&fingerprint, &video, movement, &options).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        metrics::histogram!("movement_analysis_duration_ms").record(elapsed_ms as f64);

        match outcome {
            Ok(mut result) => {
                result.processing_time_ms = elapsed_ms;
                if options.save_to_history {
                    if let Err(e) = self.save(&video, &result).await {
                        warn!("History write for {} failed: {}", fingerprint, e);
                        result.warnings.push(format!("Result was not saved to history: {}", e));
                    }
                }
                info!(
                    "Analysis {} succeeded in {}ms: score {:?}, {} frames",
                    fingerprint,
                    elapsed_ms,
                    result.overall_score(),
                    result.frames_processed
                );
                metrics::counter!("movement_analyses_total", "outcome" => "success").increment(1);
                lock(&self.cache).insert(fingerprint, result.clone());
                result
            }
            Err(failure) => {
                let kinds: Vec<&str> = failure.issues.iter().map(|i| i.kind.as_str()).collect();
                info!("Analysis {} failed in {}ms: {:?}", fingerprint, elapsed_ms, kinds);
                metrics::counter!("movement_analyses_total", "outcome" => "failure").increment(1);
                AnalysisResult::failed(fingerprint, failure.issues, failure.frames_processed, elapsed_ms)
            }
        }
    }

    async fn save(&self, video: &VideoHandle, result: &AnalysisResult) -> Result<(), StorageError> {
        let Some(analysis) = &result.analysis else {
            return Ok(());
        };
        let record = AnalysisRecord::new(
            result.fingerprint.as_str(),
            video.video_id.clone(),
            video.user_id.clone(),
            analysis.movement.as_str(),
            analysis.overall_score,
            analysis.errors.len(),
        );
        self.store.append(record).await
    }

    async fn run(
        &self,
        fingerprint: &Fingerprint,
        video: &VideoHandle,
        movement: MovementType,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult, Failure> {
        let extraction = &options.frame_extraction;

        let validation = self.validator.validate(video, extraction);
        if !validation.valid {
            return Err(Failure {
                issues: validation
                    .errors
                    .iter()
                    .map(|e| AnalysisIssue::fatal(AnalysisErrorKind::VideoValidationFailed, e.to_string()))
                    .collect(),
                frames_processed: 0,
            });
        }

        // Resolved before any detection so unsupported movements cost nothing
        let analyzer = self
            .registry
            .get(movement)
            .map_err(|e| Failure::new(AnalysisIssue::fatal(AnalysisErrorKind::NotImplemented, e.to_string())))?;

        let frames = self.source.frames(video, extraction).await.map_err(|e| {
            Failure::new(AnalysisIssue::fatal(AnalysisErrorKind::VideoValidationFailed, e.to_string()))
        })?;
        if frames.is_empty() {
            return Err(Failure::new(AnalysisIssue::fatal(
                AnalysisErrorKind::InsufficientFrames,
                format!("no frames could be extracted from {}", video.video_id),
            )));
        }

        let batch = self.processor.process(&frames).await;
        let confidence = self.evaluator.evaluate(&batch.sequence, batch.dispatched);

        if let Err(e) = self.evaluator.gate(&confidence) {
            let kind = match e {
                PipelineError::InsufficientCoverage { .. } => AnalysisErrorKind::InsufficientPoseCoverage,
                _ => AnalysisErrorKind::InsufficientFrames,
            };
            let mut issues = vec![AnalysisIssue::fatal(kind, e.to_string())];
            if batch.failed > 0 {
                issues.push(AnalysisIssue::recoverable(
                    AnalysisErrorKind::PoseDetectionFailed,
                    format!("pose detection failed on {} of {} frames", batch.failed, batch.dispatched),
                ));
            }
            return Err(Failure {
                issues,
                frames_processed: batch.dispatched,
            });
        }

        let sequence = &batch.sequence;
        let joint_angles: Vec<JointAngles> = sequence.iter().map(compute_joint_angles).collect();
        let phases = self.segmenter.segment(sequence, &movement.segmentation());

        let assessment = analyzer
            .analyze(sequence, &joint_angles, &phases)
            .map_err(|e| {
                let kind = match e {
                    AnalysisError::EmptySequence => AnalysisErrorKind::InsufficientFrames,
                    _ => AnalysisErrorKind::Internal,
                };
                Failure::new(AnalysisIssue::fatal(kind, e.to_string())).after(batch.dispatched)
            })?;

        let feedback = self.feedback.generate(movement, &assessment);
        let breakdown = self
            .aggregator
            .aggregate(&assessment.sub_scores, &WeightVector::for_movement(movement), &feedback.errors);

        let mut warnings = self.evaluator.warnings(&confidence);
        if phases.degraded {
            warnings.push("Movement phases could not be detected; an even split was used".to_string());
        }
        let clamped = joint_angles.iter().filter(|a| !a.clamped.is_empty()).count();
        if clamped > 0 {
            warnings.push(format!("{} frames had implausible joint angles that were clamped", clamped));
        }

        debug!(
            "{}: {} phases, {} repetitions, weighted {:.1}, penalty {:.0}",
            fingerprint,
            phases.phases.len(),
            phases.repetitions,
            breakdown.weighted,
            breakdown.penalty
        );

        Ok(AnalysisResult {
            success: true,
            fingerprint: fingerprint.clone(),
            analysis: Some(FormAnalysis {
                movement,
                overall_score: breakdown.overall,
                breakdown,
                sub_scores: assessment.sub_scores,
                metrics: assessment.metrics,
                phases: phases.phases,
                repetitions: phases.repetitions,
                joint_angles,
                errors: feedback.errors,
                suggestions: feedback.suggestions,
            }),
            errors: Vec::new(),
            warnings,
            processing_time_ms: 0,
            frames_processed: batch.dispatched,
            confidence,
        })
    }
}
