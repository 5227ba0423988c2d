//! Frame Batch Processor
//!
//! Frames are dispatched in fixed-size batches. Calls within a batch run
//! concurrently and fail independently; the next batch starts only once
//! every call of the current one has settled.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use pose_frame::{FrameHandle, PoseFrame, PoseSequence};
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::detector::PoseDetector;
use crate::PipelineError;

/// Detection performance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum concurrent detector calls
    pub batch_size: usize,
    /// Only frames whose index is a multiple of the stride are detected
    pub frame_stride: u32,
    /// Mean landmark confidence below which a detection counts as no pose
    pub confidence_threshold: f64,
    /// Per-frame detector timeout (milliseconds)
    pub detector_timeout_ms: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            frame_stride: 1,
            confidence_threshold: 0.5,
            detector_timeout_ms: 2000,
        }
    }
}

/// Result of one processing run
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub sequence: PoseSequence,
    /// Frames sent to the detector
    pub dispatched: usize,
    /// Frames skipped by the stride
    pub skipped: usize,
    /// Dispatched frames that produced no usable pose
    pub failed: usize,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Drives a pose detector over an ordered frame list
pub struct FrameBatchProcessor {
    config: PerformanceConfig,
    detector: Arc<dyn PoseDetector>,
}

impl FrameBatchProcessor {
    pub fn new(config: PerformanceConfig, detector: Arc<dyn PoseDetector>) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    async fn detect_one(&self, frame: &FrameHandle) -> Result<PoseFrame, PipelineError> {
        let limit = Duration::from_millis(self.config.detector_timeout_ms);
        // A panicking detector call loses its frame only
        let detection = AssertUnwindSafe(self.detector.detect(frame)).catch_unwind();
        let pose = timeout(limit, detection)
            .await
            .map_err(|_| PipelineError::Timeout(self.config.detector_timeout_ms))?
            .map_err(|payload| PipelineError::Panicked(panic_message(payload.as_ref())))??
            .ok_or(PipelineError::NoPose(frame.index))?;

        pose.check_finite()?;
        if pose.mean_confidence() < self.config.confidence_threshold {
            debug!(
                "Frame {} pose confidence {:.2} below threshold",
                frame.index,
                pose.mean_confidence()
            );
            return Err(PipelineError::NoPose(frame.index));
        }
        Ok(pose)
    }

    /// Detect poses in `frames`, keeping input order and dropping failures
    pub async fn process(&self, frames: &[FrameHandle]) -> BatchOutcome {
        let stride = self.config.frame_stride.max(1);
        let batch_size = self.config.batch_size.max(1);

        let selected: Vec<&FrameHandle> = frames.iter().filter(|f| f.index % stride == 0).collect();
        let mut outcome = BatchOutcome {
            dispatched: selected.len(),
            skipped: frames.len() - selected.len(),
            ..Default::default()
        };

        for (batch_index, batch) in selected.chunks(batch_size).enumerate() {
            debug!("Dispatching batch {} with {} frames", batch_index, batch.len());

            // join_all yields results in input order regardless of completion order
            let results = join_all(batch.iter().map(|frame| self.detect_one(frame))).await;

            for (frame, result) in batch.iter().zip(results) {
                let pushed = result.and_then(|pose| outcome.sequence.push(pose).map_err(PipelineError::from));
                if let Err(e) = pushed {
                    warn!("Dropping frame {} at {}ms: {}", frame.index, frame.timestamp_ms, e);
                    metrics::counter!("pose_detection_failures_total").increment(1);
                    outcome.failed += 1;
                }
            }
        }

        debug!(
            "Detected {} poses from {} dispatched frames ({} failed, {} skipped)",
            outcome.sequence.len(),
            outcome.dispatched,
            outcome.failed,
            outcome.skipped
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedDetector;
    use pose_frame::{BodyPart, SyntheticPose};

    fn frames(count: u32) -> Vec<FrameHandle> {
        (0..count).map(|i| FrameHandle::empty(i, i as u64 * 100)).collect()
    }

    #[tokio::test]
    async fn test_failures_are_dropped_not_fatal() {
        let detector = Arc::new(ScriptedDetector::standing().failing([2, 5, 7]));
        let processor = FrameBatchProcessor::new(PerformanceConfig::default(), detector.clone());

        let outcome = processor.process(&frames(10)).await;
        assert_eq!(outcome.sequence.len(), 7);
        assert_eq!(outcome.failed, 3);
        assert_eq!(outcome.dispatched, 10);
        assert_eq!(detector.calls(), 10);
    }

    #[tokio::test]
    async fn test_panic_on_one_frame_drops_only_that_frame() {
        let detector = Arc::new(ScriptedDetector::new(|handle| {
            if handle.index == 3 {
                panic!("model crashed on one frame");
            }
            SyntheticPose::standing(0.5).frame(handle.timestamp_ms, handle.index)
        }));
        let processor = FrameBatchProcessor::new(PerformanceConfig::default(), detector.clone());

        let outcome = processor.process(&frames(10)).await;
        assert_eq!(outcome.sequence.len(), 9);
        assert_eq!(outcome.failed, 1);
        assert_eq!(detector.calls(), 10);
        assert!(outcome.sequence.iter().all(|f| f.frame_index != 3));
    }

    #[tokio::test]
    async fn test_non_finite_detection_rejected() {
        let detector = Arc::new(ScriptedDetector::new(|handle| {
            let mut landmarks = SyntheticPose::standing(0.5).landmarks();
            match handle.index {
                1 => landmarks[BodyPart::LeftKnee.index()].x = f32::NAN,
                2 => landmarks[BodyPart::Nose.index()].confidence = f32::NAN,
                _ => {}
            }
            PoseFrame::from_array(landmarks, handle.timestamp_ms, handle.index)
        }));
        let processor = FrameBatchProcessor::new(PerformanceConfig::default(), detector);

        let outcome = processor.process(&frames(4)).await;
        let indices: Vec<u32> = outcome.sequence.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, vec![0, 3]);
        assert_eq!(outcome.failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved_despite_completion_order() {
        // Earlier frames finish last
        let detector = Arc::new(ScriptedDetector::standing().with_delay(|index| 100 - index as u64 * 10));
        let processor = FrameBatchProcessor::new(
            PerformanceConfig {
                batch_size: 4,
                ..Default::default()
            },
            detector,
        );

        let outcome = processor.process(&frames(8)).await;
        let indices: Vec<u32> = outcome.sequence.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_stride_skips_without_detection() {
        let detector = Arc::new(ScriptedDetector::standing());
        let processor = FrameBatchProcessor::new(
            PerformanceConfig {
                frame_stride: 3,
                ..Default::default()
            },
            detector.clone(),
        );

        let outcome = processor.process(&frames(10)).await;
        assert_eq!(detector.calls(), 4);
        assert_eq!(outcome.skipped, 6);
        assert_eq!(outcome.failed, 0);
        let indices: Vec<u32> = outcome.sequence.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, vec![0, 3, 6, 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let detector = Arc::new(ScriptedDetector::standing().with_delay(|index| if index == 1 { 5_000 } else { 0 }));
        let processor = FrameBatchProcessor::new(PerformanceConfig::default(), detector);

        let outcome = processor.process(&frames(3)).await;
        assert_eq!(outcome.sequence.len(), 2);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn test_low_confidence_detection_rejected() {
        let detector = Arc::new(ScriptedDetector::new(|handle| {
            let confidence = if handle.index % 2 == 0 { 0.9 } else { 0.3 };
            SyntheticPose::standing(0.5)
                .with_confidence(confidence)
                .frame(handle.timestamp_ms, handle.index)
        }));
        let processor = FrameBatchProcessor::new(PerformanceConfig::default(), detector);

        let outcome = processor.process(&frames(6)).await;
        assert_eq!(outcome.sequence.len(), 3);
        assert_eq!(outcome.failed, 3);
    }

    #[tokio::test]
    async fn test_batches_bound_concurrency() {
        let detector = Arc::new(ScriptedDetector::standing());
        let processor = FrameBatchProcessor::new(
            PerformanceConfig {
                batch_size: 3,
                ..Default::default()
            },
            detector.clone(),
        );

        processor.process(&frames(10)).await;
        assert_eq!(detector.max_concurrent(), 3);
    }
}
