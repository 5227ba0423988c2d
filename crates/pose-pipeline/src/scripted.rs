//! Deterministic detector for mock mode and tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pose_frame::{FrameHandle, PoseFrame, SyntheticPose};
use tokio::time::{sleep, Duration};

use crate::detector::PoseDetector;
use crate::PipelineError;

type PoseFn = Box<dyn Fn(&FrameHandle) -> PoseFrame + Send + Sync>;
type DelayFn = Box<dyn Fn(u32) -> u64 + Send + Sync>;

/// Pose of a repeating bodyweight squat, `period` frames per repetition.
///
/// Each repetition stands still, descends, holds the bottom, rises and
/// stands again.
pub fn squat_cycle_pose(index: u32, timestamp_ms: u64, period: u32) -> PoseFrame {
    let period = period.max(1);
    let f = (index % period) as f64 / period as f64;
    let depth = if f < 0.10 {
        0.0
    } else if f < 0.45 {
        (f - 0.10) / 0.35
    } else if f < 0.60 {
        1.0
    } else if f < 0.95 {
        1.0 - (f - 0.60) / 0.35
    } else {
        0.0
    };
    SyntheticPose::squat(0.5 + 0.25 * depth, 68.0 * depth, 5.0 + 20.0 * depth).frame(timestamp_ms, index)
}

/// Detector that produces poses from a function of the frame handle.
///
/// Frames listed as failing return a detector error. Counts every call and
/// the highest number of calls in progress at once.
pub struct ScriptedDetector {
    pose: PoseFn,
    failing: HashSet<u32>,
    delay: Option<DelayFn>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(pose: impl Fn(&FrameHandle) -> PoseFrame + Send + Sync + 'static) -> Self {
        Self {
            pose: Box::new(pose),
            failing: HashSet::new(),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Same standing pose for every frame
    pub fn standing() -> Self {
        Self::new(|handle| SyntheticPose::standing(0.5).frame(handle.timestamp_ms, handle.index))
    }

    /// Repeating squat, `period` frames per repetition
    pub fn squat_cycle(period: u32) -> Self {
        Self::new(move |handle| squat_cycle_pose(handle.index, handle.timestamp_ms, period))
    }

    /// Fail detection for these frame indices
    pub fn failing(mut self, indices: impl IntoIterator<Item = u32>) -> Self {
        self.failing.extend(indices);
        self
    }

    /// Delay each call by a per-frame number of milliseconds
    pub fn with_delay(mut self, delay_ms: impl Fn(u32) -> u64 + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay_ms));
        self
    }

    /// Number of detect calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent detect calls seen
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoseDetector for ScriptedDetector {
    async fn detect(&self, frame: &FrameHandle) -> Result<Option<PoseFrame>, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        match &self.delay {
            Some(delay) => sleep(Duration::from_millis(delay(frame.index))).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&frame.index) {
            return Err(PipelineError::Detector(format!("scripted failure on frame {}", frame.index)));
        }
        Ok(Some((self.pose)(frame)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_failures() {
        let detector = ScriptedDetector::standing().failing([1]);
        assert!(detector.detect(&FrameHandle::empty(0, 0)).await.unwrap().is_some());
        assert!(detector.detect(&FrameHandle::empty(1, 100)).await.is_err());
        assert_eq!(detector.calls(), 2);
    }

    #[test]
    fn test_squat_cycle_shape() {
        let top = squat_cycle_pose(0, 0, 30);
        let bottom = squat_cycle_pose(15, 1500, 30);
        assert!(bottom.hip_midpoint().y > top.hip_midpoint().y + 0.2);
        assert_eq!(bottom.timestamp_ms, 1500);
        assert_eq!(squat_cycle_pose(30, 3000, 30).hip_midpoint().y, top.hip_midpoint().y);
    }
}
