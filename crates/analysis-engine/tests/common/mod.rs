//! Shared doubles for engine integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use analysis_engine::{EngineConfig, Orchestrator};
use async_trait::async_trait;
use pose_frame::{FrameError, FrameExtraction, FrameHandle, FrameSource, PoseFrame, StaticFrameSource, SyntheticPose, VideoHandle};
use pose_pipeline::ScriptedDetector;
use storage::{AnalysisRecord, InMemoryResultStore, ResultStore, StorageError};

/// Squat clip of 30 frames at 100 ms: hips drop over frames 0-14, hold
/// 15-19 and rise 20-29. The deepest hip angle, `bottom_hip`, is at frame 17.
pub fn scenario_pose(index: u32, timestamp_ms: u64, bottom_hip: f64) -> PoseFrame {
    let i = index as i64;
    let deep = 180.0 - bottom_hip;
    let hip_y = match i {
        0..=14 => 0.5 + 0.02 * i as f64,
        15..=19 => 0.78,
        _ => 0.78 - 0.02 * (i - 19) as f64,
    };
    let flex = match i {
        17 => deep,
        15..=19 => deep - 5.0,
        _ => (deep - 5.0) * (hip_y - 0.5) / 0.28,
    };
    let torso = (flex * 0.3).min(30.0);
    SyntheticPose::squat(hip_y, flex - torso, torso).frame(timestamp_ms, index)
}

pub fn scenario_detector(bottom_hip: f64) -> ScriptedDetector {
    ScriptedDetector::new(move |handle: &FrameHandle| scenario_pose(handle.index, handle.timestamp_ms, bottom_hip))
}

pub struct Harness {
    pub engine: Orchestrator,
    pub source: Arc<StaticFrameSource>,
    pub detector: Arc<ScriptedDetector>,
    pub store: Arc<InMemoryResultStore>,
}

pub fn harness(detector: ScriptedDetector) -> Harness {
    harness_with(EngineConfig::default(), detector)
}

pub fn harness_with(config: EngineConfig, detector: ScriptedDetector) -> Harness {
    let source = Arc::new(StaticFrameSource::new(30));
    let detector = Arc::new(detector);
    let store = Arc::new(InMemoryResultStore::default());
    let engine = Orchestrator::new(config, source.clone(), detector.clone(), store.clone()).unwrap();
    Harness {
        engine,
        source,
        detector,
        store,
    }
}

/// Store whose writes always fail
pub struct BrokenStore;

#[async_trait]
impl ResultStore for BrokenStore {
    async fn append(&self, _record: AnalysisRecord) -> Result<(), StorageError> {
        Err(StorageError::Backend("disk full".to_string()))
    }

    async fn list_recent(&self, _limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        Ok(Vec::new())
    }

    async fn list_for_video(&self, _video_id: &str, _limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(0)
    }
}

/// Frame source that panics on every call
#[derive(Default)]
pub struct PanickingSource {
    pub calls: AtomicUsize,
}

#[async_trait]
impl FrameSource for PanickingSource {
    async fn frames(&self, _video: &VideoHandle, _extraction: &FrameExtraction) -> Result<Vec<FrameHandle>, FrameError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("decoder crashed");
    }
}
