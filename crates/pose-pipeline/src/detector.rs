//! Pose detector seam

use async_trait::async_trait;
use pose_frame::{FrameHandle, PoseFrame};

use crate::PipelineError;

/// Finds body landmarks in a single frame.
///
/// `Ok(None)` means the frame was processed but contains no person.
/// Implementations set the returned frame's timestamp and index from the handle.
#[async_trait]
pub trait PoseDetector: Send + Sync {
    async fn detect(&self, frame: &FrameHandle) -> Result<Option<PoseFrame>, PipelineError>;
}
