//! Frame source seam

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::frame::FrameHandle;
use crate::{FrameError, FrameExtraction, VideoHandle};

/// Produces the ordered, timestamped frames of a video.
///
/// Decoding is the implementor's business; the analysis core only sees handles.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn frames(
        &self,
        video: &VideoHandle,
        extraction: &FrameExtraction,
    ) -> Result<Vec<FrameHandle>, FrameError>;
}

/// Frame source that yields a fixed number of empty frames for any video.
///
/// Used in mock mode and tests; counts how often it was asked for frames.
pub struct StaticFrameSource {
    /// Frames available per video before sampling limits apply
    frame_count: u32,
    /// Number of `frames` calls served
    calls: AtomicUsize,
}

impl StaticFrameSource {
    pub fn new(frame_count: u32) -> Self {
        Self {
            frame_count,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn frames(
        &self,
        video: &VideoHandle,
        extraction: &FrameExtraction,
    ) -> Result<Vec<FrameHandle>, FrameError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let interval_ms = extraction.frame_interval_ms();
        let start_ms = extraction
            .start_time_s
            .map(|s| (s * 1000.0).round() as u64)
            .unwrap_or(0);

        let mut count = self.frame_count.min(extraction.max_frames);
        if let (Some(start), Some(end)) = (extraction.start_time_s, extraction.end_time_s) {
            let window_frames = ((end - start).max(0.0) * extraction.frame_rate).floor() as u32;
            count = count.min(window_frames);
        }

        debug!("Serving {} frames for video {}", count, video.video_id);

        Ok((0..count)
            .map(|i| FrameHandle::empty(i, start_ms + i as u64 * interval_ms))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_respects_limits() {
        let source = StaticFrameSource::new(50);
        let video = VideoHandle::new("v");

        let frames = source
            .frames(
                &video,
                &FrameExtraction {
                    frame_rate: 10.0,
                    max_frames: 30,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(frames.len(), 30);
        assert_eq!(frames[3].timestamp_ms, 300);

        let windowed = source
            .frames(
                &video,
                &FrameExtraction {
                    frame_rate: 10.0,
                    max_frames: 30,
                    start_time_s: Some(1.0),
                    end_time_s: Some(2.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(windowed.len(), 10);
        assert_eq!(windowed[0].timestamp_ms, 1000);
        assert_eq!(source.calls(), 2);
    }
}
