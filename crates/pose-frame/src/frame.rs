//! Frame handles, per-frame poses and pose sequences

use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::landmark::{BodyPart, Landmark, LANDMARK_COUNT};
use crate::FrameError;

/// A sampled video frame as produced by a frame source.
///
/// The pixel payload is opaque to the analysis core; only the detector reads it.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    /// Absolute index of the frame in the sampled stream
    pub index: u32,
    /// Presentation timestamp (milliseconds)
    pub timestamp_ms: u64,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Encoded or decoded pixel payload
    pub data: Arc<[u8]>,
}

impl FrameHandle {
    pub fn new(index: u32, timestamp_ms: u64, width: u32, height: u32, data: Arc<[u8]>) -> Self {
        Self {
            index,
            timestamp_ms,
            width,
            height,
            data,
        }
    }

    /// Frame without a pixel payload
    pub fn empty(index: u32, timestamp_ms: u64) -> Self {
        Self::new(index, timestamp_ms, 0, 0, Arc::from(Vec::new()))
    }
}

/// All landmarks detected in one video frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseFrame {
    #[serde(serialize_with = "serialize_landmarks")]
    landmarks: [Landmark; LANDMARK_COUNT],
    /// Frame timestamp (milliseconds)
    pub timestamp_ms: u64,
    /// Index of the source frame
    pub frame_index: u32,
}

fn serialize_landmarks<S: Serializer>(landmarks: &[Landmark; LANDMARK_COUNT], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(landmarks)
}

impl PoseFrame {
    /// Create a pose frame from detector output; exactly 33 landmarks are required
    pub fn new(landmarks: Vec<Landmark>, timestamp_ms: u64, frame_index: u32) -> Result<Self, FrameError> {
        let actual = landmarks.len();
        let landmarks: [Landmark; LANDMARK_COUNT] = landmarks.try_into().map_err(|_| FrameError::LandmarkCount {
            expected: LANDMARK_COUNT,
            actual,
        })?;
        Ok(Self::from_array(landmarks, timestamp_ms, frame_index))
    }

    pub fn from_array(landmarks: [Landmark; LANDMARK_COUNT], timestamp_ms: u64, frame_index: u32) -> Self {
        Self {
            landmarks,
            timestamp_ms,
            frame_index,
        }
    }

    /// Rejects a frame with a NaN or infinite coordinate or confidence
    pub fn check_finite(&self) -> Result<(), FrameError> {
        match self.landmarks.iter().position(|l| !l.is_finite()) {
            Some(slot) => Err(FrameError::NonFinite { slot }),
            None => Ok(()),
        }
    }

    pub fn landmark(&self, part: BodyPart) -> &Landmark {
        &self.landmarks[part.index()]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Mean confidence over all slots
    pub fn mean_confidence(&self) -> f64 {
        let total: f64 = self.landmarks.iter().map(|l| l.confidence as f64).sum();
        total / LANDMARK_COUNT as f64
    }

    pub fn hip_midpoint(&self) -> Landmark {
        self.landmark(BodyPart::LeftHip)
            .midpoint(self.landmark(BodyPart::RightHip))
    }

    pub fn shoulder_midpoint(&self) -> Landmark {
        self.landmark(BodyPart::LeftShoulder)
            .midpoint(self.landmark(BodyPart::RightShoulder))
    }

    pub fn ankle_midpoint(&self) -> Landmark {
        self.landmark(BodyPart::LeftAnkle)
            .midpoint(self.landmark(BodyPart::RightAnkle))
    }
}

/// Time-ordered poses of one video. Timestamps never decrease.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoseSequence {
    frames: Vec<PoseFrame>,
}

impl PoseSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from frames already in timestamp order
    pub fn from_frames(frames: Vec<PoseFrame>) -> Result<Self, FrameError> {
        let mut sequence = Self {
            frames: Vec::with_capacity(frames.len()),
        };
        for frame in frames {
            sequence.push(frame)?;
        }
        Ok(sequence)
    }

    /// Append a frame, rejecting one that goes back in time
    pub fn push(&mut self, frame: PoseFrame) -> Result<(), FrameError> {
        if let Some(last) = self.frames.last() {
            if frame.timestamp_ms < last.timestamp_ms {
                return Err(FrameError::OutOfOrder {
                    previous: last.timestamp_ms,
                    next: frame.timestamp_ms,
                });
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[PoseFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&PoseFrame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoseFrame> {
        self.frames.iter()
    }

    /// Timestamp of the frame at `index`, 0 when out of range
    pub fn timestamp_at(&self, index: usize) -> u64 {
        self.frames.get(index).map(|f| f.timestamp_ms).unwrap_or(0)
    }

    /// Time covered from the first to the last frame
    pub fn duration_ms(&self) -> u64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame_at(ts: u64, index: u32) -> PoseFrame {
        PoseFrame::new(vec![Landmark::new(0.5, 0.5, 0.8); LANDMARK_COUNT], ts, index).unwrap()
    }

    #[test]
    fn test_landmark_count_enforced() {
        let err = PoseFrame::new(vec![Landmark::default(); 17], 0, 0).unwrap_err();
        assert_eq!(
            err,
            FrameError::LandmarkCount {
                expected: 33,
                actual: 17
            }
        );
    }

    #[test]
    fn test_serializes_every_slot() {
        let json = serde_json::to_value(frame_at(40, 2)).unwrap();
        assert_eq!(json["landmarks"].as_array().map(Vec::len), Some(LANDMARK_COUNT));
        assert_eq!(json["timestamp_ms"], 40);
    }

    #[test]
    fn test_non_finite_landmark_detected() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.8); LANDMARK_COUNT];
        landmarks[25].x = f32::NAN;
        let frame = PoseFrame::new(landmarks, 0, 0).unwrap();
        assert_eq!(frame.check_finite(), Err(FrameError::NonFinite { slot: 25 }));
        assert_eq!(frame_at(0, 0).check_finite(), Ok(()));

        let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.8); LANDMARK_COUNT];
        landmarks[0].confidence = f32::NAN;
        let frame = PoseFrame::new(landmarks, 0, 0).unwrap();
        assert_eq!(frame.check_finite(), Err(FrameError::NonFinite { slot: 0 }));
    }

    #[test]
    fn test_sequence_rejects_out_of_order() {
        let mut sequence = PoseSequence::new();
        sequence.push(frame_at(100, 1)).unwrap();
        sequence.push(frame_at(100, 2)).unwrap();
        let err = sequence.push(frame_at(50, 3)).unwrap_err();
        assert!(matches!(err, FrameError::OutOfOrder { previous: 100, next: 50 }));
        assert_eq!(sequence.len(), 2);
    }

    #[test]
    fn test_sequence_duration() {
        let sequence =
            PoseSequence::from_frames(vec![frame_at(200, 0), frame_at(300, 1), frame_at(900, 2)]).unwrap();
        assert_eq!(sequence.duration_ms(), 700);
        assert_eq!(sequence.timestamp_at(1), 300);
        assert_eq!(sequence.timestamp_at(9), 0);
        assert!(PoseSequence::new().is_empty());
    }

    #[test]
    fn test_mean_confidence() {
        let frame = frame_at(0, 0);
        assert!((frame.mean_confidence() - 0.8).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_sequence_never_goes_back_in_time(timestamps in prop::collection::vec(0u64..10_000, 0..60)) {
            let mut sequence = PoseSequence::new();
            let mut rejected = 0;
            for (i, ts) in timestamps.iter().enumerate() {
                let last = sequence.frames().last().map(|f| f.timestamp_ms);
                match sequence.push(frame_at(*ts, i as u32)) {
                    Ok(()) => prop_assert!(last.map_or(true, |last| *ts >= last)),
                    Err(_) => {
                        prop_assert!(last.map_or(false, |last| *ts < last));
                        rejected += 1;
                    }
                }
            }
            prop_assert_eq!(sequence.len() + rejected, timestamps.len());
            prop_assert!(sequence.frames().windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
        }
    }
}
