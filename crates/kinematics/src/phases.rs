//! Phase Segmenter
//!
//! Splits a pose sequence into labelled, non-overlapping phases. Cyclic
//! movements run a velocity state machine over the height of a reference
//! landmark; ballistic sport movements use fixed proportional windows of
//! the sequence duration.

use pose_frame::PoseSequence;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::MedianFilter;
use crate::KinematicsError;

/// Phase labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Standing,
    Descent,
    Bottom,
    Ascent,
    Windup,
    Stride,
    ArmCocking,
    Acceleration,
    Deceleration,
    FollowThrough,
    Address,
    Backswing,
    Downswing,
    Impact,
}

/// A contiguous labelled interval of the sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementPhase {
    pub kind: PhaseKind,
    pub start_frame: usize,
    /// Inclusive
    pub end_frame: usize,
    pub duration_ms: u64,
}

impl MovementPhase {
    pub fn frame_count(&self) -> usize {
        self.end_frame - self.start_frame + 1
    }

    pub fn contains(&self, frame: usize) -> bool {
        frame >= self.start_frame && frame <= self.end_frame
    }
}

/// Landmark whose height drives velocity segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePoint {
    HipMidpoint,
    ShoulderMidpoint,
}

/// How a movement is segmented
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segmentation {
    /// standing → descent → bottom → ascent → standing, repeated
    Velocity(ReferencePoint),
    /// Consecutive windows covering the given fractions of total duration
    Proportional(&'static [(PhaseKind, f64)]),
}

impl Segmentation {
    /// Check that proportional windows are positive and sum to 1
    pub fn validate(&self) -> Result<(), KinematicsError> {
        if let Segmentation::Proportional(windows) = self {
            let total: f64 = windows.iter().map(|(_, f)| f).sum();
            if windows.is_empty() || windows.iter().any(|(_, f)| *f <= 0.0) || (total - 1.0).abs() > 1e-9 {
                return Err(KinematicsError::InvalidProportions(total));
            }
        }
        Ok(())
    }
}

/// Segmentation output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseSegmentation {
    pub phases: Vec<MovementPhase>,
    /// Completed bottom → ascent transitions
    pub repetitions: u32,
    /// The even-split fallback was used
    pub degraded: bool,
}

impl PhaseSegmentation {
    pub fn first(&self, kind: PhaseKind) -> Option<&MovementPhase> {
        self.phases.iter().find(|p| p.kind == kind)
    }

    /// Summed duration of every phase of a kind
    pub fn total_duration_ms(&self, kind: PhaseKind) -> u64 {
        self.phases
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.duration_ms)
            .sum()
    }

    pub fn phase_at(&self, frame: usize) -> Option<PhaseKind> {
        self.phases.iter().find(|p| p.contains(frame)).map(|p| p.kind)
    }
}

/// Velocity state machine thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Downward height velocity that starts a descent (units/s)
    pub descent_velocity: f64,
    /// Upward height velocity that starts an ascent (units/s)
    pub ascent_velocity: f64,
    /// Velocity magnitude treated as stationary (units/s)
    pub still_velocity: f64,
    /// Frames a descent/ascent signal must persist
    pub smoothing_window: usize,
    /// Frames of stillness needed to enter the bottom phase
    pub min_dwell_frames: usize,
    /// Height distance from the first frame that counts as back to standing
    pub baseline_tolerance: f64,
    /// Median window applied to the height signal (1 disables)
    pub median_window: usize,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            descent_velocity: 0.05,
            ascent_velocity: 0.05,
            still_velocity: 0.02,
            smoothing_window: 3,
            min_dwell_frames: 3,
            baseline_tolerance: 0.03,
            median_window: 1,
        }
    }
}

/// Phase segmenter
pub struct PhaseSegmenter {
    config: PhaseConfig,
    filter: MedianFilter,
}

impl PhaseSegmenter {
    pub fn new(config: PhaseConfig) -> Result<Self, KinematicsError> {
        let filter = MedianFilter::new(config.median_window)?;
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    /// Segment a sequence with the given layout
    pub fn segment(&self, sequence: &PoseSequence, segmentation: &Segmentation) -> PhaseSegmentation {
        if sequence.is_empty() {
            return PhaseSegmentation::default();
        }
        match segmentation {
            Segmentation::Velocity(reference) => self.segment_cyclic(sequence, *reference),
            Segmentation::Proportional(windows) => segment_proportional(sequence, windows),
        }
    }

    fn segment_cyclic(&self, sequence: &PoseSequence, reference: ReferencePoint) -> PhaseSegmentation {
        let raw: Vec<f64> = sequence
            .iter()
            .map(|frame| match reference {
                ReferencePoint::HipMidpoint => frame.hip_midpoint().height(),
                ReferencePoint::ShoulderMidpoint => frame.shoulder_midpoint().height(),
            })
            .collect();
        let heights = self.filter.smooth(&raw);
        let velocity = height_velocity(sequence, &heights);
        let baseline = heights[0];
        let cfg = &self.config;

        let mut state = PhaseKind::Standing;
        let mut phase_start = 0;
        let mut run = 0;
        let mut phases = Vec::new();
        let mut repetitions = 0;
        let mut reached_bottom = false;

        for i in 1..heights.len() {
            let v = velocity[i];
            let (holds, needed, next) = match state {
                PhaseKind::Descent => (v.abs() <= cfg.still_velocity, cfg.min_dwell_frames, PhaseKind::Bottom),
                PhaseKind::Bottom => (v > cfg.ascent_velocity, cfg.smoothing_window, PhaseKind::Ascent),
                PhaseKind::Ascent => (
                    v.abs() <= cfg.still_velocity && (heights[i] - baseline).abs() <= cfg.baseline_tolerance,
                    cfg.smoothing_window,
                    PhaseKind::Standing,
                ),
                _ => (v < -cfg.descent_velocity, cfg.smoothing_window, PhaseKind::Descent),
            };

            run = if holds { run + 1 } else { 0 };
            if run < needed.max(1) {
                continue;
            }

            // The new phase begins at the first frame of the qualifying run
            let start = i + 1 - run;
            phases.push(phase(sequence, state, phase_start, start - 1));
            match next {
                PhaseKind::Bottom => reached_bottom = true,
                PhaseKind::Ascent => repetitions += 1,
                _ => {}
            }
            state = next;
            phase_start = start;
            run = 0;
        }
        phases.push(phase(sequence, state, phase_start, heights.len() - 1));

        if !reached_bottom {
            debug!(
                "No bottom detected in {} frames, falling back to even split",
                sequence.len()
            );
            return even_split(sequence);
        }

        PhaseSegmentation {
            phases,
            repetitions,
            degraded: false,
        }
    }
}

impl Default for PhaseSegmenter {
    fn default() -> Self {
        Self {
            config: PhaseConfig::default(),
            filter: MedianFilter::default(),
        }
    }
}

fn phase(sequence: &PoseSequence, kind: PhaseKind, start_frame: usize, end_frame: usize) -> MovementPhase {
    MovementPhase {
        kind,
        start_frame,
        end_frame,
        duration_ms: sequence.timestamp_at(end_frame) - sequence.timestamp_at(start_frame),
    }
}

/// Height change per second between consecutive frames (0 for the first frame)
fn height_velocity(sequence: &PoseSequence, heights: &[f64]) -> Vec<f64> {
    let mut velocity = vec![0.0; heights.len()];
    for i in 1..heights.len() {
        let dt_ms = sequence.timestamp_at(i).saturating_sub(sequence.timestamp_at(i - 1));
        if dt_ms > 0 {
            velocity[i] = (heights[i] - heights[i - 1]) / (dt_ms as f64 / 1000.0);
        }
    }
    velocity
}

/// Best-effort descent/bottom/ascent split into equal frame counts
fn even_split(sequence: &PoseSequence) -> PhaseSegmentation {
    let n = sequence.len();
    let (base, extra) = (n / 3, n % 3);
    let mut phases = Vec::with_capacity(3);
    let mut start = 0;
    for (i, kind) in [PhaseKind::Descent, PhaseKind::Bottom, PhaseKind::Ascent].into_iter().enumerate() {
        let len = base + usize::from(i < extra);
        if len == 0 {
            continue;
        }
        phases.push(phase(sequence, kind, start, start + len - 1));
        start += len;
    }

    PhaseSegmentation {
        phases,
        // No bottom to ascent transition was observed
        repetitions: 0,
        degraded: true,
    }
}

/// Assign each frame to the window its timestamp falls in
fn segment_proportional(sequence: &PoseSequence, windows: &[(PhaseKind, f64)]) -> PhaseSegmentation {
    let n = sequence.len();
    let duration = sequence.duration_ms() as f64;
    let t0 = sequence.timestamp_at(0);

    let mut boundaries = Vec::with_capacity(windows.len());
    let mut cumulative = 0.0;
    for (_, fraction) in windows {
        cumulative += fraction;
        boundaries.push(cumulative);
    }

    let window_of = |i: usize| -> usize {
        // Position in [0, 1); equal timestamps fall back to frame position
        let position = if duration > 0.0 {
            (sequence.timestamp_at(i) - t0) as f64 / duration
        } else {
            i as f64 / n as f64
        };
        boundaries
            .iter()
            .position(|&b| position < b)
            .unwrap_or(windows.len() - 1)
    };

    let mut phases: Vec<MovementPhase> = Vec::new();
    let mut start = 0;
    let mut current = window_of(0);
    for i in 1..n {
        let w = window_of(i);
        if w != current {
            phases.push(phase(sequence, windows[current].0, start, i - 1));
            start = i;
            current = w;
        }
    }
    phases.push(phase(sequence, windows[current].0, start, n - 1));

    PhaseSegmentation {
        phases,
        repetitions: 1,
        degraded: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_frame::SyntheticPose;

    const PITCH: &[(PhaseKind, f64)] = &[
        (PhaseKind::Windup, 0.25),
        (PhaseKind::Stride, 0.20),
        (PhaseKind::ArmCocking, 0.20),
        (PhaseKind::Acceleration, 0.10),
        (PhaseKind::Deceleration, 0.10),
        (PhaseKind::FollowThrough, 0.15),
    ];

    fn sequence_from_hip_y(hip_y: &[f64]) -> PoseSequence {
        let frames = hip_y
            .iter()
            .enumerate()
            .map(|(i, &y)| SyntheticPose::standing(y).frame(i as u64 * 100, i as u32))
            .collect();
        PoseSequence::from_frames(frames).unwrap()
    }

    fn full_rep() -> Vec<f64> {
        let mut y = vec![0.5; 5];
        y.extend((1..=10).map(|k| 0.5 + 0.02 * k as f64));
        y.extend([0.7; 5]);
        y.extend((1..=10).map(|k| 0.7 - 0.02 * k as f64));
        y.extend([0.5; 5]);
        y
    }

    fn kinds(segmentation: &PhaseSegmentation) -> Vec<PhaseKind> {
        segmentation.phases.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_full_repetition_order() {
        let sequence = sequence_from_hip_y(&full_rep());
        let result = PhaseSegmenter::default().segment(&sequence, &Segmentation::Velocity(ReferencePoint::HipMidpoint));

        assert_eq!(
            kinds(&result),
            vec![
                PhaseKind::Standing,
                PhaseKind::Descent,
                PhaseKind::Bottom,
                PhaseKind::Ascent,
                PhaseKind::Standing
            ]
        );
        let bottom = result.first(PhaseKind::Bottom).unwrap();
        assert!(bottom.start_frame < bottom.end_frame);
        assert_eq!((bottom.start_frame, bottom.end_frame), (15, 19));
        assert_eq!(result.first(PhaseKind::Descent).unwrap().duration_ms, 900);
        assert_eq!(result.repetitions, 1);
        assert!(!result.degraded);
    }

    #[test]
    fn test_phases_cover_sequence_without_overlap() {
        let mut y = full_rep();
        y.extend(full_rep().into_iter().skip(5));
        let sequence = sequence_from_hip_y(&y);
        let result = PhaseSegmenter::default().segment(&sequence, &Segmentation::Velocity(ReferencePoint::HipMidpoint));

        assert_eq!(result.repetitions, 2);
        assert_eq!(result.phases[0].start_frame, 0);
        assert_eq!(result.phases.last().unwrap().end_frame, sequence.len() - 1);
        for pair in result.phases.windows(2) {
            assert_eq!(pair[0].end_frame + 1, pair[1].start_frame);
        }
    }

    #[test]
    fn test_jitter_does_not_start_descent() {
        let mut y = vec![0.5; 12];
        y[6] = 0.52;
        let sequence = sequence_from_hip_y(&y);
        let result = PhaseSegmenter::default().segment(&sequence, &Segmentation::Velocity(ReferencePoint::HipMidpoint));
        // No bottom is ever reached, so the even split is used
        assert!(result.degraded);
        assert_eq!(
            kinds(&result),
            vec![PhaseKind::Descent, PhaseKind::Bottom, PhaseKind::Ascent]
        );
        assert_eq!(result.phases[2].end_frame, 11);
        assert_eq!(result.repetitions, 0);
    }

    #[test]
    fn test_short_sequence_degrades() {
        let sequence = sequence_from_hip_y(&[0.5, 0.55]);
        let result = PhaseSegmenter::default().segment(&sequence, &Segmentation::Velocity(ReferencePoint::HipMidpoint));
        assert!(result.degraded);
        assert_eq!(result.phases.len(), 2);
        assert_eq!(result.repetitions, 0);
    }

    #[test]
    fn test_proportional_windows() {
        let sequence = sequence_from_hip_y(&[0.5; 30]);
        let result = PhaseSegmenter::default().segment(&sequence, &Segmentation::Proportional(PITCH));

        assert_eq!(kinds(&result), PITCH.iter().map(|(k, _)| *k).collect::<Vec<_>>());
        let windup = result.first(PhaseKind::Windup).unwrap();
        assert_eq!((windup.start_frame, windup.end_frame), (0, 7));
        assert_eq!(result.phases.last().unwrap().end_frame, 29);
        assert_eq!(result.phase_at(20), Some(PhaseKind::Acceleration));
    }

    #[test]
    fn test_empty_sequence() {
        let result = PhaseSegmenter::default().segment(&PoseSequence::new(), &Segmentation::Proportional(PITCH));
        assert!(result.phases.is_empty());
    }

    #[test]
    fn test_proportion_validation() {
        assert!(Segmentation::Proportional(PITCH).validate().is_ok());
        const BAD: &[(PhaseKind, f64)] = &[(PhaseKind::Windup, 0.5), (PhaseKind::Stride, 0.4)];
        assert!(Segmentation::Proportional(BAD).validate().is_err());
        assert!(Segmentation::Velocity(ReferencePoint::HipMidpoint).validate().is_ok());
    }

    #[test]
    fn test_even_median_window_rejected() {
        let config = PhaseConfig {
            median_window: 2,
            ..Default::default()
        };
        assert!(PhaseSegmenter::new(config).is_err());
    }
}
