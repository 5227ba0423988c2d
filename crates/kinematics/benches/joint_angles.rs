//! Benchmarks for joint angle computation and phase segmentation.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use kinematics::{compute_joint_angles, PhaseSegmenter, ReferencePoint, Segmentation};
use pose_frame::{PoseSequence, SyntheticPose};

fn squat_sequence(frames: usize) -> PoseSequence {
    let frames = (0..frames)
        .map(|i| {
            let depth = (i as f64 / frames as f64 * std::f64::consts::PI).sin();
            SyntheticPose::squat(0.5 + 0.2 * depth, 70.0 * depth, 25.0 * depth).frame(i as u64 * 33, i as u32)
        })
        .collect();
    PoseSequence::from_frames(frames).unwrap_or_default()
}

fn benchmark_joint_angles(c: &mut Criterion) {
    let frame = SyntheticPose::squat(0.7, 60.0, 25.0).frame(0, 0);

    c.bench_function("joint_angles_single_frame", |b| {
        b.iter(|| compute_joint_angles(black_box(&frame)))
    });

    let sequence = squat_sequence(300);
    c.bench_function("joint_angles_300_frames", |b| {
        b.iter(|| {
            black_box(&sequence)
                .iter()
                .map(compute_joint_angles)
                .collect::<Vec<_>>()
        })
    });
}

fn benchmark_segmentation(c: &mut Criterion) {
    let segmenter = PhaseSegmenter::default();
    let sequence = squat_sequence(300);
    let layout = Segmentation::Velocity(ReferencePoint::HipMidpoint);

    c.bench_function("segment_300_frames", |b| {
        b.iter(|| segmenter.segment(black_box(&sequence), &layout))
    });
}

criterion_group!(benches, benchmark_joint_angles, benchmark_segmentation);
criterion_main!(benches);
