//! Deterministic synthetic estimator.
//!
//! Plays a scripted scene so the full decode -> cluster -> classify -> alert
//! path runs without a model file: one subject stands for the first half of
//! each cycle, then lies collapsed for the second half. Peaks are single
//! cells in a 46x46 map, 19 channels (18 joints + background).

use anyhow::Result;

use crate::frame::Frame;
use crate::heatmap::Heatmaps;
use crate::pose::PoseEstimator;
use crate::skeleton::BodyPart;

const MAP_SIZE: usize = 46;
const CHANNELS: usize = BodyPart::NAMED_COUNT + 1;
const PEAK_CONFIDENCE: f32 = 0.8;

/// Frames per scene phase (standing, then fallen).
const PHASE_FRAMES: u64 = 50;

/// Joint cells for an upright subject, (part, col, row) in map coordinates.
/// Rows put the neck near 0.26 of frame height and the hips near 0.52, a
/// comfortably "standing" gap after scaling.
const STANDING: &[(BodyPart, usize, usize)] = &[
    (BodyPart::Nose, 23, 8),
    (BodyPart::Neck, 23, 12),
    (BodyPart::RShoulder, 20, 12),
    (BodyPart::LShoulder, 26, 12),
    (BodyPart::RElbow, 19, 17),
    (BodyPart::LElbow, 27, 17),
    (BodyPart::RWrist, 19, 21),
    (BodyPart::LWrist, 27, 21),
    (BodyPart::RHip, 21, 24),
    (BodyPart::LHip, 25, 24),
    (BodyPart::RKnee, 21, 32),
    (BodyPart::LKnee, 25, 32),
    (BodyPart::RAnkle, 21, 40),
    (BodyPart::LAnkle, 25, 40),
];

/// The same subject collapsed horizontally near the floor line. The face is
/// occluded against the floor, so the neck (lowest surviving joint id) seeds
/// the cluster and the hips stay inside its proximity box.
const FALLEN: &[(BodyPart, usize, usize)] = &[
    (BodyPart::Neck, 9, 40),
    (BodyPart::RShoulder, 10, 38),
    (BodyPart::LShoulder, 10, 42),
    (BodyPart::RElbow, 12, 37),
    (BodyPart::LElbow, 12, 43),
    (BodyPart::RWrist, 15, 37),
    (BodyPart::LWrist, 15, 43),
    (BodyPart::RHip, 15, 39),
    (BodyPart::LHip, 15, 41),
    (BodyPart::RKnee, 20, 39),
    (BodyPart::LKnee, 20, 41),
    (BodyPart::RAnkle, 24, 40),
    (BodyPart::LAnkle, 24, 42),
];

/// Scripted-scene estimator.
pub struct StubEstimator {
    frame_count: u64,
}

impl StubEstimator {
    pub fn new() -> Self {
        Self { frame_count: 0 }
    }

    fn scene(&self) -> &'static [(BodyPart, usize, usize)] {
        if (self.frame_count / PHASE_FRAMES) % 2 == 0 {
            STANDING
        } else {
            FALLEN
        }
    }
}

impl Default for StubEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseEstimator for StubEstimator {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn estimate(&mut self, _frame: &Frame) -> Result<Heatmaps> {
        let mut data = vec![0.0f32; CHANNELS * MAP_SIZE * MAP_SIZE];
        for &(part, col, row) in self.scene().iter() {
            let channel = part as usize;
            data[channel * MAP_SIZE * MAP_SIZE + row * MAP_SIZE + col] = PEAK_CONFIDENCE;
        }
        self.frame_count += 1;
        Heatmaps::new(data, CHANNELS, MAP_SIZE, MAP_SIZE)
    }
}
