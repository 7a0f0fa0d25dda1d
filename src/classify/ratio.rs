use std::time::Instant;

use crate::classify::{FallPolicy, Verdict};
use crate::skeleton::{BodyPart, Skeleton};

/// Stateless neck-to-hip vertical gap test.
///
/// A standing person keeps a large vertical gap between neck and hip
/// midpoint; a collapsed or horizontal person does not. The pixel threshold
/// is calibrated for a fixed camera framing and is not scale-invariant: a
/// person far from the camera subtends fewer pixels and can trip the test
/// while upright.
pub struct RatioPolicy {
    fall_gap: f32,
}

impl RatioPolicy {
    pub fn new(fall_gap: f32) -> Self {
        Self { fall_gap }
    }
}

impl FallPolicy for RatioPolicy {
    fn name(&self) -> &'static str {
        "ratio"
    }

    fn evaluate(&mut self, _track_id: usize, skeleton: &Skeleton, _now: Instant) -> Option<Verdict> {
        let neck = skeleton.get(BodyPart::Neck)?;
        let rhip = skeleton.get(BodyPart::RHip)?;
        let lhip = skeleton.get(BodyPart::LHip)?;

        let hip_y = (rhip.y + lhip.y) / 2.0;
        if hip_y - neck.y < self.fall_gap {
            Some(Verdict::Fallen)
        } else {
            Some(Verdict::Normal)
        }
    }
}
