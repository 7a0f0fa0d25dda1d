//! Fall classification policies.
//!
//! Two interchangeable strategies ship: a stateless per-frame vertical-ratio
//! test and a stateful per-track velocity + duration test. Both abstain
//! (return `None`) when the joints they need are missing from the skeleton;
//! abstention is not an error.

mod ratio;
mod temporal;

pub use ratio::RatioPolicy;
pub use temporal::TemporalPolicy;

use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use crate::config::SentinelConfig;
use crate::skeleton::Skeleton;

/// Classification outcome for one skeleton on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Normal,
    Fallen,
}

/// Fall classification strategy.
///
/// `track_id` identifies a person across frames for stateful policies; it is
/// the skeleton's position in the clusterer output, so identity continuity
/// is only as good as the clustering order. Stateless policies ignore it.
pub trait FallPolicy: Send {
    /// Policy identifier (used for config selection and logging).
    fn name(&self) -> &'static str;

    /// Classify one skeleton. `None` means the policy abstained because the
    /// joints it needs were not detected this frame.
    fn evaluate(&mut self, track_id: usize, skeleton: &Skeleton, now: Instant) -> Option<Verdict>;

    /// Drop per-track state not observed for `max_idle`. No-op for
    /// stateless policies.
    fn evict_stale(&mut self, _now: Instant, _max_idle: Duration) {}
}

/// Construct the configured policy by name.
pub fn build_policy(config: &SentinelConfig) -> Result<Box<dyn FallPolicy>> {
    match config.policy.as_str() {
        "ratio" => Ok(Box::new(RatioPolicy::new(config.fall_gap_threshold))),
        "temporal" => Ok(Box::new(
            TemporalPolicy::new(config.velocity_threshold, config.fall_duration)
                .with_reset_on_calm(config.reset_onset_on_calm),
        )),
        other => bail!("unknown fall policy '{}'; expected 'ratio' or 'temporal'", other),
    }
}
