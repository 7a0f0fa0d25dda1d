use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::classify::{FallPolicy, Verdict};
use crate::skeleton::{BodyPart, Skeleton};

/// Per-track state carried across frames.
///
/// Created implicitly the first time a track id is observed. The onset
/// timestamp marks when neck instability started; in the default
/// configuration it is never cleared (the track stays latched eligible for
/// a Fallen verdict once instability begins).
#[derive(Debug, Default)]
struct Track {
    previous_neck_y: Option<f32>,
    fall_onset: Option<Instant>,
    last_seen: Option<Instant>,
}

/// Stateful neck-velocity + duration test.
///
/// A frame-to-frame neck-y jump above `velocity_threshold` records an onset
/// timestamp for the track; once an onset is older than `fall_duration` the
/// track is Fallen. Calm frames leave the onset untouched unless
/// `reset_on_calm` is enabled, which clears it and requires instability to
/// be continuous before a fall is declared.
pub struct TemporalPolicy {
    velocity_threshold: f32,
    fall_duration: Duration,
    reset_on_calm: bool,
    tracks: HashMap<usize, Track>,
}

impl TemporalPolicy {
    pub fn new(velocity_threshold: f32, fall_duration: Duration) -> Self {
        Self {
            velocity_threshold,
            fall_duration,
            reset_on_calm: false,
            tracks: HashMap::new(),
        }
    }

    /// Clear a track's onset on calm frames instead of latching it.
    pub fn with_reset_on_calm(mut self, reset: bool) -> Self {
        self.reset_on_calm = reset;
        self
    }

    #[cfg(test)]
    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

impl FallPolicy for TemporalPolicy {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn evaluate(&mut self, track_id: usize, skeleton: &Skeleton, now: Instant) -> Option<Verdict> {
        // No neck this frame: no observation. State stays untouched, the
        // policy abstains.
        let neck = skeleton.get(BodyPart::Neck)?;

        let fall_duration = self.fall_duration;
        let track = self.tracks.entry(track_id).or_default();
        track.last_seen = Some(now);

        if let Some(prev) = track.previous_neck_y {
            let velocity = (neck.y - prev).abs();
            if velocity > self.velocity_threshold {
                if track.fall_onset.is_none() {
                    track.fall_onset = Some(now);
                    log::debug!("track {}: instability onset (velocity {:.1})", track_id, velocity);
                }
            } else if self.reset_on_calm && track.fall_onset.is_some() {
                track.fall_onset = None;
                log::debug!("track {}: calm frame, onset cleared", track_id);
            }
        }
        track.previous_neck_y = Some(neck.y);

        let fallen = track
            .fall_onset
            .is_some_and(|onset| now.duration_since(onset) > fall_duration);

        Some(if fallen { Verdict::Fallen } else { Verdict::Normal })
    }

    fn evict_stale(&mut self, now: Instant, max_idle: Duration) {
        let before = self.tracks.len();
        self.tracks.retain(|_, track| {
            track
                .last_seen
                .is_some_and(|seen| now.duration_since(seen) <= max_idle)
        });
        let evicted = before - self.tracks.len();
        if evicted > 0 {
            log::debug!("evicted {} stale track(s)", evicted);
        }
    }
}
