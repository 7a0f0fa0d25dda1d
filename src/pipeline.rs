//! Per-frame detection pipeline.
//!
//! Composes decode -> cluster -> classify -> debounce for one frame and emits
//! abstract draw and notification commands. Rendering and audio are external
//! collaborators; this module never touches a surface or a speaker.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::alert::{AlertDebouncer, NotificationCommand};
use crate::classify::{FallPolicy, Verdict};
use crate::cluster::cluster_persons;
use crate::heatmap::{decode, Heatmaps};
use crate::skeleton::{Point, Skeleton};

/// Commands for the render boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Bone { from: Point, to: Point },
    Joint { at: Point },
    FallBanner,
}

/// Everything the pipeline produced for one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub skeletons: Vec<Skeleton>,
    pub draw: Vec<DrawCommand>,
    /// Index-aligned to `skeletons`; `None` is an abstention.
    pub verdicts: Vec<Option<Verdict>>,
    pub notifications: Vec<NotificationCommand>,
}

impl FrameReport {
    pub fn any_fallen(&self) -> bool {
        self.verdicts.contains(&Some(Verdict::Fallen))
    }
}

/// The post-inference pipeline.
pub struct FallPipeline {
    confidence_threshold: f32,
    proximity_threshold: f32,
    policy: Box<dyn FallPolicy>,
    debouncer: AlertDebouncer,
}

impl FallPipeline {
    pub fn new(
        confidence_threshold: f32,
        proximity_threshold: f32,
        policy: Box<dyn FallPolicy>,
        debouncer: AlertDebouncer,
    ) -> Self {
        Self {
            confidence_threshold,
            proximity_threshold,
            policy,
            debouncer,
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Process one frame's heatmaps.
    ///
    /// Track ids handed to the policy are skeleton positions in clustering
    /// order; identity continuity across frames is only as strong as that
    /// ordering. Alert scope is the whole session: several people falling
    /// in the same window share one alert pair.
    pub fn process(
        &mut self,
        maps: &Heatmaps,
        frame_width: u32,
        frame_height: u32,
        now: Instant,
    ) -> Result<FrameReport> {
        // Expire a visible message before admitting new alerts.
        let mut notifications: Vec<NotificationCommand> =
            self.debouncer.tick(now).into_iter().collect();

        let joints = decode(maps, frame_width, frame_height, self.confidence_threshold)?;
        let skeletons = cluster_persons(&joints, self.proximity_threshold);

        let mut draw = Vec::new();
        for skeleton in &skeletons {
            for (from, to) in skeleton.bone_segments() {
                draw.push(DrawCommand::Bone { from, to });
            }
            for (_, point) in skeleton.iter() {
                draw.push(DrawCommand::Joint { at: point });
            }
        }

        let (verdicts, alert_commands) = self.classify(&skeletons, now);
        notifications.extend(alert_commands);

        if verdicts.contains(&Some(Verdict::Fallen)) {
            draw.push(DrawCommand::FallBanner);
        }

        Ok(FrameReport {
            skeletons,
            draw,
            verdicts,
            notifications,
        })
    }

    /// Classify skeletons and feed every verdict through the debouncer.
    ///
    /// Split out from `process` so callers holding ready-made skeletons
    /// (tests, replay tooling) can drive classification without a tensor.
    pub fn classify(
        &mut self,
        skeletons: &[Skeleton],
        now: Instant,
    ) -> (Vec<Option<Verdict>>, Vec<NotificationCommand>) {
        let mut verdicts = Vec::with_capacity(skeletons.len());
        let mut notifications = Vec::new();

        for (track_id, skeleton) in skeletons.iter().enumerate() {
            let verdict = self.policy.evaluate(track_id, skeleton, now);
            if verdict == Some(Verdict::Fallen) {
                log::debug!("track {}: fallen", track_id);
            }
            notifications.extend(self.debouncer.observe(verdict, now));
            verdicts.push(verdict);
        }

        (verdicts, notifications)
    }

    /// Message-expiry check for loop iterations that skip inference.
    pub fn tick(&mut self, now: Instant) -> Option<NotificationCommand> {
        self.debouncer.tick(now)
    }

    /// Forward stale-track eviction to the policy.
    pub fn evict_stale(&mut self, now: Instant, max_idle: Duration) {
        self.policy.evict_stale(now, max_idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RatioPolicy;
    use crate::skeleton::BodyPart;

    const MAP: usize = 46;

    fn put_peak(data: &mut [f32], part: BodyPart, col: usize, row: usize) {
        data[(part as usize) * MAP * MAP + row * MAP + col] = 0.9;
    }

    /// One upright subject around column `col`.
    fn standing_subject(data: &mut [f32], col: usize) {
        put_peak(data, BodyPart::Neck, col, 12);
        put_peak(data, BodyPart::RHip, col.saturating_sub(1), 24);
        put_peak(data, BodyPart::LHip, col + 1, 24);
    }

    fn pipeline(proximity: f32) -> FallPipeline {
        FallPipeline::new(
            0.2,
            proximity,
            Box::new(RatioPolicy::new(100.0)),
            AlertDebouncer::new(Duration::from_secs(5), Duration::from_secs(3)),
        )
    }

    #[test]
    fn standing_subject_draws_bones_without_banner() {
        let mut data = vec![0.0f32; 19 * MAP * MAP];
        standing_subject(&mut data, 23);
        let maps = Heatmaps::new(data, 19, MAP, MAP).unwrap();

        // Proximity wide enough to keep neck and hips in one skeleton; the
        // standing gap (125px) then reads as Normal.
        let mut p = pipeline(300.0);
        let report = p.process(&maps, 640, 480, Instant::now()).unwrap();

        assert_eq!(report.skeletons.len(), 1);
        assert_eq!(report.verdicts, vec![Some(Verdict::Normal)]);
        assert!(!report.draw.contains(&DrawCommand::FallBanner));
        assert!(report
            .draw
            .iter()
            .any(|c| matches!(c, DrawCommand::Bone { .. })));
        assert!(report.notifications.is_empty());
    }

    #[test]
    fn default_proximity_splits_a_standing_subject_into_abstentions() {
        // With the calibrated 100px box, a standing subject's hips sit more
        // than 100px below the neck seed, so they open their own skeleton
        // and neither cluster satisfies the ratio policy. No verdict, no
        // false alarm.
        let mut data = vec![0.0f32; 19 * MAP * MAP];
        standing_subject(&mut data, 23);
        let maps = Heatmaps::new(data, 19, MAP, MAP).unwrap();

        let mut p = pipeline(100.0);
        let report = p.process(&maps, 640, 480, Instant::now()).unwrap();

        assert_eq!(report.skeletons.len(), 2);
        assert!(report.verdicts.iter().all(|v| v.is_none()));
        assert!(report.notifications.is_empty());
    }

    #[test]
    fn collapsed_subject_raises_banner_and_alert() {
        let mut data = vec![0.0f32; 19 * MAP * MAP];
        // Neck and hips on the same row: zero gap.
        put_peak(&mut data, BodyPart::Neck, 10, 40);
        put_peak(&mut data, BodyPart::RHip, 14, 40);
        put_peak(&mut data, BodyPart::LHip, 16, 40);
        let maps = Heatmaps::new(data, 19, MAP, MAP).unwrap();

        let mut p = pipeline(100.0);
        let report = p.process(&maps, 640, 480, Instant::now()).unwrap();

        assert_eq!(report.verdicts, vec![Some(Verdict::Fallen)]);
        assert!(report.draw.contains(&DrawCommand::FallBanner));
        assert_eq!(report.notifications.len(), 2);
    }

    #[test]
    fn expiry_is_reported_on_later_frames() {
        let mut data = vec![0.0f32; 19 * MAP * MAP];
        put_peak(&mut data, BodyPart::Neck, 10, 40);
        put_peak(&mut data, BodyPart::RHip, 14, 40);
        put_peak(&mut data, BodyPart::LHip, 16, 40);
        let maps = Heatmaps::new(data, 19, MAP, MAP).unwrap();

        let mut p = pipeline(100.0);
        let t0 = Instant::now();
        p.process(&maps, 640, 480, t0).unwrap();

        let report = p.process(&maps, 640, 480, t0 + Duration::from_secs(4)).unwrap();
        assert_eq!(
            report.notifications,
            vec![NotificationCommand::ClearMessage]
        );
    }
}
