//! Detection session: the capture -> inference -> pipeline loop.
//!
//! One frame is in flight at a time; there is no queue between capture and
//! classification. The loop checks the running flag once per iteration, so
//! stopping is cooperative and an in-flight capture or inference call
//! finishes before the session winds down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::alert::NotificationCommand;
use crate::ingest::FrameSource;
use crate::pipeline::{FallPipeline, FrameReport};
use crate::pose::PoseEstimator;

/// Consecutive capture failures tolerated before the session gives up.
const MAX_CAPTURE_RETRIES: u32 = 5;
/// Base backoff between capture retries; grows linearly per attempt.
const CAPTURE_RETRY_BACKOFF: Duration = Duration::from_millis(200);
/// Health log / track eviction cadence.
const HEALTH_INTERVAL: Duration = Duration::from_secs(5);

/// Consumer of per-frame reports and out-of-band notifications.
pub trait FrameSink: Send {
    fn handle(&mut self, report: &FrameReport) -> Result<()>;

    /// Notification produced outside a report (message expiry on a skipped
    /// frame).
    fn notify(&mut self, command: &NotificationCommand) -> Result<()>;
}

/// Counters for the lifetime of one session.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub notifications_emitted: u64,
}

/// Owns the frame loop and the shared cancellation flag.
pub struct DetectionSession {
    source: Box<dyn FrameSource>,
    estimator: Box<dyn PoseEstimator>,
    pipeline: FallPipeline,
    running: Arc<AtomicBool>,
    track_idle_timeout: Duration,
    frame_interval: Duration,
}

impl DetectionSession {
    pub fn new(
        source: Box<dyn FrameSource>,
        estimator: Box<dyn PoseEstimator>,
        pipeline: FallPipeline,
        track_idle_timeout: Duration,
        target_fps: u32,
    ) -> Self {
        let frame_interval = if target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis((1000 / target_fps).max(1) as u64)
        };
        Self {
            source,
            estimator,
            pipeline,
            running: Arc::new(AtomicBool::new(true)),
            track_idle_timeout,
            frame_interval,
        }
    }

    /// Share an externally created cancellation flag (signal handlers,
    /// sources that stop the loop from inside).
    pub fn with_running(mut self, flag: Arc<AtomicBool>) -> Self {
        self.running = flag;
        self
    }

    /// Shared flag; store `false` (e.g. from a signal handler) to stop the
    /// loop after the current frame.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Run the loop on the calling thread until stopped or failed.
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> Result<SessionStats> {
        self.source.connect()?;
        log::info!(
            "session running: estimator={} policy={}",
            self.estimator.name(),
            self.pipeline.policy_name()
        );

        let mut stats = SessionStats::default();
        let mut last_digest: Option<[u8; 32]> = None;
        let mut last_health = Instant::now();
        let mut capture_failures = 0u32;

        while self.running.load(Ordering::SeqCst) {
            let frame = match self.source.next_frame() {
                Ok(frame) => {
                    capture_failures = 0;
                    frame
                }
                Err(e) => {
                    capture_failures += 1;
                    if capture_failures >= MAX_CAPTURE_RETRIES {
                        return Err(e.context("frame capture failed repeatedly"));
                    }
                    log::warn!(
                        "frame capture failed (attempt {}/{}): {}",
                        capture_failures,
                        MAX_CAPTURE_RETRIES,
                        e
                    );
                    std::thread::sleep(CAPTURE_RETRY_BACKOFF * capture_failures);
                    continue;
                }
            };

            let now = Instant::now();

            // A source re-delivering the identical frame buys us nothing:
            // skip inference but keep message expiry moving.
            if last_digest == Some(frame.digest()) {
                stats.frames_skipped += 1;
                if let Some(command) = self.pipeline.tick(now) {
                    stats.notifications_emitted += 1;
                    sink.notify(&command)?;
                }
                self.pace();
                continue;
            }
            last_digest = Some(frame.digest());

            let maps = self
                .estimator
                .estimate(&frame)
                .context("pose estimation failed")?;
            let report = self
                .pipeline
                .process(&maps, frame.width, frame.height, now)?;

            stats.frames_processed += 1;
            stats.notifications_emitted += report.notifications.len() as u64;
            sink.handle(&report)?;

            if last_health.elapsed() >= HEALTH_INTERVAL {
                let source_stats = self.source.stats();
                log::info!(
                    "source health={} frames={} url={}",
                    self.source.is_healthy(),
                    source_stats.frames_captured,
                    source_stats.source
                );
                self.pipeline.evict_stale(now, self.track_idle_timeout);
                last_health = Instant::now();
            }

            self.pace();
        }

        log::info!(
            "session stopped: {} processed, {} skipped",
            stats.frames_processed,
            stats.frames_skipped
        );
        Ok(stats)
    }

    fn pace(&self) {
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
    }
}
