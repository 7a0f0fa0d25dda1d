//! sentineld - fall detection daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured source (stub or HTTP camera)
//! 2. Runs the pose estimator on each new frame
//! 3. Decodes, clusters, and classifies skeletons per the configured policy
//! 4. Debounces fall alerts and logs the resulting commands
//!
//! Rendering and audio playback belong to an external shell; sentineld
//! writes every draw-relevant verdict and notification command to the log.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;

use fall_sentinel::{
    build_estimator, build_policy, open_source, AlertDebouncer, DetectionSession, FallPipeline,
    FrameReport, FrameSink, NotificationCommand, SentinelConfig, Verdict,
};

#[derive(Parser, Debug)]
#[command(name = "sentineld", about = "Pose-based fall detection daemon")]
struct Args {
    /// Path to a JSON config file (overrides SENTINEL_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame source URL (stub:// or http(s)://).
    #[arg(long)]
    source: Option<String>,

    /// Fall policy: ratio | temporal.
    #[arg(long)]
    policy: Option<String>,

    /// Pose estimator backend: stub | tract.
    #[arg(long)]
    estimator: Option<String>,

    /// ONNX model path for the tract estimator.
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Joint confidence threshold.
    #[arg(long)]
    thr: Option<f32>,

    /// Model input width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Model input height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Target capture rate in frames per second.
    #[arg(long)]
    fps: Option<u32>,
}

/// Sink that narrates reports and notification commands into the log.
struct LogSink {
    alerts: u64,
}

impl FrameSink for LogSink {
    fn handle(&mut self, report: &FrameReport) -> Result<()> {
        let fallen = report
            .verdicts
            .iter()
            .filter(|v| **v == Some(Verdict::Fallen))
            .count();
        if fallen > 0 {
            log::warn!(
                "{} skeleton(s), {} fallen, {} draw command(s)",
                report.skeletons.len(),
                fallen,
                report.draw.len()
            );
        } else {
            log::debug!(
                "{} skeleton(s), {} draw command(s)",
                report.skeletons.len(),
                report.draw.len()
            );
        }
        for command in &report.notifications {
            self.notify(command)?;
        }
        Ok(())
    }

    fn notify(&mut self, command: &NotificationCommand) -> Result<()> {
        match command {
            NotificationCommand::PlayAudio => {
                self.alerts += 1;
                log::warn!("alert #{}: play audio", self.alerts);
            }
            NotificationCommand::ShowMessage { text, duration } => {
                log::warn!("show message '{}' for {:.0?}", text, duration);
            }
            NotificationCommand::ClearMessage => {
                log::info!("clear message");
            }
        }
        Ok(())
    }
}

fn apply_cli(cfg: &mut SentinelConfig, args: &Args) {
    if let Some(url) = &args.source {
        cfg.source_url = url.clone();
    }
    if let Some(policy) = &args.policy {
        cfg.set_policy(policy.clone());
    }
    if let Some(estimator) = &args.estimator {
        cfg.estimator = estimator.clone();
    }
    if let Some(path) = &args.model_path {
        cfg.model_path = Some(path.display().to_string());
    }
    if let Some(thr) = args.thr {
        cfg.confidence_threshold = thr;
    }
    if let Some(width) = args.width {
        cfg.input_width = width;
    }
    if let Some(height) = args.height {
        cfg.input_height = height;
    }
    if let Some(fps) = args.fps {
        cfg.target_fps = fps;
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = SentinelConfig::load_from(args.config.as_deref())?;
    apply_cli(&mut cfg, &args);
    cfg.validate()?;

    log::info!(
        "sentineld {} starting: source={} estimator={} policy={}",
        env!("CARGO_PKG_VERSION"),
        cfg.source_url,
        cfg.estimator,
        cfg.policy
    );

    let source = open_source(
        &cfg.source_url,
        cfg.source_width,
        cfg.source_height,
        cfg.target_fps,
    )?;
    let estimator = build_estimator(&cfg)?;
    let policy = build_policy(&cfg)?;
    let debouncer = AlertDebouncer::new(cfg.alert_cooldown, cfg.message_duration)
        .with_message(cfg.alert_message.clone());
    let pipeline = FallPipeline::new(
        cfg.confidence_threshold,
        cfg.proximity_threshold,
        policy,
        debouncer,
    );

    let mut session = DetectionSession::new(
        source,
        estimator,
        pipeline,
        cfg.track_idle_timeout,
        cfg.target_fps,
    );

    let running = session.running_flag();
    ctrlc::set_handler(move || {
        log::info!("stop requested; finishing current frame");
        running.store(false, Ordering::SeqCst);
    })
    .context("failed to install signal handler")?;

    let mut sink = LogSink { alerts: 0 };
    let stats = session.run(&mut sink)?;

    log::info!(
        "sentineld exiting: {} frames processed, {} skipped, {} notification(s), {} alert(s)",
        stats.frames_processed,
        stats.frames_skipped,
        stats.notifications_emitted,
        sink.alerts
    );
    Ok(())
}
