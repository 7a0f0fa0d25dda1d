//! Daemon configuration.
//!
//! Layering: JSON config file (path in `SENTINEL_CONFIG`) -> `SENTINEL_*`
//! environment overrides -> CLI overrides applied by the binary -> validation.
//! Thresholds default to the values the detection heuristics were calibrated
//! with; the confidence threshold defaults per policy.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SOURCE_URL: &str = "stub://ward_camera";
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_ESTIMATOR: &str = "stub";
const DEFAULT_POLICY: &str = "ratio";
const DEFAULT_INPUT_WIDTH: u32 = 368;
const DEFAULT_INPUT_HEIGHT: u32 = 368;
const DEFAULT_PROXIMITY_THRESHOLD: f32 = 100.0;
const DEFAULT_FALL_GAP_THRESHOLD: f32 = 100.0;
const DEFAULT_VELOCITY_THRESHOLD: f32 = 30.0;
const DEFAULT_FALL_DURATION_SECS: f64 = 2.0;
const DEFAULT_ALERT_COOLDOWN_SECS: f64 = 5.0;
const DEFAULT_MESSAGE_DURATION_SECS: f64 = 3.0;
const DEFAULT_TRACK_IDLE_SECS: f64 = 30.0;

/// Confidence threshold the ratio policy was calibrated with.
const RATIO_CONFIDENCE: f32 = 0.2;
/// The temporal policy tolerates noisier joints; it needs the neck on as
/// many frames as possible.
const TEMPORAL_CONFIDENCE: f32 = 0.1;

#[derive(Debug, Deserialize, Default)]
struct SentinelConfigFile {
    source: Option<SourceConfigFile>,
    estimator: Option<EstimatorConfigFile>,
    detection: Option<DetectionConfigFile>,
    alerts: Option<AlertConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct EstimatorConfigFile {
    name: Option<String>,
    model_path: Option<String>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    policy: Option<String>,
    confidence_threshold: Option<f32>,
    proximity_threshold: Option<f32>,
    fall_gap_threshold: Option<f32>,
    velocity_threshold: Option<f32>,
    fall_duration_secs: Option<f64>,
    reset_onset_on_calm: Option<bool>,
    track_idle_secs: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    cooldown_secs: Option<f64>,
    message_duration_secs: Option<f64>,
    message: Option<String>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    pub source_url: String,
    pub source_width: u32,
    pub source_height: u32,
    pub target_fps: u32,
    pub estimator: String,
    pub model_path: Option<String>,
    pub input_width: u32,
    pub input_height: u32,
    pub policy: String,
    pub confidence_threshold: f32,
    pub proximity_threshold: f32,
    pub fall_gap_threshold: f32,
    pub velocity_threshold: f32,
    pub fall_duration: Duration,
    pub reset_onset_on_calm: bool,
    pub track_idle_timeout: Duration,
    pub alert_cooldown: Duration,
    pub message_duration: Duration,
    pub alert_message: String,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            source_width: DEFAULT_SOURCE_WIDTH,
            source_height: DEFAULT_SOURCE_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            estimator: DEFAULT_ESTIMATOR.to_string(),
            model_path: None,
            input_width: DEFAULT_INPUT_WIDTH,
            input_height: DEFAULT_INPUT_HEIGHT,
            policy: DEFAULT_POLICY.to_string(),
            confidence_threshold: RATIO_CONFIDENCE,
            proximity_threshold: DEFAULT_PROXIMITY_THRESHOLD,
            fall_gap_threshold: DEFAULT_FALL_GAP_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            fall_duration: Duration::from_secs_f64(DEFAULT_FALL_DURATION_SECS),
            reset_onset_on_calm: false,
            track_idle_timeout: Duration::from_secs_f64(DEFAULT_TRACK_IDLE_SECS),
            alert_cooldown: Duration::from_secs_f64(DEFAULT_ALERT_COOLDOWN_SECS),
            message_duration: Duration::from_secs_f64(DEFAULT_MESSAGE_DURATION_SECS),
            alert_message: "Fall detected".to_string(),
        }
    }
}

impl SentinelConfig {
    /// Load from the `SENTINEL_CONFIG` file (when set) and apply
    /// environment overrides. CLI overrides are applied by the caller, who
    /// must finish with `validate`.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTINEL_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file path (CLI `--config`), falling back to
    /// defaults when no path is given. Environment overrides still apply.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => SentinelConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Self {
        let mut cfg = Self::default();
        // The confidence default depends on the policy, so remember whether
        // the file pinned it explicitly.
        let mut explicit_confidence = None;

        if let Some(source) = file.source {
            if let Some(url) = source.url {
                cfg.source_url = url;
            }
            if let Some(width) = source.width {
                cfg.source_width = width;
            }
            if let Some(height) = source.height {
                cfg.source_height = height;
            }
            if let Some(fps) = source.target_fps {
                cfg.target_fps = fps;
            }
        }
        if let Some(estimator) = file.estimator {
            if let Some(name) = estimator.name {
                cfg.estimator = name;
            }
            cfg.model_path = estimator.model_path.or(cfg.model_path);
            if let Some(width) = estimator.input_width {
                cfg.input_width = width;
            }
            if let Some(height) = estimator.input_height {
                cfg.input_height = height;
            }
        }
        if let Some(detection) = file.detection {
            if let Some(policy) = detection.policy {
                cfg.policy = policy;
            }
            explicit_confidence = detection.confidence_threshold;
            if let Some(proximity) = detection.proximity_threshold {
                cfg.proximity_threshold = proximity;
            }
            if let Some(gap) = detection.fall_gap_threshold {
                cfg.fall_gap_threshold = gap;
            }
            if let Some(velocity) = detection.velocity_threshold {
                cfg.velocity_threshold = velocity;
            }
            if let Some(secs) = detection.fall_duration_secs {
                cfg.fall_duration = Duration::from_secs_f64(secs.max(0.0));
            }
            if let Some(reset) = detection.reset_onset_on_calm {
                cfg.reset_onset_on_calm = reset;
            }
            if let Some(secs) = detection.track_idle_secs {
                cfg.track_idle_timeout = Duration::from_secs_f64(secs.max(0.0));
            }
        }
        if let Some(alerts) = file.alerts {
            if let Some(secs) = alerts.cooldown_secs {
                cfg.alert_cooldown = Duration::from_secs_f64(secs.max(0.0));
            }
            if let Some(secs) = alerts.message_duration_secs {
                cfg.message_duration = Duration::from_secs_f64(secs.max(0.0));
            }
            if let Some(message) = alerts.message {
                cfg.alert_message = message;
            }
        }

        cfg.confidence_threshold =
            explicit_confidence.unwrap_or_else(|| default_confidence(&cfg.policy));
        cfg
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("SENTINEL_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source_url = url;
            }
        }
        if let Ok(name) = std::env::var("SENTINEL_ESTIMATOR") {
            if !name.trim().is_empty() {
                self.estimator = name;
            }
        }
        if let Ok(path) = std::env::var("SENTINEL_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = Some(path);
            }
        }
        if let Ok(policy) = std::env::var("SENTINEL_POLICY") {
            if !policy.trim().is_empty() {
                self.set_policy(policy);
            }
        }
        if let Ok(threshold) = std::env::var("SENTINEL_CONFIDENCE_THRESHOLD") {
            let value: f32 = threshold.parse().map_err(|_| {
                anyhow!("SENTINEL_CONFIDENCE_THRESHOLD must be a number in [0, 1]")
            })?;
            self.confidence_threshold = value;
        }
        if let Ok(fps) = std::env::var("SENTINEL_TARGET_FPS") {
            let value: u32 = fps
                .parse()
                .map_err(|_| anyhow!("SENTINEL_TARGET_FPS must be an integer"))?;
            self.target_fps = value;
        }
        Ok(())
    }

    /// Change the policy and re-derive the per-policy confidence default.
    /// Apply explicit threshold overrides after this, not before.
    pub fn set_policy(&mut self, policy: impl Into<String>) {
        self.policy = policy.into();
        self.confidence_threshold = default_confidence(&self.policy);
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!("confidence_threshold must be within [0, 1]"));
        }
        if self.proximity_threshold <= 0.0 {
            return Err(anyhow!("proximity_threshold must be positive"));
        }
        if self.fall_gap_threshold <= 0.0 {
            return Err(anyhow!("fall_gap_threshold must be positive"));
        }
        if self.velocity_threshold <= 0.0 {
            return Err(anyhow!("velocity_threshold must be positive"));
        }
        if self.input_width == 0 || self.input_height == 0 {
            return Err(anyhow!("estimator input dimensions must be non-zero"));
        }
        match self.policy.as_str() {
            "ratio" | "temporal" => {}
            other => return Err(anyhow!("unknown policy '{}'", other)),
        }
        match self.estimator.as_str() {
            "stub" | "tract" => {}
            other => return Err(anyhow!("unknown estimator '{}'", other)),
        }
        if self.estimator == "tract" && self.model_path.is_none() {
            return Err(anyhow!("estimator 'tract' requires model_path"));
        }
        Ok(())
    }
}

fn default_confidence(policy: &str) -> f32 {
    match policy {
        "temporal" => TEMPORAL_CONFIDENCE,
        _ => RATIO_CONFIDENCE,
    }
}

fn read_config_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let cfg = SentinelConfig::default();
        assert_eq!(cfg.confidence_threshold, 0.2);
        assert_eq!(cfg.proximity_threshold, 100.0);
        assert_eq!(cfg.fall_gap_threshold, 100.0);
        assert_eq!(cfg.velocity_threshold, 30.0);
        assert_eq!(cfg.fall_duration, Duration::from_secs(2));
        assert_eq!(cfg.alert_cooldown, Duration::from_secs(5));
        assert_eq!(cfg.message_duration, Duration::from_secs(3));
        assert_eq!(cfg.input_width, 368);
        assert_eq!(cfg.input_height, 368);
        cfg.validate().unwrap();
    }

    #[test]
    fn temporal_policy_lowers_default_confidence() {
        let file: SentinelConfigFile = serde_json::from_str(
            r#"{ "detection": { "policy": "temporal" } }"#,
        )
        .unwrap();
        let cfg = SentinelConfig::from_file(file);
        assert_eq!(cfg.confidence_threshold, 0.1);
    }

    #[test]
    fn explicit_confidence_wins_over_policy_default() {
        let file: SentinelConfigFile = serde_json::from_str(
            r#"{ "detection": { "policy": "temporal", "confidence_threshold": 0.35 } }"#,
        )
        .unwrap();
        let cfg = SentinelConfig::from_file(file);
        assert_eq!(cfg.confidence_threshold, 0.35);
    }

    #[test]
    fn validate_rejects_unknown_policy() {
        let cfg = SentinelConfig {
            policy: "angles".to_string(),
            ..SentinelConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_requires_model_path_for_tract() {
        let cfg = SentinelConfig {
            estimator: "tract".to_string(),
            ..SentinelConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
