//! Pose estimator boundary.
//!
//! The estimator is an opaque, possibly blocking function from a frame to a
//! heatmap tensor. Failures are fatal for the frame and propagate to the
//! session loop; the core never retries inference itself.

pub mod stub;
#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::StubEstimator;
#[cfg(feature = "backend-tract")]
pub use tract::TractEstimator;

use anyhow::{bail, Result};

use crate::config::SentinelConfig;
use crate::frame::Frame;
use crate::heatmap::Heatmaps;

/// Pose estimation backend.
pub trait PoseEstimator: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run inference on one frame. Blocking; may take unbounded time.
    fn estimate(&mut self, frame: &Frame) -> Result<Heatmaps>;
}

/// Construct the configured estimator by name.
pub fn build_estimator(config: &SentinelConfig) -> Result<Box<dyn PoseEstimator>> {
    match config.estimator.as_str() {
        "stub" => Ok(Box::new(StubEstimator::new())),
        "tract" => {
            #[cfg(feature = "backend-tract")]
            {
                let Some(model_path) = config.model_path.as_deref() else {
                    bail!("estimator 'tract' requires model_path");
                };
                return Ok(Box::new(TractEstimator::new(
                    model_path,
                    config.input_width,
                    config.input_height,
                )?));
            }
            #[cfg(not(feature = "backend-tract"))]
            bail!("estimator 'tract' requires the backend-tract feature");
        }
        other => bail!("unknown estimator '{}'; expected 'stub' or 'tract'", other),
    }
}
