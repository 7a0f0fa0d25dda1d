//! Frame ingestion sources.
//!
//! Sources produce `Frame` instances for the detection loop:
//! - Stub source (`stub://` URLs): synthetic scripted scene, always available
//! - HTTP source (`http(s)://` URLs, feature `ingest-http`): IP-webcam style
//!   JPEG snapshot / MJPEG streams, decoded in memory
//!
//! Capture may block for an unbounded time; the session loop treats
//! `next_frame` as a synchronous black box and owns the retry policy.

#[cfg(feature = "ingest-http")]
pub mod http;
pub mod stub;

#[cfg(feature = "ingest-http")]
pub use http::HttpSource;
pub use stub::StubSource;

use anyhow::{bail, Result};

use crate::frame::Frame;

/// A source of frames.
pub trait FrameSource: Send {
    /// Establish the connection. Must be called before `next_frame`.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame. May block.
    fn next_frame(&mut self) -> Result<Frame>;

    /// True while the source is delivering frames at a healthy cadence.
    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Capture statistics for health logging.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// Open a frame source for a URL, dispatching on the scheme.
pub fn open_source(
    url: &str,
    width: u32,
    height: u32,
    target_fps: u32,
) -> Result<Box<dyn FrameSource>> {
    if let Some(scene) = url.strip_prefix("stub://") {
        return Ok(Box::new(StubSource::new(scene, width, height)));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        #[cfg(feature = "ingest-http")]
        {
            return Ok(Box::new(HttpSource::new(http::HttpConfig {
                url: url.to_string(),
                target_fps,
            })?));
        }
        #[cfg(not(feature = "ingest-http"))]
        bail!("http sources require the ingest-http feature");
    }
    let _ = target_fps;
    bail!("unsupported source url '{}'; expected stub:// or http(s)://", url)
}
