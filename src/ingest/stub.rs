//! Synthetic frame source for tests and model-less operation.

use anyhow::Result;

use crate::frame::Frame;
use crate::ingest::{FrameSource, SourceStats};

/// Scripted synthetic source.
///
/// Emits frames whose pixel pattern advances with a simple scene counter,
/// so consecutive frames usually differ but the pattern occasionally
/// repeats and exercises the duplicate-frame skip downstream.
pub struct StubSource {
    scene: String,
    width: u32,
    height: u32,
    frame_count: u64,
    scene_state: u8,
}

impl StubSource {
    pub fn new(scene: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            scene: scene.into(),
            width,
            height,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let len = (self.width * self.height * 3) as usize;
        let mut pixels = vec![self.scene_state; len];
        // A moving band keeps most frames distinct.
        let band = ((self.frame_count % 16) * (self.width as u64 / 16).max(1)) as usize * 3;
        for byte in pixels.iter_mut().skip(band).take(self.width as usize) {
            *byte = byte.wrapping_add(128);
        }
        pixels
    }
}

impl FrameSource for StubSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("StubSource: connected to stub://{} (synthetic)", self.scene);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        // Scene shifts every 8 frames.
        if self.frame_count % 8 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        Ok(Frame::new(self.generate_pixels(), self.width, self.height))
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            source: format!("stub://{}", self.scene),
        }
    }
}
