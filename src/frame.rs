//! Captured frames.

use std::time::Instant;

use sha2::{Digest, Sha256};

/// One captured RGB frame.
///
/// The content digest is computed once at capture time; the session loop
/// uses it to skip inference when a source delivers the same frame twice.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    digest: [u8; 32],
    captured_at: Instant,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        let digest: [u8; 32] = Sha256::digest(&pixels).into();
        Self {
            pixels,
            width,
            height,
            digest,
            captured_at: Instant::now(),
        }
    }

    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_tracks_content() {
        let a = Frame::new(vec![1, 2, 3], 1, 1);
        let b = Frame::new(vec![1, 2, 3], 1, 1);
        let c = Frame::new(vec![9, 9, 9], 1, 1);
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }
}
