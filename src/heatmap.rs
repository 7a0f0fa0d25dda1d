//! Heatmap tensor decoding.
//!
//! The estimator produces one confidence map per joint channel. Decoding
//! picks the single global-maximum cell per named joint, scales it into
//! frame pixel coordinates, and applies the confidence threshold. The
//! background channel is carried in the tensor but never decoded.

use anyhow::{anyhow, bail, Result};

use crate::skeleton::BodyPart;

/// Channel-major heatmap tensor: `channels` maps of `height * width` cells.
#[derive(Debug, Clone)]
pub struct Heatmaps {
    data: Vec<f32>,
    channels: usize,
    width: usize,
    height: usize,
}

impl Heatmaps {
    pub fn new(data: Vec<f32>, channels: usize, width: usize, height: usize) -> Result<Self> {
        let expected = channels
            .checked_mul(width)
            .and_then(|v| v.checked_mul(height))
            .ok_or_else(|| anyhow!("heatmap dimensions overflow"))?;
        if data.len() != expected {
            bail!(
                "heatmap buffer holds {} cells, expected {} ({}x{}x{})",
                data.len(),
                expected,
                channels,
                height,
                width
            );
        }
        if width == 0 || height == 0 {
            bail!("heatmap spatial dimensions must be non-zero");
        }
        Ok(Self {
            data,
            channels,
            width,
            height,
        })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn channel(&self, index: usize) -> &[f32] {
        let cells = self.width * self.height;
        &self.data[index * cells..(index + 1) * cells]
    }
}

/// One decoded joint: frame pixel coordinates plus model confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDetection {
    pub part: BodyPart,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Per-frame decode output, index-aligned to joint id.
pub type DecodedJoints = [Option<JointDetection>; BodyPart::NAMED_COUNT];

/// Decode the best cell per named joint channel into frame coordinates.
///
/// A joint is present only when its peak confidence is strictly above
/// `threshold`. Fails when the tensor carries fewer channels than the joint
/// table expects (model/table mismatch).
pub fn decode(
    maps: &Heatmaps,
    frame_width: u32,
    frame_height: u32,
    threshold: f32,
) -> Result<DecodedJoints> {
    if maps.channels() < BodyPart::NAMED_COUNT {
        bail!(
            "model produced {} heatmap channels, joint table expects at least {}",
            maps.channels(),
            BodyPart::NAMED_COUNT
        );
    }

    let mut joints: DecodedJoints = Default::default();

    for id in 0..BodyPart::NAMED_COUNT {
        let map = maps.channel(id);
        let (mut best_cell, mut best_conf) = (0usize, f32::NEG_INFINITY);
        for (cell, &conf) in map.iter().enumerate() {
            if conf > best_conf {
                best_cell = cell;
                best_conf = conf;
            }
        }

        if best_conf > threshold {
            let col = best_cell % maps.width();
            let row = best_cell / maps.width();
            let part = BodyPart::from_id(id).expect("id within named range");
            joints[id] = Some(JointDetection {
                part,
                x: frame_width as f32 * col as f32 / maps.width() as f32,
                y: frame_height as f32 * row as f32 / maps.height() as f32,
                confidence: best_conf,
            });
        }
    }

    Ok(joints)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An all-zero tensor with the listed (channel, col, row, conf) peaks.
    fn synthetic(
        channels: usize,
        width: usize,
        height: usize,
        peaks: &[(usize, usize, usize, f32)],
    ) -> Heatmaps {
        let mut data = vec![0.0f32; channels * width * height];
        for &(ch, col, row, conf) in peaks {
            data[ch * width * height + row * width + col] = conf;
        }
        Heatmaps::new(data, channels, width, height).unwrap()
    }

    #[test]
    fn peak_scales_to_frame_coordinates() {
        // Peak for Nose at heatmap cell (23, 11) in a 46x46 map.
        let maps = synthetic(19, 46, 46, &[(0, 23, 11, 0.9)]);
        let joints = decode(&maps, 640, 480, 0.2).unwrap();

        let nose = joints[BodyPart::Nose as usize].expect("nose present");
        assert_eq!(nose.x, 640.0 * 23.0 / 46.0);
        assert_eq!(nose.y, 480.0 * 11.0 / 46.0);
        assert_eq!(nose.confidence, 0.9);

        // Every other channel stayed at zero confidence.
        assert!(joints
            .iter()
            .enumerate()
            .all(|(id, j)| id == 0 || j.is_none()));
    }

    #[test]
    fn confidence_at_threshold_is_absent() {
        let maps = synthetic(19, 8, 8, &[(1, 4, 4, 0.2)]);
        let joints = decode(&maps, 100, 100, 0.2).unwrap();
        assert!(joints[BodyPart::Neck as usize].is_none());

        let maps = synthetic(19, 8, 8, &[(1, 4, 4, 0.21)]);
        let joints = decode(&maps, 100, 100, 0.2).unwrap();
        assert!(joints[BodyPart::Neck as usize].is_some());
    }

    #[test]
    fn background_channel_is_ignored() {
        let maps = synthetic(19, 8, 8, &[(18, 2, 2, 0.99)]);
        let joints = decode(&maps, 100, 100, 0.2).unwrap();
        assert!(joints.iter().all(|j| j.is_none()));
    }

    #[test]
    fn too_few_channels_is_an_error() {
        let maps = synthetic(17, 8, 8, &[]);
        let err = decode(&maps, 100, 100, 0.2).unwrap_err();
        assert!(err.to_string().contains("channels"));
    }

    #[test]
    fn buffer_length_must_match_dimensions() {
        assert!(Heatmaps::new(vec![0.0; 10], 19, 8, 8).is_err());
        assert!(Heatmaps::new(vec![0.0; 19 * 8 * 8], 19, 8, 8).is_ok());
    }
}
