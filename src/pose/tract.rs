#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::frame::Frame;
use crate::heatmap::Heatmaps;
use crate::pose::PoseEstimator;
use crate::skeleton::BodyPart;

/// Tract-based OpenPose estimator.
///
/// Loads an ONNX export of the OpenPose COCO graph and runs it on RGB
/// frames. The frame is resampled to the model input size and mean-shifted
/// (pixel - 127.5, the normalization the graph was trained with). The model
/// output is expected as [1, C, H, W] with C >= 19.
pub struct TractEstimator {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    input_width: u32,
    input_height: u32,
}

impl TractEstimator {
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
        })
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let expected_len = (frame.width as usize)
            .checked_mul(frame.height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if frame.pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                frame.pixels.len()
            ));
        }

        let (in_w, in_h) = (self.input_width as usize, self.input_height as usize);
        let (src_w, src_h) = (frame.width as usize, frame.height as usize);

        // Nearest-neighbor resample to the model input size, channel-first,
        // mean-shifted to the graph's expected range.
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, in_h, in_w), |(_, channel, y, x)| {
                let src_x = x * src_w / in_w;
                let src_y = y * src_h / in_h;
                let idx = (src_y * src_w + src_x) * 3 + channel;
                frame.pixels[idx] as f32 - 127.5
            });

        Ok(input.into_tensor())
    }

    fn extract_heatmaps(&self, outputs: TVec<TValue>) -> Result<Heatmaps> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape();
        if shape.len() != 4 || shape[0] != 1 {
            return Err(anyhow!(
                "unexpected model output shape {:?}; expected [1, C, H, W]",
                shape
            ));
        }
        let (channels, height, width) = (shape[1], shape[2], shape[3]);
        if channels < BodyPart::NAMED_COUNT {
            return Err(anyhow!(
                "model produced {} channels, joint table expects at least {}",
                channels,
                BodyPart::NAMED_COUNT
            ));
        }

        let data: Vec<f32> = view.iter().copied().collect();
        Heatmaps::new(data, channels, width, height)
    }
}

impl PoseEstimator for TractEstimator {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn estimate(&mut self, frame: &Frame) -> Result<Heatmaps> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_heatmaps(outputs)
    }
}
