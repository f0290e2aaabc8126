use super::preprocess::Preprocessor;
use super::types::BackgroundRemover;
use anyhow::{ensure, Context, Result};
use image::{RgbImage, RgbaImage};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Input resolution of the U²-Net family of salient-object models
const U2NET_INPUT_SIZE: u32 = 320;

/// U²-Net salient object segmentation
///
/// Stateless between calls: every image is segmented independently and the
/// first model output (the fused side output) is used as the matte.
pub struct U2Net {
    session: Session,
    preprocessor: Preprocessor,
    name: String,
}

impl U2Net {
    /// Create a new U²-Net remover from an ONNX file
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file (`u2net.onnx`,
    ///   `u2netp.onnx` or any model with the same input/output layout)
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading U2Net model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("U2Net model loaded successfully");

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("u2net")
            .to_string();

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(U2NET_INPUT_SIZE, U2NET_INPUT_SIZE),
            name,
        })
    }
}

impl BackgroundRemover for U2Net {
    fn remove_background(&mut self, image: &RgbImage) -> Result<RgbaImage> {
        let _span = tracing::debug_span!("u2net_remove_background").entered();

        let input_tensor = self.preprocessor.preprocess(image)?;
        let input = Tensor::from_array(input_tensor)?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![input])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let prediction = outputs[0].try_extract_array::<f32>()?;
        let (matte_width, matte_height) = matte_dimensions(prediction.shape())?;

        let raw: Vec<f32> = prediction
            .iter()
            .take(matte_width as usize * matte_height as usize)
            .copied()
            .collect();
        drop(outputs);

        let matte = Preprocessor::normalize_matte(&raw);
        let (width, height) = image.dimensions();
        let mask = Preprocessor::postprocess_matte(&matte, matte_width, matte_height, width, height)?;

        Preprocessor::apply_alpha(image, &mask)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Width and height of a `[1, 1, H, W]` prediction
fn matte_dimensions(shape: &[usize]) -> Result<(u32, u32)> {
    ensure!(
        shape.len() == 4,
        "unexpected prediction shape {:?}, expected [1, 1, H, W]",
        shape
    );
    let height = u32::try_from(shape[2]).context("prediction height does not fit in u32")?;
    let width = u32::try_from(shape[3]).context("prediction width does not fit in u32")?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matte_dimensions_reads_height_then_width() {
        assert_eq!(matte_dimensions(&[1, 1, 320, 240]).unwrap(), (240, 320));
    }

    #[test]
    fn matte_dimensions_rejects_other_ranks() {
        assert!(matte_dimensions(&[1, 320, 320]).is_err());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn matte_dimensions_rejects_oversized_axes() {
        let too_big = u32::MAX as usize + 1;
        let err = matte_dimensions(&[1, 1, too_big, 4]).unwrap_err();
        assert!(format!("{err:#}").contains("height"));
    }
}
