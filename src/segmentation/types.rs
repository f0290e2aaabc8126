use anyhow::Result;
use image::{RgbImage, RgbaImage};

/// Soft foreground matte: 0.0 = background, 1.0 = foreground,
/// flattened in row-major order
pub type Matte = Vec<f32>;

/// Trait for background removal backends
///
/// Implementations are opaque and potentially slow. The pipeline calls
/// `remove_background` from a worker thread, hence the `Send` bound.
pub trait BackgroundRemover: Send {
    /// Cut the foreground out of an RGB image
    ///
    /// # Returns
    /// * Image of the same dimensions whose background pixels carry alpha 0
    ///   (or partial alpha along soft edges)
    fn remove_background(&mut self, image: &RgbImage) -> Result<RgbaImage>;

    /// Short human-readable backend name, used in logs
    fn name(&self) -> &str;
}
