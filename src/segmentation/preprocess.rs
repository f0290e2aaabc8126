use super::types::Matte;
use anyhow::{ensure, Result};
use image::{imageops, GrayImage, Luma, RgbImage, Rgba, RgbaImage};
use ndarray::Array4;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocessor for converting RGB images to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Preprocessor {
    /// Preprocessor with ImageNet mean/std normalization
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// Preprocess an RGB image into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Scale by the brightest channel value so the max lands on 1.0
    /// 3. Subtract mean and divide by std per channel
    /// 4. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Lanczos3,
            )
        } else {
            image.clone()
        };

        let peak = resized.as_raw().iter().copied().max().unwrap_or(0).max(1) as f32;

        let (width, height) = resized.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                let value = pixel[c] as f32 / peak;
                tensor[[0, c, y as usize, x as usize]] = (value - self.mean[c]) / self.std[c];
            }
        }

        Ok(tensor)
    }

    /// Stretch a raw prediction to the full [0, 1] range
    ///
    /// A flat prediction (max == min) maps to all zeros.
    pub fn normalize_matte(raw: &[f32]) -> Matte {
        let (min, max) = raw
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        if !range.is_finite() || range <= f32::EPSILON {
            return vec![0.0; raw.len()];
        }
        raw.iter().map(|v| (v - min) / range).collect()
    }

    /// Turn a normalized `matte_width` x `matte_height` matte (values in 0..=1,
    /// row-major) into an 8-bit alpha mask resized to the target dimensions.
    ///
    /// Fails when the matte length does not match its stated dimensions.
    pub fn postprocess_matte(
        matte: &[f32],
        matte_width: u32,
        matte_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<GrayImage> {
        let _span = tracing::debug_span!("postprocess").entered();

        ensure!(
            matte.len() == (matte_width as usize) * (matte_height as usize),
            "matte has {} values, expected {}x{}",
            matte.len(),
            matte_width,
            matte_height
        );

        let mask = GrayImage::from_fn(matte_width, matte_height, |x, y| {
            let idx = (y * matte_width + x) as usize;
            let value = (matte[idx] * 255.0).clamp(0.0, 255.0) as u8;
            Luma([value])
        });

        if (matte_width, matte_height) == (target_width, target_height) {
            return Ok(mask);
        }

        Ok(imageops::resize(
            &mask,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        ))
    }

    /// Use a mask as the alpha channel of an RGB image
    pub fn apply_alpha(image: &RgbImage, mask: &GrayImage) -> Result<RgbaImage> {
        ensure!(
            image.dimensions() == mask.dimensions(),
            "mask is {:?} but image is {:?}",
            mask.dimensions(),
            image.dimensions()
        );

        Ok(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            Rgba([r, g, b, mask.get_pixel(x, y)[0]])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn tensor_shape_is_nchw() {
        let pre = Preprocessor::new(8, 4);
        let tensor = pre.preprocess(&RgbImage::new(20, 10)).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 4, 8]);
    }

    #[test]
    fn brightest_value_normalizes_to_one() {
        let pre = Preprocessor::new(2, 2);
        let image = RgbImage::from_pixel(2, 2, Rgb([100, 50, 0]));
        let tensor = pre.preprocess(&image).unwrap();
        let red = tensor[[0, 0, 0, 0]];
        assert!((red - (1.0 - 0.485) / 0.229).abs() < 1e-5);
        let blue = tensor[[0, 2, 1, 1]];
        assert!((blue - (0.0 - 0.406) / 0.225).abs() < 1e-5);
    }

    #[test]
    fn black_image_does_not_divide_by_zero() {
        let pre = Preprocessor::new(2, 2);
        let tensor = pre.preprocess(&RgbImage::new(2, 2)).unwrap();
        assert!(tensor.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn normalize_stretches_range() {
        let matte = Preprocessor::normalize_matte(&[0.2, 0.4, 0.6]);
        assert!((matte[0] - 0.0).abs() < 1e-6);
        assert!((matte[1] - 0.5).abs() < 1e-6);
        assert!((matte[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_flat_prediction() {
        assert_eq!(Preprocessor::normalize_matte(&[0.3; 4]), vec![0.0; 4]);
    }

    #[test]
    fn postprocess_resizes_to_target() {
        let mask = Preprocessor::postprocess_matte(&[1.0; 16], 4, 4, 10, 6).unwrap();
        assert_eq!(mask.dimensions(), (10, 6));
        assert!(mask.pixels().all(|p| p[0] >= 254));
    }

    #[test]
    fn postprocess_maps_row_major_matte_to_bytes() {
        let mask = Preprocessor::postprocess_matte(&[0.0, 1.0, 0.5, 0.0], 2, 2, 2, 2).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(1, 0)[0], 255);
        assert_eq!(mask.get_pixel(0, 1)[0], 127);
    }

    #[test]
    fn postprocess_rejects_wrong_length() {
        assert!(Preprocessor::postprocess_matte(&[1.0; 5], 4, 4, 4, 4).is_err());
    }

    #[test]
    fn alpha_comes_from_mask() {
        let image = RgbImage::from_pixel(2, 1, Rgb([9, 8, 7]));
        let mut mask = GrayImage::new(2, 1);
        mask.put_pixel(1, 0, Luma([200]));
        let out = Preprocessor::apply_alpha(&image, &mask).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [9, 8, 7, 0]);
        assert_eq!(out.get_pixel(1, 0).0, [9, 8, 7, 200]);
    }
}
