use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};

/// Resampler used for every proportional resize
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Dimensions after scaling both sides by `factor`, rounded to the nearest
/// pixel and never smaller than 1x1
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |side: u32| ((side as f64 * factor).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Dimensions that bring the longer side down to `max_dim`, or `None` if the
/// image already fits.
///
/// The longer side lands on `max_dim` exactly; the shorter side is rounded to
/// the nearest pixel in integer arithmetic.
pub fn fit_dimensions(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    let longer = width.max(height);
    if longer <= max_dim {
        return None;
    }

    let shrink = |side: u32| {
        let scaled = (side as u64 * max_dim as u64 + longer as u64 / 2) / longer as u64;
        (scaled as u32).max(1)
    };

    if width >= height {
        Some((max_dim, shrink(height)))
    } else {
        Some((shrink(width), max_dim))
    }
}

/// Proportionally resize by `factor`. A factor of 1.0 returns an exact copy.
pub fn scale_by<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    factor: f64,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    let target = scaled_dimensions(width, height, factor);
    if target == (width, height) {
        return image.clone();
    }

    let _span = tracing::debug_span!("scale_by", factor).entered();
    imageops::resize(image, target.0, target.1, RESIZE_FILTER)
}

/// Shrink so the longer side is at most `max_dim`. Images that already fit
/// come back pixel-identical.
pub fn fit_within<P>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    max_dim: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let (width, height) = image.dimensions();
    match fit_dimensions(width, height, max_dim) {
        Some((w, h)) => {
            let _span = tracing::debug_span!("fit_within", max_dim).entered();
            tracing::debug!("Downscaling {}x{} to {}x{}", width, height, w, h);
            imageops::resize(image, w, h, RESIZE_FILTER)
        }
        None => image.clone(),
    }
}
