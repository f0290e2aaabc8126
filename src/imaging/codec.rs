use crate::error::{PipelineError, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageEncoder, ImageFormat, RgbImage};
use std::path::Path;

/// Upload extensions accepted by the ingest stage
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Check the declared extension of an uploaded file (case-insensitive)
pub fn is_supported_upload(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Decode uploaded bytes into a 3-channel bitmap.
///
/// The content is sniffed rather than trusted from the filename, and only
/// JPEG and PNG are accepted. Any color mode (grayscale, palette, RGBA) is
/// flattened to RGB.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    let _span = tracing::debug_span!("decode", len = bytes.len()).entered();

    let format = image::guess_format(bytes)
        .map_err(|e| PipelineError::Decode(format!("unrecognized image data: {e}")))?;

    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(PipelineError::Decode(format!(
            "unsupported image format {format:?}, expected JPEG or PNG"
        )));
    }

    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    tracing::debug!(
        "Decoded {:?} {}x{} ({:?})",
        format,
        image.width(),
        image.height(),
        image.color()
    );

    Ok(image.to_rgb8())
}

/// Map the 10..=100 quality scale onto PNG compression effort.
///
/// PNG is lossless, so quality only trades file size against encode time:
/// higher quality compresses less and yields larger files.
pub fn compression_for_quality(quality: u8) -> CompressionType {
    match quality {
        90..=u8::MAX => CompressionType::Fast,
        50..=89 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode a bitmap as PNG bytes, keeping whatever channels it has
pub fn encode_png(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let _span = tracing::debug_span!("encode_png", quality).entered();

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buffer,
        compression_for_quality(quality),
        FilterType::Adaptive,
    );
    encoder.write_image(
        image.as_bytes(),
        image.width(),
        image.height(),
        image.color().into(),
    )?;

    Ok(buffer)
}
