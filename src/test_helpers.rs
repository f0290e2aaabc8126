//! Shared fixtures for unit tests.

use crate::segmentation::BackgroundRemover;
use anyhow::{bail, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn jpeg_bytes(image: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

/// Remover that keys out the left half of the frame, optionally after a delay.
///
/// `calls` counts every model invocation, shared so tests can read it after
/// the remover has been boxed.
pub struct HalfKeyRemover {
    pub delay: Duration,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
}

impl HalfKeyRemover {
    pub fn instant() -> Self {
        Self::slow(Duration::ZERO)
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::instant()
        }
    }
}

impl BackgroundRemover for HalfKeyRemover {
    fn remove_background(&mut self, image: &RgbImage) -> Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.fail {
            bail!("session run failed");
        }
        let half = image.width() / 2;
        Ok(RgbaImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            let alpha = if x < half { 0 } else { 255 };
            Rgba([r, g, b, alpha])
        }))
    }

    fn name(&self) -> &str {
        "half-key"
    }
}
