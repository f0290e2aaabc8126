use image::{Rgb, RgbImage, RgbaImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Alpha-over composite onto an opaque solid background.
///
/// The alpha channel is the blend weight; the result carries no alpha.
/// Fully transparent pixels become `background` exactly and fully opaque
/// pixels keep their color exactly.
pub fn composite_over(image: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    let _span = tracing::debug_span!("composite_over").entered();

    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |fg: u8, bg: u8| {
            ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

/// True if any pixel is less than fully opaque
pub fn has_transparency(image: &RgbaImage) -> bool {
    image.pixels().any(|p| p[3] < u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn transparent_pixels_become_white() {
        let image = RgbaImage::from_pixel(3, 3, Rgba([12, 200, 90, 0]));
        let out = composite_over(&image, WHITE);
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn opaque_pixels_are_preserved() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([12, 200, 90, 255]));
        let out = composite_over(&image, WHITE);
        assert!(out.pixels().all(|p| p.0 == [12, 200, 90]));
    }

    #[test]
    fn partial_alpha_blends() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let out = composite_over(&image, WHITE);
        // 255 * 127 / 255
        assert_eq!(out.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn mixed_image_per_pixel() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 255]));
        image.put_pixel(1, 0, Rgba([1, 2, 3, 0]));
        let out = composite_over(&image, Rgb([10, 20, 30]));
        assert_eq!(out.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(out.get_pixel(1, 0).0, [10, 20, 30]);
        // input untouched
        assert_eq!(image.get_pixel(1, 0).0, [1, 2, 3, 0]);
    }

    #[test]
    fn detects_transparency() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        assert!(!has_transparency(&image));
        image.put_pixel(1, 1, Rgba([0, 0, 0, 254]));
        assert!(has_transparency(&image));
    }
}
