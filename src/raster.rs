//! Conversions between `image` buffers and tiny-skia pixmaps.
//!
//! tiny-skia stores premultiplied RGBA while `image` works with straight
//! alpha, so every hop between the two goes through these helpers.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{IntSize, Pixmap};

/// Converts a tiny-skia pixmap to a straight-alpha `RgbaImage`.
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let (r, g, b, a) = unpremultiply(src.red(), src.green(), src.blue(), src.alpha());
        *dst = Rgba([r, g, b, a]);
    }
    img
}

/// Converts a straight-alpha `RgbaImage` to a premultiplied pixmap.
///
/// Returns `None` for zero-sized images, which tiny-skia cannot represent.
pub fn rgba_image_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut data = Vec::with_capacity(img.as_raw().len());
    for pixel in img.pixels() {
        let [r, g, b, a] = premultiply(pixel.0);
        data.extend_from_slice(&[r, g, b, a]);
    }
    Pixmap::from_vec(data, size)
}

/// Unpremultiplies a premultiplied alpha pixel.
pub fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

fn premultiply([r, g, b, a]: [u8; 4]) -> [u8; 4] {
    let scale = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
    [scale(r), scale(g), scale(b), a]
}

/// Wraps PNG bytes in a `data:image/png;base64,` URI.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_round_trip_is_lossless() {
        let img = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 60, y as u8 * 80, 7, 255]));
        let pixmap = rgba_image_to_pixmap(&img).unwrap();
        assert_eq!(pixmap_to_rgba_image(&pixmap), img);
    }

    #[test]
    fn transparent_pixels_collapse_to_zero() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 10, 10, 0]));
        let pixmap = rgba_image_to_pixmap(&img).unwrap();
        assert_eq!(pixmap_to_rgba_image(&pixmap).get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn half_alpha_survives_within_rounding() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 128]));
        let back = pixmap_to_rgba_image(&rgba_image_to_pixmap(&img).unwrap());
        let p = back.get_pixel(0, 0).0;
        assert_eq!(p[3], 128);
        for (a, b) in p.iter().zip([200u8, 100, 50]) {
            assert!(a.abs_diff(b) <= 2);
        }
    }

    #[test]
    fn zero_sized_image_has_no_pixmap() {
        assert!(rgba_image_to_pixmap(&RgbaImage::new(0, 5)).is_none());
    }

    #[test]
    fn data_url_prefix() {
        let url = png_data_url(&[0x89, b'P', b'N', b'G']);
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }
}
