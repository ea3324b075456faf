//! Background fill, complexity tiers and the drop shadow.

use image::{Rgba, RgbaImage, imageops};
use resvg::tiny_skia::{
    FilterQuality, LinearGradient, Paint, Pixmap, PixmapPaint, Point, RadialGradient, Rect,
    Shader, SpreadMode, Transform,
};

use crate::color::Color;
use crate::config::{ColorConfig, GradientKind};
use crate::module::shape::even_stops;
use crate::raster;

/// Offset of the shadow duplicate, in pixels.
pub const SHADOW_OFFSET: i64 = 2;
/// Gaussian sigma of the shadow blur.
pub const SHADOW_BLUR_SIGMA: f32 = 1.0;
/// Alpha of the base raster inside the shadow layer.
pub const SHADOW_INNER_ALPHA: f32 = 0.3;
/// Alpha the shadow layer is composited with.
pub const SHADOW_OPACITY: f32 = 0.1;

// ============================================================================
// Background
// ============================================================================

/// Fills `surface` with the configured background.
///
/// A gradient with at least one color replaces the light color. Linear
/// gradients run corner to corner; radial ones are centered with a radius of
/// half the width.
pub fn draw_background(surface: &mut Pixmap, colors: &ColorConfig) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    let light = Color::parse_or(&colors.light, Color::WHITE);

    let shader = colors
        .gradient
        .as_ref()
        .filter(|g| !g.colors.is_empty())
        .and_then(|g| {
            let stops: Vec<Color> = g
                .colors
                .iter()
                .map(|c| Color::parse_or(c, Color::WHITE))
                .collect();
            let stops = even_stops(&stops);
            match g.kind {
                GradientKind::Linear => LinearGradient::new(
                    Point::from_xy(0.0, 0.0),
                    Point::from_xy(w, h),
                    stops,
                    SpreadMode::Pad,
                    Transform::identity(),
                ),
                GradientKind::Radial => {
                    let center = Point::from_xy(w / 2.0, h / 2.0);
                    RadialGradient::new(
                        center,
                        center,
                        w / 2.0,
                        stops,
                        SpreadMode::Pad,
                        Transform::identity(),
                    )
                }
            }
        });

    let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) else {
        return;
    };
    let mut paint = Paint::default();
    match shader {
        Some(shader) => paint.shader = shader,
        None => paint.shader = Shader::SolidColor(light.to_skia()),
    }
    surface.fill_rect(rect, &paint, Transform::identity(), None);
}

// ============================================================================
// Complexity tiers
// ============================================================================

/// Visual preset selected by the 1-10 complexity level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityTier {
    /// Smooth (bicubic) resampling of scaled images.
    pub smoothing: bool,
    /// Contrast multiplier around mid-gray.
    pub contrast: f32,
    /// Brightness multiplier.
    pub brightness: f32,
    /// Composite a blurred duplicate of the base raster.
    pub shadow: bool,
}

impl ComplexityTier {
    /// Resolves the tier for a complexity level. Levels above 10 use the top tier.
    pub fn for_level(complexity: u8) -> Self {
        let (smoothing, contrast, brightness, shadow) = match complexity {
            0..=2 => (false, 1.2, 1.1, false),
            3..=4 => (true, 1.1, 1.05, false),
            5..=6 => (true, 1.0, 1.0, false),
            7..=8 => (true, 1.05, 1.02, false),
            _ => (true, 1.02, 1.01, true),
        };
        Self {
            smoothing,
            contrast,
            brightness,
            shadow,
        }
    }

    /// Returns true when the content layer needs a filter pass.
    pub fn has_filter(&self) -> bool {
        self.contrast != 1.0 || self.brightness != 1.0
    }

    /// Logo resampling quality: bicubic when smoothing, nearest otherwise.
    pub fn filter_quality(&self) -> FilterQuality {
        if self.smoothing {
            FilterQuality::Bicubic
        } else {
            FilterQuality::Nearest
        }
    }

    /// Applies contrast then brightness to one straight-alpha channel.
    pub fn filter_channel(&self, value: u8) -> u8 {
        let v = f32::from(value) / 255.0;
        let v = (v - 0.5) * self.contrast + 0.5;
        let v = v * self.brightness;
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Filters every pixel of `layer` in place. Alpha is preserved.
    pub fn apply_filter(&self, layer: &mut Pixmap) {
        if !self.has_filter() {
            return;
        }
        let mut image = raster::pixmap_to_rgba_image(layer);
        for pixel in image.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            *pixel = Rgba([
                self.filter_channel(r),
                self.filter_channel(g),
                self.filter_channel(b),
                a,
            ]);
        }
        if let Some(filtered) = raster::rgba_image_to_pixmap(&image) {
            *layer = filtered;
        }
    }
}

// ============================================================================
// Shadow
// ============================================================================

/// Composites a soft, offset duplicate of `base` onto `surface`.
pub fn draw_shadow(surface: &mut Pixmap, base: &RgbaImage) {
    let mut layer = RgbaImage::new(surface.width(), surface.height());
    let faded = RgbaImage::from_fn(base.width(), base.height(), |x, y| {
        let [r, g, b, a] = base.get_pixel(x, y).0;
        Rgba([r, g, b, (f32::from(a) * SHADOW_INNER_ALPHA).round() as u8])
    });
    imageops::overlay(&mut layer, &faded, SHADOW_OFFSET, SHADOW_OFFSET);
    let blurred = imageops::blur(&layer, SHADOW_BLUR_SIGMA);

    let Some(shadow) = raster::rgba_image_to_pixmap(&blurred) else {
        return;
    };
    let paint = PixmapPaint {
        opacity: SHADOW_OPACITY,
        ..PixmapPaint::default()
    };
    surface.draw_pixmap(0, 0, shadow.as_ref(), &paint, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GradientConfig;

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pixmap.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn solid_background_uses_light_color() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        let colors = ColorConfig {
            light: "#102030".into(),
            ..ColorConfig::default()
        };
        draw_background(&mut pixmap, &colors);
        assert_eq!(rgba(&pixmap, 0, 0), [0x10, 0x20, 0x30, 255]);
        assert_eq!(rgba(&pixmap, 9, 9), [0x10, 0x20, 0x30, 255]);
    }

    #[test]
    fn invalid_light_color_falls_back_to_white() {
        let mut pixmap = Pixmap::new(4, 4).unwrap();
        let colors = ColorConfig {
            light: "transparent".into(),
            ..ColorConfig::default()
        };
        draw_background(&mut pixmap, &colors);
        assert_eq!(rgba(&pixmap, 2, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn linear_background_runs_corner_to_corner() {
        let mut pixmap = Pixmap::new(50, 50).unwrap();
        let colors = ColorConfig {
            gradient: Some(GradientConfig {
                kind: GradientKind::Linear,
                colors: vec!["#ff0000".into(), "#0000ff".into()],
            }),
            ..ColorConfig::default()
        };
        draw_background(&mut pixmap, &colors);
        let top_left = rgba(&pixmap, 0, 0);
        let bottom_right = rgba(&pixmap, 49, 49);
        assert!(top_left[0] > 240 && top_left[2] < 15);
        assert!(bottom_right[2] > 240 && bottom_right[0] < 15);
    }

    #[test]
    fn radial_background_is_centered() {
        let mut pixmap = Pixmap::new(40, 40).unwrap();
        let colors = ColorConfig {
            gradient: Some(GradientConfig {
                kind: GradientKind::Radial,
                colors: vec!["#ffffff".into(), "#000000".into()],
            }),
            ..ColorConfig::default()
        };
        draw_background(&mut pixmap, &colors);
        assert!(rgba(&pixmap, 20, 20)[0] > 230);
        assert!(rgba(&pixmap, 0, 0)[0] < 10);
    }

    #[test]
    fn tiers_follow_complexity_bands() {
        let minimal = ComplexityTier::for_level(1);
        assert!(!minimal.smoothing);
        assert_eq!((minimal.contrast, minimal.brightness), (1.2, 1.1));
        assert_eq!(minimal.filter_quality(), FilterQuality::Nearest);

        let standard = ComplexityTier::for_level(5);
        assert!(standard.smoothing && !standard.has_filter() && !standard.shadow);

        assert_eq!(ComplexityTier::for_level(4).contrast, 1.1);
        assert_eq!(ComplexityTier::for_level(8).brightness, 1.02);
        assert!(ComplexityTier::for_level(9).shadow);
        assert!(ComplexityTier::for_level(10).shadow);
    }

    #[test]
    fn filter_channel_spreads_from_mid_gray() {
        let tier = ComplexityTier::for_level(1);
        assert_eq!(tier.filter_channel(0), 0);
        assert_eq!(tier.filter_channel(255), 255);
        // 0.75 -> 0.8 -> 0.88
        assert_eq!(tier.filter_channel(191), 224);
    }

    #[test]
    fn filter_keeps_transparent_pixels() {
        let mut layer = Pixmap::new(2, 1).unwrap();
        layer.fill(resvg::tiny_skia::Color::from_rgba8(128, 128, 128, 255));
        layer.pixels_mut()[1] = resvg::tiny_skia::PremultipliedColorU8::TRANSPARENT;
        ComplexityTier::for_level(2).apply_filter(&mut layer);
        assert_eq!(rgba(&layer, 1, 0)[3], 0);
        assert!(rgba(&layer, 0, 0)[0] > 128);
    }

    #[test]
    fn shadow_is_faint_and_offset() {
        let mut surface = Pixmap::new(20, 20).unwrap();
        surface.fill(resvg::tiny_skia::Color::WHITE);
        let base = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        draw_shadow(&mut surface, &base);

        let inside = rgba(&surface, 7, 7)[0];
        assert!(inside < 255 && inside > 240);
        assert_eq!(rgba(&surface, 18, 18)[0], 255);
    }
}
