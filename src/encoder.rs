//! QR symbol encoding and the unstyled base outputs.
//!
//! The symbol itself (Reed-Solomon, masking, version selection) comes from
//! the `qrcode` crate behind the [`QrEncoder`] trait. This module only turns
//! the resulting [`ModuleGrid`] into the plain raster the styling pipeline
//! samples from, and into the vector markup used by SVG export.

use image::RgbaImage;
use qrcode::{EcLevel, QrCode};

use crate::color::Color;
use crate::config::ErrorCorrectionLevel;

// ============================================================================
// ModuleGrid
// ============================================================================

/// A square matrix of QR modules, `true` meaning dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    width: usize,
    modules: Vec<bool>,
}

impl ModuleGrid {
    /// Builds a grid from row-major modules. Returns `None` unless
    /// `modules.len() == width * width`.
    pub fn new(width: usize, modules: Vec<bool>) -> Option<Self> {
        (modules.len() == width * width).then_some(Self { width, modules })
    }

    /// Builds a grid by evaluating `f(x, y)` for every module.
    pub fn from_fn(width: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let modules = (0..width * width).map(|i| f(i % width, i / width)).collect();
        Self { width, modules }
    }

    /// Number of modules along one edge.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns true for a dark module. Out-of-range coordinates are light.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.modules[y * self.width + x]
    }

    /// Number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|m| **m).count()
    }
}

// ============================================================================
// Encoder interface
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("{0}")]
    Data(#[from] qrcode::types::QrError),

    #[error("encoder produced an empty module grid")]
    EmptyGrid,

    #[error("raster edge of {edge}px exceeds the {limit}px limit", limit = MAX_RASTER_EDGE)]
    TooLarge { edge: u64 },
}

/// Options shared by the raster and vector outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// Requested output width in pixels.
    pub width: u32,
    pub error_correction_level: ErrorCorrectionLevel,
    pub dark: Color,
    pub light: Color,
    /// Quiet zone in modules.
    pub margin: u32,
    /// Pixels per module, used when `width` cannot fit the symbol.
    pub scale: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            width: 200,
            error_correction_level: ErrorCorrectionLevel::Medium,
            dark: Color::BLACK,
            light: Color::WHITE,
            margin: 4,
            scale: 4,
        }
    }
}

/// The symbol encoder the renderer is built on.
///
/// Implementors provide [`encode`](Self::encode); the raster and vector
/// outputs have default implementations in terms of the module grid.
pub trait QrEncoder {
    /// Encodes `text` into a module grid at `level`.
    fn encode(&self, text: &str, level: ErrorCorrectionLevel) -> Result<ModuleGrid, EncodeError>;

    /// Encodes `text` and renders the unstyled base raster.
    fn encode_to_raster(&self, text: &str, opts: &EncodeOptions) -> Result<RgbaImage, EncodeError> {
        let grid = self.encode(text, opts.error_correction_level)?;
        rasterize(&grid, opts)
    }

    /// Encodes `text` and serializes it as SVG markup.
    fn encode_to_vector(&self, text: &str, opts: &EncodeOptions) -> Result<String, EncodeError> {
        let grid = self.encode(text, opts.error_correction_level)?;
        vectorize(&grid, opts)
    }
}

/// [`QrEncoder`] backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder;

impl QrEncoder for QrcodeEncoder {
    fn encode(&self, text: &str, level: ErrorCorrectionLevel) -> Result<ModuleGrid, EncodeError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), level.into())?;
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == qrcode::Color::Dark)
            .collect();
        ModuleGrid::new(code.width(), modules).ok_or(EncodeError::EmptyGrid)
    }
}

impl From<ErrorCorrectionLevel> for EcLevel {
    fn from(level: ErrorCorrectionLevel) -> Self {
        match level {
            ErrorCorrectionLevel::Low => EcLevel::L,
            ErrorCorrectionLevel::Medium => EcLevel::M,
            ErrorCorrectionLevel::Quartile => EcLevel::Q,
            ErrorCorrectionLevel::High => EcLevel::H,
        }
    }
}

// ============================================================================
// Base outputs
// ============================================================================

/// Largest edge, in pixels, of a base raster.
pub const MAX_RASTER_EDGE: u32 = 16_384;

/// Edge length and pixels per module for the requested width.
///
/// A width that can hold one pixel per module (quiet zone included) is
/// honored exactly with a fractional scale; anything smaller falls back to
/// the integer `scale`.
fn raster_edge(symbol_width: usize, opts: &EncodeOptions) -> Result<(u32, f64), EncodeError> {
    let total = symbol_width as u64 + 2 * u64::from(opts.margin);
    let (edge, scale) = if u64::from(opts.width) >= total {
        (u64::from(opts.width), f64::from(opts.width) / total as f64)
    } else {
        (total.saturating_mul(u64::from(opts.scale)), f64::from(opts.scale))
    };
    match u32::try_from(edge) {
        Ok(edge) if edge <= MAX_RASTER_EDGE => Ok((edge, scale)),
        _ => Err(EncodeError::TooLarge { edge }),
    }
}

/// Renders the grid as an unstyled, fully opaque raster.
pub fn rasterize(grid: &ModuleGrid, opts: &EncodeOptions) -> Result<RgbaImage, EncodeError> {
    let n = grid.width();
    if n == 0 {
        return Err(EncodeError::EmptyGrid);
    }

    let (image_width, scale) = raster_edge(n, opts)?;
    let margin_px = f64::from(opts.margin) * scale;
    let symbol_end = f64::from(image_width) - margin_px;

    let dark = opts.dark.to_rgba();
    let light = opts.light.to_rgba();

    let image = RgbaImage::from_fn(image_width, image_width, |x, y| {
        let (fx, fy) = (f64::from(x), f64::from(y));
        let inside = fx >= margin_px && fy >= margin_px && fx < symbol_end && fy < symbol_end;
        if !inside {
            return light;
        }
        let mx = (((fx - margin_px) / scale).floor() as usize).min(n - 1);
        let my = (((fy - margin_px) / scale).floor() as usize).min(n - 1);
        if grid.is_dark(mx, my) { dark } else { light }
    });

    Ok(image)
}

/// Serializes the grid as SVG markup.
///
/// One background path in the light color plus one stroked path holding a
/// horizontal run per contiguous stretch of dark modules.
pub fn vectorize(grid: &ModuleGrid, opts: &EncodeOptions) -> Result<String, EncodeError> {
    let n = grid.width();
    if n == 0 {
        return Err(EncodeError::EmptyGrid);
    }
    let margin = opts.margin as usize;
    let total = n + 2 * margin;

    let mut runs = String::new();
    for y in 0..n {
        let mut x = 0;
        while x < n {
            if !grid.is_dark(x, y) {
                x += 1;
                continue;
            }
            let start = x;
            while x < n && grid.is_dark(x, y) {
                x += 1;
            }
            runs.push_str(&format!("M{} {}.5h{}", start + margin, y + margin, x - start));
        }
    }

    Ok(format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{w}" "#,
            r#"viewBox="0 0 {t} {t}" shape-rendering="crispEdges">"#,
            r#"<path fill="{light}" d="M0 0h{t}v{t}H0z"/>"#,
            r#"<path stroke="{dark}" d="{runs}"/></svg>"#,
            "\n"
        ),
        w = opts.width,
        t = total,
        light = opts.light.to_hex(),
        dark = opts.dark.to_hex(),
        runs = runs,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: usize) -> ModuleGrid {
        ModuleGrid::from_fn(width, |x, y| (x + y) % 2 == 0)
    }

    #[test]
    fn grid_rejects_wrong_length() {
        assert!(ModuleGrid::new(3, vec![false; 8]).is_none());
        let grid = ModuleGrid::new(2, vec![true, false, false, true]).unwrap();
        assert!(grid.is_dark(0, 0));
        assert!(!grid.is_dark(1, 0));
        assert!(!grid.is_dark(5, 5));
        assert_eq!(grid.dark_count(), 2);
    }

    #[test]
    fn encoder_produces_square_grid() {
        let grid = QrcodeEncoder
            .encode("https://example.com", ErrorCorrectionLevel::High)
            .unwrap();
        assert!(grid.width() >= 21);
        assert_eq!((grid.width() - 21) % 4, 0);
        // Top-left finder pattern corner is always dark.
        assert!(grid.is_dark(0, 0));
    }

    #[test]
    fn higher_level_never_shrinks_symbol() {
        let text = "The quick brown fox jumps over the lazy dog";
        let low = QrcodeEncoder.encode(text, ErrorCorrectionLevel::Low).unwrap();
        let high = QrcodeEncoder.encode(text, ErrorCorrectionLevel::High).unwrap();
        assert!(high.width() >= low.width());
    }

    #[test]
    fn raster_honors_requested_width() {
        let opts = EncodeOptions {
            width: 300,
            ..EncodeOptions::default()
        };
        let image = rasterize(&checker(21), &opts).unwrap();
        assert_eq!(image.dimensions(), (300, 300));
    }

    #[test]
    fn raster_falls_back_to_integer_scale() {
        let opts = EncodeOptions {
            width: 8,
            margin: 2,
            scale: 3,
            ..EncodeOptions::default()
        };
        let image = rasterize(&checker(5), &opts).unwrap();
        // (5 + 2*2) modules * 3px
        assert_eq!(image.width(), 27);
        // Quiet zone is light, first module (dark) starts at 6px.
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(6, 6).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(9, 6).0, [255, 255, 255, 255]);
    }

    #[test]
    fn oversized_raster_is_rejected_before_allocating() {
        let huge_margin = EncodeOptions {
            margin: 1 << 31,
            ..EncodeOptions::default()
        };
        assert!(matches!(
            rasterize(&checker(21), &huge_margin),
            Err(EncodeError::TooLarge { .. })
        ));

        let huge_scale = EncodeOptions {
            width: 10,
            scale: u32::MAX,
            ..EncodeOptions::default()
        };
        assert!(matches!(
            rasterize(&checker(21), &huge_scale),
            Err(EncodeError::TooLarge { .. })
        ));

        let huge_width = EncodeOptions {
            width: MAX_RASTER_EDGE + 1,
            ..EncodeOptions::default()
        };
        assert!(matches!(
            rasterize(&checker(21), &huge_width),
            Err(EncodeError::TooLarge { edge }) if edge == u64::from(MAX_RASTER_EDGE) + 1
        ));
    }

    #[test]
    fn raster_uses_configured_colors() {
        let opts = EncodeOptions {
            width: 9,
            margin: 0,
            scale: 1,
            dark: Color::from_rgb(200, 0, 0),
            light: Color::from_rgb(0, 0, 200),
            ..EncodeOptions::default()
        };
        let image = rasterize(&checker(3), &opts).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [200, 0, 0, 255]);
        assert_eq!(image.get_pixel(4, 0).0, [0, 0, 200, 255]);
    }

    #[test]
    fn vector_has_viewbox_and_runs() {
        let grid = ModuleGrid::new(2, vec![true, true, false, true]).unwrap();
        let opts = EncodeOptions {
            width: 120,
            margin: 1,
            ..EncodeOptions::default()
        };
        let svg = vectorize(&grid, &opts).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="120""#));
        assert!(svg.contains(r#"viewBox="0 0 4 4""#));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r##"stroke="#000000""##));
        assert!(svg.contains("M1 1.5h2"));
        assert!(svg.contains("M2 2.5h1"));
    }
}
