//! Center logo loading and overlay.
//!
//! A logo `src` is classified into a [`LogoSource`] and decoded by a
//! [`LogoLoader`]. Decoding is synchronous; a failed load is reported to the
//! caller, which renders the code without the logo.

use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbaImage;
use resvg::tiny_skia::{FilterQuality, Paint, Pixmap, PixmapPaint, Rect, Transform};
use resvg::usvg::{Options, Tree};

use crate::color::Color;
use crate::raster;

/// Width of the white plate drawn around the logo, in pixels.
pub const PLATE_MARGIN: f32 = 5.0;

/// Logo edge as a share of the output width when no size is configured.
pub const DEFAULT_LOGO_RATIO: f32 = 0.2;

#[derive(thiserror::Error, Debug)]
pub enum LogoError {
    #[error("unsupported logo source: {0}")]
    Unsupported(String),

    #[error("failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to decode base64 logo data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read logo: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to render SVG logo: {0}")]
    Svg(String),
}

// ============================================================================
// LogoSource
// ============================================================================

/// Where a logo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// A local image file.
    Path(PathBuf),
    /// An inline `data:` URI.
    DataUri { mime: String, data: Vec<u8> },
    /// Inline SVG markup.
    Svg(String),
    /// An `http(s)` URL. Fetching is not supported.
    Remote(String),
}

impl LogoSource {
    /// Classifies a configured `src` string.
    pub fn parse(src: &str) -> Result<Self, LogoError> {
        let trimmed = src.trim();
        if trimmed.is_empty() {
            return Err(LogoError::Unsupported("empty source".into()));
        }
        if let Some(rest) = trimmed.strip_prefix("data:") {
            return parse_data_uri(rest);
        }
        if trimmed.starts_with("<svg") || trimmed.starts_with("<?xml") {
            return Ok(Self::Svg(trimmed.to_string()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(Self::Remote(trimmed.to_string()));
        }
        Ok(Self::Path(PathBuf::from(trimmed)))
    }
}

fn parse_data_uri(rest: &str) -> Result<LogoSource, LogoError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LogoError::Unsupported("data URI without payload".into()))?;
    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let data = if is_base64 {
        STANDARD.decode(payload.trim())?
    } else if mime == "image/svg+xml" {
        payload.as_bytes().to_vec()
    } else {
        return Err(LogoError::Unsupported(format!(
            "non-base64 data URI of type {mime}"
        )));
    };
    Ok(LogoSource::DataUri {
        mime: mime.to_string(),
        data,
    })
}

// ============================================================================
// Loading
// ============================================================================

/// Decodes a logo source into pixels.
pub trait LogoLoader: Send + Sync {
    /// Loads `src`. Vector sources are rasterized to fit `size` pixels;
    /// raster sources keep their native size.
    fn load(&self, src: &str, size: u32) -> Result<RgbaImage, LogoError>;
}

/// Loads files, data URIs and inline SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLogoLoader;

impl LogoLoader for DefaultLogoLoader {
    fn load(&self, src: &str, size: u32) -> Result<RgbaImage, LogoError> {
        match LogoSource::parse(src)? {
            LogoSource::Path(path) => {
                let bytes = std::fs::read(&path)?;
                if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("svg")) {
                    render_svg(&String::from_utf8_lossy(&bytes), size)
                } else {
                    Ok(image::load_from_memory(&bytes)?.to_rgba8())
                }
            }
            LogoSource::DataUri { mime, data } if mime == "image/svg+xml" => {
                render_svg(&String::from_utf8_lossy(&data), size)
            }
            LogoSource::DataUri { data, .. } => Ok(image::load_from_memory(&data)?.to_rgba8()),
            LogoSource::Svg(markup) => render_svg(&markup, size),
            LogoSource::Remote(url) => Err(LogoError::Unsupported(format!(
                "remote logo {url} cannot be fetched"
            ))),
        }
    }
}

/// Rasterizes SVG markup to fit within `size x size`, keeping its aspect
/// ratio.
pub fn render_svg(svg: &str, size: u32) -> Result<RgbaImage, LogoError> {
    let tree = Tree::from_str(svg, &Options::default()).map_err(|e| LogoError::Svg(e.to_string()))?;

    let svg_size = tree.size();
    let scale = size.max(1) as f32 / svg_size.width().max(svg_size.height());
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| LogoError::Svg(format!("invalid raster size {width}x{height}")))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    Ok(raster::pixmap_to_rgba_image(&pixmap))
}

// ============================================================================
// Overlay
// ============================================================================

/// Edge length of the logo for a `surface_width` output.
pub fn logo_size(configured: Option<f32>, surface_width: u32) -> f32 {
    configured.unwrap_or(surface_width as f32 * DEFAULT_LOGO_RATIO)
}

/// Draws a white plate and `logo` scaled to `size x size` at the center of
/// `surface`.
pub fn draw_logo(surface: &mut Pixmap, logo: &RgbaImage, size: f32, quality: FilterQuality) {
    let x = (surface.width() as f32 - size) / 2.0;
    let y = (surface.height() as f32 - size) / 2.0;

    let plate_edge = size + PLATE_MARGIN * 2.0;
    if let Some(plate) = Rect::from_xywh(x - PLATE_MARGIN, y - PLATE_MARGIN, plate_edge, plate_edge) {
        let mut paint = Paint::default();
        paint.set_color(Color::WHITE.to_skia());
        surface.fill_rect(plate, &paint, Transform::identity(), None);
    }

    let Some(pixmap) = raster::rgba_image_to_pixmap(logo) else {
        return;
    };
    let transform = Transform::from_translate(x, y).pre_scale(
        size / pixmap.width() as f32,
        size / pixmap.height() as f32,
    );
    let paint = PixmapPaint {
        quality,
        ..PixmapPaint::default()
    };
    surface.draw_pixmap(0, 0, pixmap.as_ref(), &paint, transform, None);
}
