//! Public entry points.
//!
//! [`QrCodeGenerator`] is a stateless service: every call encodes the text,
//! builds a fresh [`StyleCompositor`] and returns owned output. The encoder,
//! logo loader and clock are pluggable for testing and embedding.
//!
//! # Example
//!
//! ```
//! use qr_stylist::{ErrorCorrectionLevel, QrCodeGenerator, RenderConfig, Shape};
//!
//! let generator = QrCodeGenerator::new();
//! let config = RenderConfig::new()
//!     .with_size(300)
//!     .with_error_correction_level(ErrorCorrectionLevel::High)
//!     .with_shape(Shape::Rounded);
//!
//! let result = generator.generate("https://example.com", &config).unwrap();
//! assert_eq!(result.width, 300);
//! assert!(result.data_url.starts_with("data:image/png;base64,"));
//! ```

use std::io::Cursor;
use std::path::PathBuf;

use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia::Pixmap;

use crate::color::Color;
use crate::compositor::StyleCompositor;
use crate::config::RenderConfig;
use crate::encoder::{EncodeOptions, QrEncoder, QrcodeEncoder};
use crate::error::{Result, Stage, StageError, StylistError};
use crate::logo::{DefaultLogoLoader, LogoLoader};
use crate::module::animation::{Clock, SystemClock};
use crate::raster;

/// Output of [`QrCodeGenerator::generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct QrCodeResult {
    /// `data:image/png;base64,...`
    pub data_url: String,
    /// Encoded PNG bytes.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// The configuration actually rendered, after color optimization.
    pub options: RenderConfig,
}

/// Export side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Write the output to this file as well as returning it.
    pub file_name: Option<PathBuf>,
}

impl ExportOptions {
    /// Export options that write to `path`.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: Some(path.into()),
        }
    }
}

/// Renders styled QR codes.
pub struct QrCodeGenerator {
    encoder: Box<dyn QrEncoder + Send + Sync>,
    logo_loader: Box<dyn LogoLoader>,
    clock: Box<dyn Clock>,
}

impl Default for QrCodeGenerator {
    fn default() -> Self {
        Self {
            encoder: Box::new(QrcodeEncoder),
            logo_loader: Box::new(DefaultLogoLoader),
            clock: Box::new(SystemClock::new()),
        }
    }
}

impl QrCodeGenerator {
    /// Creates a generator with the `qrcode` encoder, default logo loader and system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the symbol encoder.
    pub fn with_encoder(mut self, encoder: impl QrEncoder + Send + Sync + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Replaces the logo loader.
    pub fn with_logo_loader(mut self, loader: impl LogoLoader + 'static) -> Self {
        self.logo_loader = Box::new(loader);
        self
    }

    /// Sets the clock animated renders sample their progress from.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Renders `text` to a PNG and its data URI.
    #[tracing::instrument(skip(self, config), fields(len = text.len(), size = config.size))]
    pub fn generate(&self, text: &str, config: &RenderConfig) -> Result<QrCodeResult> {
        validate(text, config)?;
        let options = config.optimized_for_scanning();

        let image = self.render_image(text, &options, Stage::Generate)?;
        let png = encode_png(&image).map_err(|e| StylistError::stage(Stage::Generate, e))?;
        tracing::debug!(width = image.width(), bytes = png.len(), "generated QR code");

        Ok(QrCodeResult {
            data_url: raster::png_data_url(&png),
            png,
            width: image.width(),
            height: image.height(),
            options,
        })
    }

    /// Shorthand for the data URI of [`generate`](Self::generate).
    pub fn data_url(&self, text: &str, config: &RenderConfig) -> Result<String> {
        Ok(self.generate(text, config)?.data_url)
    }

    /// Renders `text` onto `surface`, resizing it to the rendered size.
    #[tracing::instrument(skip(self, surface, config), fields(len = text.len()))]
    pub fn render_to_pixmap(
        &self,
        text: &str,
        surface: &mut Pixmap,
        config: &RenderConfig,
    ) -> Result<()> {
        validate(text, config)?;
        let options = config.optimized_for_scanning();
        let image = self.render_image(text, &options, Stage::Render)?;
        let (width, height) = image.dimensions();
        *surface = raster::rgba_image_to_pixmap(&image).ok_or_else(|| {
            StylistError::stage(Stage::Render, StageError::Surface { width, height })
        })?;
        Ok(())
    }

    /// Renders `text` to PNG and returns its data URI, writing the PNG to
    /// `export.file_name` when set.
    #[tracing::instrument(skip(self, config, export), fields(len = text.len()))]
    pub fn export_png(
        &self,
        text: &str,
        config: &RenderConfig,
        export: &ExportOptions,
    ) -> Result<String> {
        let result = self.generate(text, config)?;
        if let Some(path) = &export.file_name {
            std::fs::write(path, &result.png)
                .map_err(|e| StylistError::stage(Stage::Export, e))?;
            tracing::info!(path = %path.display(), "exported PNG");
        }
        Ok(result.data_url)
    }

    /// Serializes `text` as unstyled SVG markup, writing it to
    /// `export.file_name` when set.
    ///
    /// Only size, margin, colors and error correction apply to vector
    /// output.
    #[tracing::instrument(skip(self, config, export), fields(len = text.len()))]
    pub fn export_svg(
        &self,
        text: &str,
        config: &RenderConfig,
        export: &ExportOptions,
    ) -> Result<String> {
        validate(text, config)?;
        let svg = self
            .encoder
            .encode_to_vector(text, &encode_options(config))
            .map_err(|e| StylistError::stage(Stage::Export, e))?;
        if let Some(path) = &export.file_name {
            std::fs::write(path, &svg).map_err(|e| StylistError::stage(Stage::Export, e))?;
            tracing::info!(path = %path.display(), "exported SVG");
        }
        Ok(svg)
    }

    fn render_image(&self, text: &str, options: &RenderConfig, stage: Stage) -> Result<RgbaImage> {
        let base = self
            .encoder
            .encode_to_raster(text, &encode_options(options))
            .map_err(|e| StylistError::stage(stage, e))?;

        let mut compositor = StyleCompositor::new(self.logo_loader.as_ref(), self.clock.as_ref());
        let (surface, summary) = compositor
            .compose(&base, options, &mut rand::thread_rng())
            .map_err(|e| StylistError::stage(stage, e))?;
        tracing::debug!(?summary, "styled QR code");

        Ok(raster::pixmap_to_rgba_image(&surface))
    }
}

fn validate(text: &str, config: &RenderConfig) -> Result<()> {
    if text.trim().is_empty() {
        return Err(StylistError::validation("text cannot be empty"));
    }
    config.validate()
}

fn encode_options(config: &RenderConfig) -> EncodeOptions {
    EncodeOptions {
        width: config.size,
        error_correction_level: config.error_correction_level,
        dark: Color::parse_or(&config.color.dark, Color::BLACK),
        light: Color::parse_or(&config.color.light, Color::WHITE),
        margin: config.margin,
        scale: config.scale,
    }
}

fn encode_png(image: &RgbaImage) -> std::result::Result<Vec<u8>, StageError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| StageError::Png(e.to_string()))?;
    Ok(out.into_inner())
}
