//! qr-stylist: styled QR code rendering
//!
//! This crate turns text into QR code images with custom module shapes,
//! gradients, animated reveals, center logos and contrast-safe colors.
//!
//! # Example
//!
//! ```
//! use qr_stylist::{GradientKind, QrCodeGenerator, RenderConfig, Shape};
//!
//! let generator = QrCodeGenerator::new();
//!
//! let config = RenderConfig::new()
//!     .with_size(320)
//!     .with_shape(Shape::Circle)
//!     .with_gradient(GradientKind::Radial, &["#ffffff", "#e0f0ff"]);
//!
//! let result = generator.generate("https://example.com", &config).unwrap();
//! assert_eq!(result.width, 320);
//! ```
//!
//! # Serializable Profiles
//!
//! [`RenderConfig`] doubles as a JSON profile. Missing fields take their
//! defaults, so a profile only needs to name what it changes:
//!
//! ```
//! use qr_stylist::{QrCodeGenerator, RenderConfig};
//!
//! let config = RenderConfig::from_json(r#"{"shape":"hexagon","moduleSize":90}"#).unwrap();
//! let url = QrCodeGenerator::new().data_url("hello", &config).unwrap();
//! assert!(url.starts_with("data:image/png;base64,"));
//!
//! // The rendered profile echoes every resolved option.
//! let json = config.to_json().unwrap();
//! assert!(json.contains(r#""moduleSize":90"#));
//! ```
//!
//! Vector export bypasses styling: [`QrCodeGenerator::export_svg`] reflects
//! only size, margin, colors and error correction.

pub mod color;
pub mod compositor;
pub mod config;
pub mod effects;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod logo;
pub mod module;
pub mod raster;

pub use color::{Color, ContrastDirection, adjust_for_contrast, contrast_ratio};
pub use compositor::{RenderSummary, StyleCompositor};
pub use config::{
    AnimationConfig, AnimationDirection, AnimationType, ColorConfig, ErrorCorrectionLevel,
    GradientConfig, GradientKind, LogoConfig, RenderConfig, Shape,
};
pub use effects::ComplexityTier;
pub use encoder::{EncodeError, EncodeOptions, ModuleGrid, QrEncoder, QrcodeEncoder};
pub use error::{Result, Stage, StageError, StylistError};
pub use generator::{ExportOptions, QrCodeGenerator, QrCodeResult};
pub use logo::{DefaultLogoLoader, LogoError, LogoLoader, LogoSource};
pub use module::animation::{Clock, FixedClock, SystemClock};
pub use module::{ModuleClassifier, ModuleLayout, ModulePosition, ModuleStyle};
