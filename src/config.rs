//! Serializable render configuration.
//!
//! A [`RenderConfig`] captures every styling option of a render in a format
//! that can be stored as a JSON profile and echoed back with the result.
//! Every field has a default, so partial profiles deserialize cleanly.
//!
//! # Example
//!
//! ```
//! use qr_stylist::{ErrorCorrectionLevel, RenderConfig, Shape};
//!
//! let config = RenderConfig::new()
//!     .with_size(300)
//!     .with_error_correction_level(ErrorCorrectionLevel::High)
//!     .with_shape(Shape::Circle);
//!
//! let json = config.to_json().unwrap();
//! let restored = RenderConfig::from_json(&json).unwrap();
//! assert_eq!(restored.size, 300);
//! ```

use serde::{Deserialize, Serialize};

use crate::color;
use crate::encoder::MAX_RASTER_EDGE;
use crate::error::{Result, StylistError};

// ============================================================================
// Enumerations
// ============================================================================

/// QR error-correction level, serialized as its single-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ErrorCorrectionLevel {
    #[serde(rename = "L", alias = "LOW")]
    #[cfg_attr(feature = "clap", value(alias = "l"))]
    Low,
    #[default]
    #[serde(rename = "M", alias = "MEDIUM")]
    #[cfg_attr(feature = "clap", value(alias = "m"))]
    Medium,
    #[serde(rename = "Q", alias = "QUARTILE")]
    #[cfg_attr(feature = "clap", value(alias = "q"))]
    Quartile,
    #[serde(rename = "H", alias = "HIGH")]
    #[cfg_attr(feature = "clap", value(alias = "h"))]
    High,
}

/// Geometry drawn for each dark module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Square,
    Rounded,
    Circle,
    Star,
    Hexagon,
    Diamond,
    Triangle,
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

/// Per-module visual transform driven by animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    #[default]
    Fade,
    Scale,
    Rotate,
    Bounce,
    Pulse,
}

/// Order in which modules are revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AnimationDirection {
    #[default]
    Forward,
    Reverse,
    Alternate,
}

// ============================================================================
// Nested settings
// ============================================================================

/// Ordered gradient colors and their geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct GradientConfig {
    #[serde(rename = "type", default)]
    pub kind: GradientKind,

    /// `#rrggbb` stops, distributed evenly across the gradient.
    #[serde(default)]
    pub colors: Vec<String>,
}

/// Module and background colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ColorConfig {
    pub dark: String,
    pub light: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradient: Option<GradientConfig>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            dark: "#000000".to_string(),
            light: "#ffffff".to_string(),
            gradient: None,
        }
    }
}

/// Animated reveal settings. Times are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationConfig {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: AnimationType,
    pub duration: f64,
    pub delay: f64,
    pub stagger: f64,
    pub direction: AnimationDirection,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: AnimationType::Fade,
            duration: 1000.0,
            delay: 0.0,
            stagger: 50.0,
            direction: AnimationDirection::Forward,
        }
    }
}

impl AnimationConfig {
    /// An enabled animation of the given type with default timings.
    pub fn new(kind: AnimationType) -> Self {
        Self {
            enabled: true,
            kind,
            ..Self::default()
        }
    }

    /// Sets the reveal order.
    pub fn with_direction(mut self, direction: AnimationDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets duration, delay and stagger in milliseconds.
    pub fn with_timing(mut self, duration: f64, delay: f64, stagger: f64) -> Self {
        self.duration = duration;
        self.delay = delay;
        self.stagger = stagger;
        self
    }
}

/// Center logo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct LogoConfig {
    /// File path, `data:` URI, or inline SVG markup.
    pub src: String,

    /// Edge length in pixels. Defaults to 20% of the output width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
}

// ============================================================================
// RenderConfig
// ============================================================================

/// All options of a single render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Requested output width in pixels.
    pub size: u32,
    /// Quiet zone in modules.
    pub margin: u32,
    /// Pixels per module when `size` is too small to honor.
    pub scale: u32,
    pub error_correction_level: ErrorCorrectionLevel,
    pub color: ColorConfig,
    pub shape: Shape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
    /// Visual complexity tier, 1-10.
    pub complexity: u8,
    /// Module size as a percentage of the cell, 50-150.
    pub module_size: u32,
    /// Extra spacing between modules in pixels, 0-10.
    pub module_spacing: u32,
    /// Jitter amplitude in pixels, 0-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationConfig>,
    /// Auto-adjust colors for scan reliability.
    pub smart_gradient: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoConfig>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            size: 200,
            margin: 4,
            scale: 4,
            error_correction_level: ErrorCorrectionLevel::Medium,
            color: ColorConfig::default(),
            shape: Shape::Square,
            corner_radius: None,
            complexity: 5,
            module_size: 100,
            module_spacing: 0,
            randomness: None,
            animation: None,
            smart_gradient: true,
            logo: None,
        }
    }
}

impl RenderConfig {
    /// Creates a config with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output width in pixels.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Sets the quiet zone in modules.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Sets the error-correction level.
    pub fn with_error_correction_level(mut self, level: ErrorCorrectionLevel) -> Self {
        self.error_correction_level = level;
        self
    }

    /// Sets the dark and light module colors.
    pub fn with_colors(mut self, dark: impl Into<String>, light: impl Into<String>) -> Self {
        self.color.dark = dark.into();
        self.color.light = light.into();
        self
    }

    /// Sets the background gradient.
    pub fn with_gradient(mut self, kind: GradientKind, colors: &[&str]) -> Self {
        self.color.gradient = Some(GradientConfig {
            kind,
            colors: colors.iter().map(|c| (*c).to_string()).collect(),
        });
        self
    }

    /// Sets the module shape.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// Sets the rounded-shape corner radius in pixels.
    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = Some(radius);
        self
    }

    /// Sets the visual complexity level.
    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the drawn module size as a percentage of the grid step.
    pub fn with_module_size(mut self, percent: u32) -> Self {
        self.module_size = percent;
        self
    }

    /// Sets the module spacing in pixels.
    pub fn with_module_spacing(mut self, spacing: u32) -> Self {
        self.module_spacing = spacing;
        self
    }

    /// Sets the jitter strength.
    pub fn with_randomness(mut self, randomness: f32) -> Self {
        self.randomness = Some(randomness);
        self
    }

    /// Sets the animation.
    pub fn with_animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Enables or disables scan-safe color adjustment.
    pub fn with_smart_gradient(mut self, enabled: bool) -> Self {
        self.smart_gradient = enabled;
        self
    }

    /// Sets the center logo source and optional edge size.
    pub fn with_logo(mut self, src: impl Into<String>, size: Option<f32>) -> Self {
        self.logo = Some(LogoConfig {
            src: src.into(),
            size,
        });
        self
    }

    /// Checks every field against its documented range.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(StylistError::validation("size must be greater than 0"));
        }
        if self.size > MAX_RASTER_EDGE {
            return Err(StylistError::validation(format!(
                "size must be at most {MAX_RASTER_EDGE}"
            )));
        }
        if self.scale == 0 {
            return Err(StylistError::validation("scale must be greater than 0"));
        }
        if !(1..=10).contains(&self.complexity) {
            return Err(StylistError::validation("complexity must be within 1..=10"));
        }
        if !(50..=150).contains(&self.module_size) {
            return Err(StylistError::validation("moduleSize must be within 50..=150"));
        }
        if self.module_spacing > 10 {
            return Err(StylistError::validation("moduleSpacing must be within 0..=10"));
        }
        if self.randomness.is_some_and(|r| !(0.0..=100.0).contains(&r)) {
            return Err(StylistError::validation("randomness must be within 0..=100"));
        }
        if self.corner_radius.is_some_and(|r| !(r.is_finite() && r >= 0.0)) {
            return Err(StylistError::validation("cornerRadius must be non-negative"));
        }
        if let Some(animation) = &self.animation {
            if !(animation.duration.is_finite() && animation.duration > 0.0) {
                return Err(StylistError::validation("animation duration must be positive"));
            }
            if animation.delay < 0.0 || animation.stagger < 0.0 {
                return Err(StylistError::validation(
                    "animation delay and stagger must be non-negative",
                ));
            }
        }
        let logo_size = self.logo.as_ref().and_then(|logo| logo.size);
        if logo_size.is_some_and(|s| !(s.is_finite() && s > 0.0)) {
            return Err(StylistError::validation("logo size must be positive"));
        }
        Ok(())
    }

    /// Returns true when modules must be re-drawn individually instead of
    /// compositing the base raster as-is.
    pub fn needs_module_styling(&self) -> bool {
        self.shape != Shape::Square
            || self.corner_radius.is_some()
            || self.module_size != 100
            || self.module_spacing != 0
            || self.randomness.is_some_and(|r| r > 0.0)
            || self.animation_enabled()
    }

    /// Returns true when an enabled animation is configured.
    pub fn animation_enabled(&self) -> bool {
        self.animation.as_ref().is_some_and(|a| a.enabled)
    }

    /// Applies the scan-reliability color policy when `smart_gradient` is on.
    ///
    /// Dark modules are strengthened to at least 4.5:1 against white, light
    /// modules are pulled back toward white once they exceed 1.2:1. Gradient
    /// colors are left as configured.
    pub fn optimized_for_scanning(&self) -> Self {
        let mut optimized = self.clone();
        if self.smart_gradient {
            optimized.color.dark = color::strengthen_dark(&self.color.dark);
            optimized.color.light = color::soften_light(&self.color.light);
        }
        optimized
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a config from a JSON string. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
