//! Hex colors and WCAG contrast helpers.
//!
//! Colors enter the crate as `#rrggbb` strings from a [`RenderConfig`]
//! and are parsed into [`Color`] only where they are drawn or measured.
//! Unparsable strings never abort a render: each consumer falls back to a
//! safe default (black for dark modules, white for light ones).
//!
//! The contrast adjuster is a bounded best-effort search. It scales RGB
//! channels by a fixed factor until a target ratio is reached or the
//! iteration budget runs out, and returns the closest color it found.
//!
//! [`RenderConfig`]: crate::RenderConfig

use palette::Srgb;
use resvg::tiny_skia;

/// Minimum contrast a dark module color must have against white.
pub const DARK_MIN_CONTRAST: f64 = 4.5;

/// Contrast above which a light module color is pulled back toward white.
pub const LIGHT_MAX_CONTRAST: f64 = 1.2;

/// Contrast a light module color is adjusted toward.
pub const LIGHT_TARGET_CONTRAST: f64 = 1.1;

/// Iteration budget of [`adjust_for_contrast`].
pub const MAX_ADJUST_ITERATIONS: usize = 20;

const DARKEN_FACTOR: f64 = 0.9;
const LIGHTEN_FACTOR: f64 = 1.1;

// ============================================================================
// Color
// ============================================================================

/// An opaque sRGB color parsed from a 6-digit hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(Srgb<u8>);

impl Color {
    /// `#000000`.
    pub const BLACK: Self = Self(Srgb::new(0, 0, 0));
    /// `#ffffff`.
    pub const WHITE: Self = Self(Srgb::new(255, 255, 255));

    /// Creates a color from 8-bit channels.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Srgb::new(r, g, b))
    }

    /// Parses `#rrggbb` or `rrggbb` (case-insensitive).
    ///
    /// Returns `None` for anything else, including the 3-digit short form.
    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::from_rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parses `hex`, substituting `fallback` when it is not a valid color.
    pub fn parse_or(hex: &str, fallback: Self) -> Self {
        Self::parse(hex).unwrap_or(fallback)
    }

    /// Returns the `(r, g, b)` channels.
    pub fn rgb(&self) -> (u8, u8, u8) {
        (self.0.red, self.0.green, self.0.blue)
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// WCAG 2.0 relative luminance in `[0, 1]`.
    pub fn luminance(&self) -> f64 {
        let rgb: Srgb<f64> = self.0.into_format();
        0.2126 * linearize(rgb.red) + 0.7152 * linearize(rgb.green) + 0.0722 * linearize(rgb.blue)
    }

    /// Perceptual brightness on the 0-255 scale (ITU-R BT.601 weights).
    pub fn brightness(&self) -> f64 {
        let (r, g, b) = self.rgb();
        brightness(r, g, b)
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        let (r, g, b) = self.rgb();
        tiny_skia::Color::from_rgba8(r, g, b, 255)
    }

    pub(crate) fn to_rgba(self) -> image::Rgba<u8> {
        let (r, g, b) = self.rgb();
        image::Rgba([r, g, b, 255])
    }
}

/// Decodes one gamma-encoded sRGB channel.
fn linearize(c: f64) -> f64 {
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// `0.299R + 0.587G + 0.114B`, used for dark/light module classification.
pub fn brightness(r: u8, g: u8, b: u8) -> f64 {
    0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)
}

// ============================================================================
// Contrast
// ============================================================================

/// WCAG contrast ratio of two luminances. Always `>= 1.0`.
pub fn contrast_ratio(l1: f64, l2: f64) -> f64 {
    let lighter = l1.max(l2);
    let darker = l1.min(l2);
    (lighter + 0.05) / (darker + 0.05)
}

/// Which way [`adjust_for_contrast`] moves a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastDirection {
    /// Scale channels toward black until the ratio reaches the target.
    Darken,
    /// Divide channels by a fixed factor until the ratio reaches the target.
    Lighten,
}

impl ContrastDirection {
    fn fallback(self) -> Color {
        match self {
            Self::Darken => Color::BLACK,
            Self::Lighten => Color::WHITE,
        }
    }
}

/// Nudges `color` toward `target_ratio` against a background luminance.
///
/// `None` (an unparsable input) yields pure black when darkening and pure
/// white when lightening.
pub fn adjust_for_contrast(
    color: Option<Color>,
    background_luminance: f64,
    target_ratio: f64,
    direction: ContrastDirection,
) -> Color {
    adjust_for_contrast_bounded(
        color,
        background_luminance,
        target_ratio,
        direction,
        MAX_ADJUST_ITERATIONS,
    )
}

/// [`adjust_for_contrast`] with an explicit iteration budget.
pub fn adjust_for_contrast_bounded(
    color: Option<Color>,
    background_luminance: f64,
    target_ratio: f64,
    direction: ContrastDirection,
    max_iterations: usize,
) -> Color {
    let Some(color) = color else {
        return direction.fallback();
    };

    let (r, g, b) = color.rgb();
    let mut channels = [f64::from(r), f64::from(g), f64::from(b)];
    let round = |c: &[f64; 3]| {
        let q = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Color::from_rgb(q(c[0]), q(c[1]), q(c[2]))
    };

    for _ in 0..max_iterations {
        let ratio = contrast_ratio(round(&channels).luminance(), background_luminance);
        if ratio >= target_ratio {
            break;
        }
        for c in &mut channels {
            *c = match direction {
                ContrastDirection::Darken => (*c * DARKEN_FACTOR).max(0.0),
                ContrastDirection::Lighten => *c / LIGHTEN_FACTOR,
            };
        }
    }

    round(&channels)
}

// ============================================================================
// Scan-reliability policy
// ============================================================================

/// Strengthens a dark module color whose contrast against white is below
/// [`DARK_MIN_CONTRAST`]. Unparsable input becomes black.
pub fn strengthen_dark(hex: &str) -> String {
    let white = Color::WHITE.luminance();
    match Color::parse(hex) {
        Some(color) if contrast_ratio(color.luminance(), white) >= DARK_MIN_CONTRAST => {
            hex.to_string()
        }
        parsed => adjust_for_contrast(parsed, white, DARK_MIN_CONTRAST, ContrastDirection::Darken)
            .to_hex(),
    }
}

/// Pulls a light module color toward white when its contrast against white
/// exceeds [`LIGHT_MAX_CONTRAST`]. Unparsable input becomes white.
pub fn soften_light(hex: &str) -> String {
    let white = Color::WHITE.luminance();
    match Color::parse(hex) {
        Some(color) if contrast_ratio(color.luminance(), white) <= LIGHT_MAX_CONTRAST => {
            hex.to_string()
        }
        parsed => adjust_for_contrast(
            parsed,
            white,
            LIGHT_TARGET_CONTRAST,
            ContrastDirection::Lighten,
        )
        .to_hex(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_six_digit_hex_only() {
        assert_eq!(Color::parse("#ff8000"), Some(Color::from_rgb(255, 128, 0)));
        assert_eq!(Color::parse("FF8000"), Some(Color::from_rgb(255, 128, 0)));
        assert_eq!(Color::parse("#f80"), None);
        assert_eq!(Color::parse("#gg0000"), None);
        assert_eq!(Color::parse(""), None);
        assert_eq!(Color::parse_or("nope", Color::WHITE), Color::WHITE);
    }

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(Color::from_rgb(10, 0, 255).to_hex(), "#0a00ff");
    }

    #[test]
    fn luminance_endpoints() {
        assert_eq!(Color::BLACK.luminance(), 0.0);
        assert!((Color::WHITE.luminance() - 1.0).abs() < 1e-9);
        assert!((contrast_ratio(0.0, 1.0) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn contrast_with_self_is_one() {
        for hex in ["#000000", "#ffffff", "#336699", "#ff0000", "#808080"] {
            let l = Color::parse(hex).unwrap().luminance();
            assert_eq!(contrast_ratio(l, l), 1.0);
        }
    }

    #[test]
    fn contrast_is_symmetric_and_at_least_one() {
        let a = Color::parse("#123456").unwrap().luminance();
        let b = Color::parse("#fedcba").unwrap().luminance();
        assert_eq!(contrast_ratio(a, b), contrast_ratio(b, a));
        assert!(contrast_ratio(a, b) >= 1.0);
    }

    #[test]
    fn darkening_reaches_target_against_white() {
        let white = Color::WHITE.luminance();
        let start = Color::parse("#aaccee");
        let adjusted = adjust_for_contrast(start, white, 4.5, ContrastDirection::Darken);
        assert!(contrast_ratio(adjusted.luminance(), white) >= 4.5);
    }

    #[test]
    fn darkening_is_monotonic_in_iterations() {
        let white = Color::WHITE.luminance();
        let start = Color::parse("#ffee99");
        let mut previous = 0.0;
        for budget in 0..=MAX_ADJUST_ITERATIONS {
            let c = adjust_for_contrast_bounded(start, white, 21.0, ContrastDirection::Darken, budget);
            let ratio = contrast_ratio(c.luminance(), white);
            assert!(ratio >= previous, "budget {budget}: {ratio} < {previous}");
            previous = ratio;
        }
    }

    #[test]
    fn lightening_is_monotonic_in_iterations() {
        let white = Color::WHITE.luminance();
        let start = Color::parse("#405060");
        let mut previous = 0.0;
        for budget in 0..=MAX_ADJUST_ITERATIONS {
            let c = adjust_for_contrast_bounded(start, white, 21.0, ContrastDirection::Lighten, budget);
            let ratio = contrast_ratio(c.luminance(), white);
            assert!(ratio >= previous, "budget {budget}: {ratio} < {previous}");
            previous = ratio;
        }
    }

    #[test]
    fn unparsable_input_falls_back() {
        assert_eq!(
            adjust_for_contrast(None, 1.0, 4.5, ContrastDirection::Darken),
            Color::BLACK
        );
        assert_eq!(
            adjust_for_contrast(None, 1.0, 1.1, ContrastDirection::Lighten),
            Color::WHITE
        );
        assert_eq!(strengthen_dark("blue"), "#000000");
        assert_eq!(soften_light("cream"), "#ffffff");
    }

    #[test]
    fn legible_dark_is_untouched() {
        assert_eq!(strengthen_dark("#000000"), "#000000");
        assert_eq!(strengthen_dark("#1A1A1A"), "#1A1A1A");
    }

    #[test]
    fn weak_dark_is_strengthened() {
        let white = Color::WHITE.luminance();
        let out = Color::parse(&strengthen_dark("#99ccff")).unwrap();
        assert!(contrast_ratio(out.luminance(), white) >= DARK_MIN_CONTRAST);
    }

    #[test]
    fn lightening_stops_once_target_is_met() {
        let white = Color::WHITE.luminance();
        let start = Color::parse("#405060");
        let c = adjust_for_contrast_bounded(start, white, 1.1, ContrastDirection::Lighten, 1);
        assert_eq!(c, Color::from_rgb(0x40, 0x50, 0x60));
    }

    #[test]
    fn lightening_reaches_target_from_pale_color() {
        let white = Color::WHITE.luminance();
        let start = Color::parse("#fefefe");
        let c = adjust_for_contrast(start, white, 1.1, ContrastDirection::Lighten);
        assert!(contrast_ratio(c.luminance(), white) >= 1.1);
        assert!(c.brightness() < 254.0);
    }

    #[test]
    fn heavy_light_keeps_its_color() {
        let white = Color::WHITE.luminance();
        let before = Color::parse("#cccccc").unwrap();
        assert!(contrast_ratio(before.luminance(), white) > LIGHT_MAX_CONTRAST);
        // Already past the 1.1 target, so the search returns it unchanged.
        assert_eq!(soften_light("#cccccc"), "#cccccc");
    }

    #[test]
    fn pale_light_is_untouched() {
        assert_eq!(soften_light("#ffffff"), "#ffffff");
        assert_eq!(soften_light("#fafafa"), "#fafafa");
    }
}
