//! Geometry and fill of a single styled module.
//!
//! Every shape is built in module-local coordinates (`0..size` on both
//! axes) and positioned purely through the paint transform, so batching,
//! jitter and animation all share the same paths.

use std::f32::consts::{FRAC_PI_2, PI};

use rand::Rng;
use resvg::tiny_skia::{
    FillRule, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap,
    Point, Rect, Shader, SpreadMode, Transform,
};

use crate::color::Color;
use crate::config::{RenderConfig, Shape};

/// Share of the module size used when no corner radius is configured.
pub const DEFAULT_CORNER_RATIO: f32 = 0.2;

const STAR_POINTS: usize = 5;
const STAR_OUTER_RATIO: f32 = 0.4;
const STAR_INNER_RATIO: f32 = 0.2;
const HEXAGON_RATIO: f32 = 0.4;

/// Rotation applied per pixel of randomness, in radians.
const JITTER_ROTATION_RATIO: f32 = 0.1;

/// Control-point distance for a quarter circle drawn as one cubic.
const KAPPA: f32 = 0.552_284_8;

/// Everything that decides how a dark module is filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStyle {
    pub shape: Shape,
    pub color: Color,
    pub corner_radius: Option<f32>,
    /// Per-module linear gradient stops. Empty means flat `color`.
    pub gradient: Vec<Color>,
    /// Jitter amplitude in pixels. Zero disables jitter.
    pub randomness: f32,
}

impl ModuleStyle {
    /// Creates a flat style with no radius, gradient or jitter.
    pub fn new(shape: Shape, color: Color) -> Self {
        Self {
            shape,
            color,
            corner_radius: None,
            gradient: Vec::new(),
            randomness: 0.0,
        }
    }

    /// Builds the style of a render. Unparsable colors fall back to black.
    pub fn from_config(config: &RenderConfig) -> Self {
        let gradient = config
            .color
            .gradient
            .as_ref()
            .map(|g| {
                g.colors
                    .iter()
                    .map(|c| Color::parse_or(c, Color::BLACK))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            shape: config.shape,
            color: Color::parse_or(&config.color.dark, Color::BLACK),
            corner_radius: config.corner_radius,
            gradient,
            randomness: config.randomness.unwrap_or(0.0).max(0.0),
        }
    }

    /// Returns true when at least one gradient color is set.
    pub fn has_gradient(&self) -> bool {
        !self.gradient.is_empty()
    }

    /// Returns true when randomness is above 0.
    pub fn has_jitter(&self) -> bool {
        self.randomness > 0.0
    }

    /// Corner radius of the rounded shape at `size`.
    ///
    /// A zero or missing radius resolves to 20% of the module.
    pub fn rounded_radius(&self, size: f32) -> f32 {
        self.corner_radius
            .filter(|r| *r > 0.0)
            .unwrap_or(size * DEFAULT_CORNER_RATIO)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Builds the outline of `style.shape` in module-local coordinates.
///
/// Returns `None` for degenerate sizes.
pub fn local_path(style: &ModuleStyle, size: f32) -> Option<Path> {
    if !(size.is_finite() && size > 0.0) {
        return None;
    }
    let half = size / 2.0;
    let mut pb = PathBuilder::new();
    match style.shape {
        Shape::Square => pb.push_rect(Rect::from_xywh(0.0, 0.0, size, size)?),
        Shape::Circle => pb.push_circle(half, half, half),
        Shape::Rounded => push_rounded_rect(&mut pb, 0.0, 0.0, size, style.rounded_radius(size)),
        Shape::Star => {
            let points = (0..STAR_POINTS * 2).map(|i| {
                let radius = if i % 2 == 0 {
                    STAR_OUTER_RATIO
                } else {
                    STAR_INNER_RATIO
                };
                polar(half, i as f32 * PI / STAR_POINTS as f32, size * radius)
            });
            push_polygon(&mut pb, points);
        }
        Shape::Hexagon => {
            let points = (0..6).map(|i| polar(half, i as f32 * PI / 3.0, size * HEXAGON_RATIO));
            push_polygon(&mut pb, points);
        }
        Shape::Diamond => push_polygon(
            &mut pb,
            [(half, 0.0), (size, half), (half, size), (0.0, half)],
        ),
        Shape::Triangle => push_polygon(&mut pb, [(half, 0.0), (size, size), (0.0, size)]),
    }
    pb.finish()
}

/// Point at `angle` from straight up around the module center.
fn polar(center: f32, angle: f32, radius: f32) -> (f32, f32) {
    let a = angle - FRAC_PI_2;
    (center + a.cos() * radius, center + a.sin() * radius)
}

fn push_polygon(pb: &mut PathBuilder, points: impl IntoIterator<Item = (f32, f32)>) {
    let mut points = points.into_iter();
    let Some((x, y)) = points.next() else {
        return;
    };
    pb.move_to(x, y);
    for (x, y) in points {
        pb.line_to(x, y);
    }
    pb.close();
}

/// Appends a square with rounded corners. The radius is clamped to half the
/// edge.
pub(crate) fn push_rounded_rect(pb: &mut PathBuilder, x: f32, y: f32, size: f32, radius: f32) {
    let r = radius.clamp(0.0, size / 2.0);
    if r == 0.0 {
        if let Some(rect) = Rect::from_xywh(x, y, size, size) {
            pb.push_rect(rect);
        }
        return;
    }
    let (right, bottom) = (x + size, y + size);
    let k = r * KAPPA;

    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
}

// ============================================================================
// Fill
// ============================================================================

/// Builds the paint for one module. Gradients span the local bounding box
/// diagonally; a gradient that fails to build falls back to the flat color.
pub fn module_paint(style: &ModuleStyle, size: f32, opacity: f32) -> Paint<'static> {
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };

    let shader = gradient_shader(&style.gradient, size);
    match shader {
        Some(mut shader) => {
            shader.apply_opacity(opacity);
            paint.shader = shader;
        }
        None => {
            let mut color = style.color.to_skia();
            color.apply_opacity(opacity);
            paint.set_color(color);
        }
    }
    paint
}

fn gradient_shader(colors: &[Color], size: f32) -> Option<Shader<'static>> {
    if colors.is_empty() {
        return None;
    }
    LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(size, size),
        even_stops(colors),
        SpreadMode::Pad,
        Transform::identity(),
    )
}

/// Distributes `colors` evenly over `[0, 1]`. A single color sits at 0.
pub(crate) fn even_stops(colors: &[Color]) -> Vec<GradientStop> {
    let last = colors.len().saturating_sub(1).max(1) as f32;
    colors
        .iter()
        .enumerate()
        .map(|(i, c)| GradientStop::new(i as f32 / last, c.to_skia()))
        .collect()
}

/// Random offset and rotation applied to a single module.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jitter {
    /// Offset along both axes, in pixels.
    pub offset: f32,
    /// Rotation in radians.
    pub rotation: f32,
}

impl Jitter {
    /// Draws an offset and a rotation, each uniform within
    /// `±randomness / 2` (rotation scaled by 0.1 rad per pixel).
    pub fn sample(randomness: f32, rng: &mut impl Rng) -> Self {
        if randomness <= 0.0 {
            return Self::default();
        }
        Self {
            offset: (rng.r#gen::<f32>() - 0.5) * randomness,
            rotation: (rng.r#gen::<f32>() - 0.5) * randomness * JITTER_ROTATION_RATIO,
        }
    }

    /// Placement of a module at `(x, y)` on top of `base`.
    pub fn placement(&self, base: Transform, x: f32, y: f32, size: f32) -> Transform {
        if *self == Self::default() {
            return base.pre_translate(x, y);
        }
        let half = size / 2.0;
        base.pre_translate(x + half + self.offset, y + half + self.offset)
            .pre_rotate(self.rotation.to_degrees())
            .pre_translate(-half, -half)
    }
}

/// Paints one module whose bounding box starts at `(x, y)` in the space of
/// `base`.
///
/// Transform and paint are local to the call.
pub fn paint(
    surface: &mut Pixmap,
    style: &ModuleStyle,
    x: f32,
    y: f32,
    size: f32,
    base: Transform,
    opacity: f32,
    rng: &mut impl Rng,
) {
    if opacity <= 0.0 {
        return;
    }
    let Some(path) = local_path(style, size) else {
        return;
    };
    let jitter = Jitter::sample(style.randomness, rng);
    let transform = jitter.placement(base, x, y, size);
    let paint = module_paint(style, size, opacity.min(1.0));
    surface.fill_path(&path, &paint, FillRule::Winding, transform, None);
}

pub(crate) fn flat_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint {
        anti_alias: true,
        ..Paint::default()
    };
    paint.set_color(color.to_skia());
    paint
}
