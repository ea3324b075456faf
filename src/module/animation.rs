//! Staggered, clock-sampled module reveals.
//!
//! An animated render is a single still frame: progress is read from a
//! [`Clock`] once per call, and callers wanting motion re-render on a timer.
//!
//! Ordering follows the configured [`AnimationDirection`]. The alternate
//! direction snakes through the rows, reversing every odd row:
//!
//! ```text
//! row 0:  0 → 1 → 2
//! row 1:  5 ← 4 ← 3
//! row 2:  6 → 7 → 8
//! ```

use std::collections::BTreeMap;
use std::f32::consts::TAU;
use std::time::Instant;

use rand::Rng;
use resvg::tiny_skia::{Pixmap, Transform};

use super::shape::{self, ModuleStyle};
use super::{ModuleLayout, ModulePosition};
use crate::config::{AnimationConfig, AnimationDirection, AnimationType};

// ============================================================================
// Clock
// ============================================================================

/// Source of the animation timestamp, in milliseconds.
pub trait Clock: Send + Sync {
    /// Milliseconds on this clock's timeline.
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    /// Creates a clock that reads zero now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// A clock frozen at one timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now_ms(&self) -> f64 {
        self.0
    }
}

// ============================================================================
// Timing
// ============================================================================

/// Cubic ease-in-out over `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Eased progress of the module at `order` in the reveal sequence.
pub fn module_progress(now: f64, order: usize, animation: &AnimationConfig) -> f64 {
    let start = animation.delay + order as f64 * animation.stagger;
    let raw = if animation.duration > 0.0 {
        (now - start) / animation.duration
    } else {
        1.0
    };
    ease_in_out_cubic(raw.clamp(0.0, 1.0))
}

/// Sorts `modules` into reveal order.
///
/// Rows for the alternate direction are `floor(y / size)`, where `size` is
/// the drawn module size.
pub fn resolve_order(
    modules: &[ModulePosition],
    direction: AnimationDirection,
    size: f32,
) -> Vec<ModulePosition> {
    match direction {
        AnimationDirection::Forward => modules.to_vec(),
        AnimationDirection::Reverse => modules.iter().rev().copied().collect(),
        AnimationDirection::Alternate => {
            let size = if size > 0.0 { size } else { 1.0 };
            let mut rows: BTreeMap<u32, Vec<ModulePosition>> = BTreeMap::new();
            for module in modules {
                let row = (module.y as f32 / size).floor() as u32;
                rows.entry(row).or_default().push(*module);
            }
            rows.into_iter()
                .flat_map(|(row, mut cells)| {
                    if row % 2 == 1 {
                        cells.reverse();
                    }
                    cells
                })
                .collect()
        }
    }
}

// ============================================================================
// Visuals
// ============================================================================

/// The visual state of one module at a given progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModuleVisual {
    Opacity(f32),
    Scale(f32),
    /// Rotation in radians about the module center.
    Rotate(f32),
}

impl ModuleVisual {
    /// Creates the visual state for `kind` at eased `progress`.
    pub fn at(kind: AnimationType, progress: f64) -> Self {
        let p = progress as f32;
        match kind {
            AnimationType::Fade => Self::Opacity(p),
            AnimationType::Scale => Self::Scale(p),
            AnimationType::Rotate => Self::Rotate(p * TAU),
            AnimationType::Bounce => Self::Scale(if p < 0.5 { p * 2.0 } else { 2.0 - p * 2.0 }),
            AnimationType::Pulse => Self::Scale(0.5 + p * 0.5),
        }
    }

    /// Paint opacity; only fades are translucent.
    pub fn opacity(&self) -> f32 {
        match self {
            Self::Opacity(o) => *o,
            _ => 1.0,
        }
    }

    /// True when drawing would produce no pixels.
    pub fn is_invisible(&self) -> bool {
        match self {
            Self::Opacity(o) => *o <= 0.0,
            Self::Scale(s) => *s <= 0.0,
            Self::Rotate(_) => false,
        }
    }

    /// Maps module-local space onto the surface for a module whose box
    /// starts at `(x, y)`.
    pub fn transform(&self, x: f32, y: f32, size: f32) -> Transform {
        let half = size / 2.0;
        let about_center = Transform::from_translate(x + half, y + half);
        match self {
            Self::Opacity(_) => Transform::from_translate(x, y),
            Self::Scale(s) => about_center.pre_scale(*s, *s).pre_translate(-half, -half),
            Self::Rotate(r) => about_center
                .pre_rotate(r.to_degrees())
                .pre_translate(-half, -half),
        }
    }
}

/// One module's place and state in an animated frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    pub module: ModulePosition,
    /// Position in the reveal sequence.
    pub order: usize,
    /// Eased progress in `[0, 1]`.
    pub progress: f64,
    pub visual: ModuleVisual,
}

/// Resolves order, progress and visual state for every module at `now`.
pub fn plan_frame(
    modules: &[ModulePosition],
    size: f32,
    animation: &AnimationConfig,
    now: f64,
) -> Vec<AnimationFrame> {
    resolve_order(modules, animation.direction, size)
        .into_iter()
        .enumerate()
        .map(|(order, module)| {
            let progress = module_progress(now, order, animation);
            AnimationFrame {
                module,
                order,
                progress,
                visual: ModuleVisual::at(animation.kind, progress),
            }
        })
        .collect()
}

/// Paints the frame of `modules` sampled at `now`.
pub fn draw_animated(
    surface: &mut Pixmap,
    modules: &[ModulePosition],
    layout: &ModuleLayout,
    style: &ModuleStyle,
    animation: &AnimationConfig,
    now: f64,
    rng: &mut impl Rng,
) {
    let frames = plan_frame(modules, layout.size, animation, now);
    let settled = frames.iter().filter(|f| f.progress >= 1.0).count();
    tracing::debug!(
        modules = frames.len(),
        settled,
        kind = ?animation.kind,
        "drawing animated frame"
    );

    for frame in frames {
        if frame.visual.is_invisible() {
            continue;
        }
        let (x, y) = layout.origin(&frame.module);
        let base = frame.visual.transform(x, y, layout.size);
        shape::paint(
            surface,
            style,
            0.0,
            0.0,
            layout.size,
            base,
            frame.visual.opacity(),
            rng,
        );
    }
}
