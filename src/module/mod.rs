//! Module-level drawing: classification, geometry, batching and animation.
//!
//! A styled render re-samples the base raster on a fixed pitch, collects the
//! dark cells as [`ModulePosition`]s, then hands them to either the batch
//! compositor or the animation sequencer. Positions live for one render
//! pass only.
//!
//! ```text
//! base raster ──► ModuleClassifier ──► Vec<ModulePosition>
//!                                          │
//!                      ┌───────────────────┴───────────────────┐
//!                      ▼                                       ▼
//!               batch::draw_modules                 animation::draw_animated
//!                      │                                       │
//!                      └──────────► shape::paint ◄─────────────┘
//! ```

pub mod animation;
pub mod batch;
pub mod classifier;
pub mod shape;

pub use animation::{AnimationFrame, ModuleVisual};
pub use classifier::ModuleClassifier;
pub use shape::ModuleStyle;

use image::RgbaImage;

/// Number of modules assumed across the raster when deriving the pitch.
///
/// This ignores the real symbol version, so cells drift off the true module
/// grid on large symbols.
pub const GRID_DENSITY: u32 = 40;

/// Top-left pixel of a dark module and its scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulePosition {
    pub x: u32,
    pub y: u32,
    pub index: usize,
}

impl ModulePosition {
    /// Creates a position at pixel `(x, y)`, `index` in scan order.
    pub fn new(x: u32, y: u32, index: usize) -> Self {
        Self { x, y, index }
    }
}

/// Pixel geometry shared by every module of a render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleLayout {
    /// Distance between neighbouring cells.
    pub pitch: u32,
    /// Edge length of the drawn shape.
    pub size: f32,
    /// Offset from the cell corner to the shape's bounding box.
    pub spacing_offset: f32,
}

impl ModuleLayout {
    /// Derives the layout for a `width` x `height` raster.
    ///
    /// `module_size` is a percentage of the pitch; `module_spacing` adds
    /// half its value to the offset.
    pub fn for_raster(width: u32, height: u32, module_size: u32, module_spacing: u32) -> Self {
        let pitch = width
            .div_ceil(GRID_DENSITY)
            .max(1)
            .min(height.div_ceil(GRID_DENSITY).max(1));
        let size = pitch as f32 * (module_size as f32 / 100.0);
        let spacing_offset = (pitch as f32 - size) / 2.0 + module_spacing as f32 / 2.0;
        Self {
            pitch,
            size,
            spacing_offset,
        }
    }

    /// Top-left corner of the shape drawn for `module`.
    pub fn origin(&self, module: &ModulePosition) -> (f32, f32) {
        (
            module.x as f32 + self.spacing_offset,
            module.y as f32 + self.spacing_offset,
        )
    }
}

/// Scans `raster` row-major on `pitch` and returns every dark cell.
///
/// Indices are assigned in scan order over dark cells only.
pub fn collect_dark_modules(
    raster: &RgbaImage,
    pitch: u32,
    classifier: &mut ModuleClassifier,
) -> Vec<ModulePosition> {
    let step = pitch.max(1) as usize;
    let mut modules = Vec::new();
    for y in (0..raster.height()).step_by(step) {
        for x in (0..raster.width()).step_by(step) {
            if classifier.is_dark(raster, x, y, pitch) {
                modules.push(ModulePosition::new(x, y, modules.len()));
            }
        }
    }
    modules
}
