use std::collections::HashMap;

use image::RgbaImage;

use crate::color;

/// Brightness below which a sampled pixel counts as a dark module.
pub const DARK_THRESHOLD: f64 = 128.0;

/// Memoized dark/light decision per `(x, y, module_size)` cell.
///
/// The cache is only valid for the raster it was filled from; callers clear
/// it before every render.
#[derive(Debug, Default)]
pub struct ModuleClassifier {
    cache: HashMap<(u32, u32, u32), bool>,
}

impl ModuleClassifier {
    /// Creates a classifier with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached verdict.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of cached verdicts.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Samples the center pixel of the cell at `(x, y)`.
    ///
    /// The sample point is clamped to the raster, so cells hanging off the
    /// right or bottom edge read the last row or column.
    pub fn is_dark(&mut self, raster: &RgbaImage, x: u32, y: u32, module_size: u32) -> bool {
        *self
            .cache
            .entry((x, y, module_size))
            .or_insert_with(|| sample(raster, x, y, module_size))
    }
}

fn sample(raster: &RgbaImage, x: u32, y: u32, module_size: u32) -> bool {
    if raster.width() == 0 || raster.height() == 0 {
        return false;
    }
    let half = module_size / 2;
    let cx = x.saturating_add(half).min(raster.width() - 1);
    let cy = y.saturating_add(half).min(raster.height() - 1);
    let [r, g, b, _] = raster.get_pixel(cx, cy).0;
    color::brightness(r, g, b) < DARK_THRESHOLD
}
