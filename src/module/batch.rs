//! Static module drawing with a single-fill fast path.

use rand::Rng;
use resvg::tiny_skia::{FillRule, PathBuilder, Pixmap, Rect, Transform};

use super::shape::{self, ModuleStyle};
use super::{ModuleLayout, ModulePosition};
use crate::config::Shape;

/// Returns true when every module of `style` can share one compound path.
///
/// Only flat, unjittered squares and circles qualify. Gradients are
/// module-local and jitter is per module, so both force individual paints.
pub fn is_batchable(style: &ModuleStyle) -> bool {
    matches!(style.shape, Shape::Square | Shape::Circle)
        && !style.has_gradient()
        && !style.has_jitter()
}

/// Draws every module in `modules` at full opacity.
pub fn draw_modules(
    surface: &mut Pixmap,
    modules: &[ModulePosition],
    layout: &ModuleLayout,
    style: &ModuleStyle,
    rng: &mut impl Rng,
) {
    if modules.is_empty() {
        return;
    }
    if is_batchable(style) {
        fill_batched(surface, modules, layout, style);
        return;
    }
    for module in modules {
        let (x, y) = layout.origin(module);
        shape::paint(surface, style, x, y, layout.size, Transform::identity(), 1.0, rng);
    }
}

fn fill_batched(
    surface: &mut Pixmap,
    modules: &[ModulePosition],
    layout: &ModuleLayout,
    style: &ModuleStyle,
) {
    let size = layout.size;
    let half = size / 2.0;
    let mut pb = PathBuilder::new();
    for module in modules {
        let (x, y) = layout.origin(module);
        match style.shape {
            Shape::Circle => pb.push_circle(x + half, y + half, half),
            _ => {
                if let Some(rect) = Rect::from_xywh(x, y, size, size) {
                    pb.push_rect(rect);
                }
            }
        }
    }
    let Some(path) = pb.finish() else {
        return;
    };
    tracing::trace!(modules = modules.len(), "batched module fill");
    surface.fill_path(
        &path,
        &shape::flat_paint(style.color),
        FillRule::Winding,
        Transform::identity(),
        None,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn grid_modules() -> Vec<ModulePosition> {
        let mut modules = Vec::new();
        for y in 0..6 {
            for x in 0..6 {
                if (x * 7 + y * 3) % 4 != 0 {
                    modules.push(ModulePosition::new(x * 10, y * 10, modules.len()));
                }
            }
        }
        modules
    }

    fn unbatched(modules: &[ModulePosition], layout: &ModuleLayout, style: &ModuleStyle) -> Pixmap {
        let mut pixmap = Pixmap::new(60, 60).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        for module in modules {
            let (x, y) = layout.origin(module);
            shape::paint(&mut pixmap, style, x, y, layout.size, Transform::identity(), 1.0, &mut rng);
        }
        pixmap
    }

    fn assert_close(a: &Pixmap, b: &Pixmap) {
        for (pa, pb) in a.pixels().iter().zip(b.pixels()) {
            assert!(pa.alpha().abs_diff(pb.alpha()) <= 2);
            assert!(pa.red().abs_diff(pb.red()) <= 2);
            assert!(pa.blue().abs_diff(pb.blue()) <= 2);
        }
    }

    #[test]
    fn batching_policy() {
        let mut style = ModuleStyle::new(Shape::Square, Color::BLACK);
        assert!(is_batchable(&style));
        style.shape = Shape::Circle;
        assert!(is_batchable(&style));
        style.shape = Shape::Star;
        assert!(!is_batchable(&style));

        let mut gradient = ModuleStyle::new(Shape::Square, Color::BLACK);
        gradient.gradient = vec![Color::WHITE, Color::BLACK];
        assert!(!is_batchable(&gradient));

        let mut jittered = ModuleStyle::new(Shape::Circle, Color::BLACK);
        jittered.randomness = 4.0;
        assert!(!is_batchable(&jittered));
    }

    #[test]
    fn batched_squares_match_individual_paints() {
        let modules = grid_modules();
        let layout = ModuleLayout {
            pitch: 10,
            size: 8.0,
            spacing_offset: 1.0,
        };
        let style = ModuleStyle::new(Shape::Square, Color::from_rgb(20, 40, 160));

        let mut batched = Pixmap::new(60, 60).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        draw_modules(&mut batched, &modules, &layout, &style, &mut rng);

        assert_close(&batched, &unbatched(&modules, &layout, &style));
    }

    #[test]
    fn batched_circles_match_individual_paints() {
        let modules = grid_modules();
        let layout = ModuleLayout {
            pitch: 10,
            size: 7.0,
            spacing_offset: 1.5,
        };
        let style = ModuleStyle::new(Shape::Circle, Color::BLACK);

        let mut batched = Pixmap::new(60, 60).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        draw_modules(&mut batched, &modules, &layout, &style, &mut rng);

        assert_close(&batched, &unbatched(&modules, &layout, &style));
    }

    #[test]
    fn no_modules_leaves_surface_untouched() {
        let mut pixmap = Pixmap::new(10, 10).unwrap();
        let layout = ModuleLayout::for_raster(10, 10, 100, 0);
        let style = ModuleStyle::new(Shape::Square, Color::BLACK);
        let mut rng = StdRng::seed_from_u64(0);
        draw_modules(&mut pixmap, &[], &layout, &style, &mut rng);
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }
}
