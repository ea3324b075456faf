//! The styling pipeline.
//!
//! [`StyleCompositor`] turns an unstyled base raster into the final image.
//! Each render runs the same sequence on a fresh surface:
//!
//! ```text
//! Base raster
//!     │
//!     ▼
//! ┌────────────┐
//! │ Background │ ◄── light color or gradient
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │   Shadow   │ ◄── top complexity tier only
//! └─────┬──────┘
//!       ▼
//! ┌────────────┐
//! │  Content   │ ◄── styled modules, or the base raster as-is
//! └─────┬──────┘     (complexity filter applied here)
//!       ▼
//! ┌────────────┐
//! │    Logo    │ ◄── skipped with a warning when loading fails
//! └────────────┘
//! ```

use image::RgbaImage;
use rand::Rng;
use resvg::tiny_skia::{Color as SkiaColor, Pixmap, PixmapPaint, Transform};

use crate::config::RenderConfig;
use crate::effects::{self, ComplexityTier};
use crate::error::StageError;
use crate::logo::{self, LogoLoader};
use crate::module::animation::{self, Clock};
use crate::module::{self, ModuleClassifier, ModuleLayout, ModuleStyle, batch};
use crate::raster;

/// What a render pass did, for logging and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub tier: ComplexityTier,
    /// Dark modules re-drawn, or `None` when the base raster was used as-is.
    pub styled_modules: Option<usize>,
    pub animated: bool,
    pub logo_drawn: bool,
}

/// Drives background, effects, module styling and logo over a base raster.
///
/// The classifier cache is owned by the compositor and cleared at the start
/// of every [`compose`](Self::compose), so one compositor can serve several
/// renders without stale classifications.
pub struct StyleCompositor<'a> {
    classifier: ModuleClassifier,
    logo_loader: &'a dyn LogoLoader,
    clock: &'a dyn Clock,
}

impl<'a> StyleCompositor<'a> {
    /// Creates a compositor with a fresh classifier cache.
    pub fn new(logo_loader: &'a dyn LogoLoader, clock: &'a dyn Clock) -> Self {
        Self {
            classifier: ModuleClassifier::new(),
            logo_loader,
            clock,
        }
    }

    /// The classifier, holding the cache of the last render.
    pub fn classifier(&self) -> &ModuleClassifier {
        &self.classifier
    }

    /// Renders `base` styled by `config` into a new surface of the same size.
    pub fn compose(
        &mut self,
        base: &RgbaImage,
        config: &RenderConfig,
        rng: &mut impl Rng,
    ) -> Result<(Pixmap, RenderSummary), StageError> {
        self.classifier.clear();

        let (width, height) = base.dimensions();
        let mut surface = new_surface(width, height)?;
        surface.fill(SkiaColor::TRANSPARENT);
        effects::draw_background(&mut surface, &config.color);

        let tier = ComplexityTier::for_level(config.complexity);
        tracing::debug!(complexity = config.complexity, ?tier, "complexity tier");
        if tier.shadow {
            effects::draw_shadow(&mut surface, base);
        }

        let mut summary = RenderSummary {
            tier,
            styled_modules: None,
            animated: false,
            logo_drawn: false,
        };

        let mut content = if config.needs_module_styling() {
            let layout = ModuleLayout::for_raster(
                width,
                height,
                config.module_size,
                config.module_spacing,
            );
            let modules = module::collect_dark_modules(base, layout.pitch, &mut self.classifier);
            let style = ModuleStyle::from_config(config);
            tracing::debug!(
                modules = modules.len(),
                pitch = layout.pitch,
                batched = batch::is_batchable(&style),
                "styling modules"
            );

            let mut layer = new_surface(width, height)?;
            match config.animation.as_ref().filter(|a| a.enabled) {
                Some(anim) => {
                    let now = self.clock.now_ms();
                    animation::draw_animated(&mut layer, &modules, &layout, &style, anim, now, rng);
                    summary.animated = true;
                }
                None => batch::draw_modules(&mut layer, &modules, &layout, &style, rng),
            }
            summary.styled_modules = Some(modules.len());
            layer
        } else {
            raster::rgba_image_to_pixmap(base).ok_or(StageError::Surface { width, height })?
        };

        tier.apply_filter(&mut content);
        surface.draw_pixmap(
            0,
            0,
            content.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        if let Some(logo_config) = config.logo.as_ref().filter(|l| !l.src.trim().is_empty()) {
            let size = logo::logo_size(logo_config.size, width);
            match self.logo_loader.load(&logo_config.src, size.ceil() as u32) {
                Ok(image) => {
                    logo::draw_logo(&mut surface, &image, size, tier.filter_quality());
                    summary.logo_drawn = true;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to add logo to QR code, rendering without it");
                }
            }
        }

        Ok((surface, summary))
    }
}

fn new_surface(width: u32, height: u32) -> Result<Pixmap, StageError> {
    Pixmap::new(width, height).ok_or(StageError::Surface { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnimationConfig, AnimationType, Shape};
    use crate::logo::DefaultLogoLoader;
    use crate::module::animation::FixedClock;
    use image::Rgba;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// 40x40 raster of 4px cells, dark where `dark(cx, cy)`.
    fn cells(dark: impl Fn(u32, u32) -> bool) -> RgbaImage {
        RgbaImage::from_fn(40, 40, |x, y| {
            if dark(x / 4, y / 4) {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let p = pixmap.pixel(x, y).unwrap();
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    fn compose(base: &RgbaImage, config: &RenderConfig) -> (Pixmap, RenderSummary) {
        let clock = FixedClock(0.0);
        let mut compositor = StyleCompositor::new(&DefaultLogoLoader, &clock);
        compositor
            .compose(base, config, &mut StdRng::seed_from_u64(9))
            .unwrap()
    }

    #[test]
    fn unstyled_render_reproduces_base() {
        let base = cells(|cx, cy| (cx + cy) % 2 == 0);
        let (surface, summary) = compose(&base, &RenderConfig::new());
        assert_eq!(summary.styled_modules, None);
        assert_eq!(raster::pixmap_to_rgba_image(&surface), base);
    }

    #[test]
    fn circles_leave_cell_corners_light() {
        // 400px gives a 10px pitch.
        let base = RgbaImage::from_pixel(400, 400, Rgba([0, 0, 0, 255]));
        let config = RenderConfig::new().with_shape(Shape::Circle);
        let (surface, summary) = compose(&base, &config);

        assert_eq!(summary.styled_modules, Some(1600));
        assert_eq!(rgba(&surface, 5, 5), [0, 0, 0, 255]);
        assert_eq!(rgba(&surface, 0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn classifier_cache_is_cleared_between_renders() {
        let clock = FixedClock(0.0);
        let mut compositor = StyleCompositor::new(&DefaultLogoLoader, &clock);
        let config = RenderConfig::new().with_module_size(80);
        let mut rng = StdRng::seed_from_u64(1);

        let dark = RgbaImage::from_pixel(80, 80, Rgba([0, 0, 0, 255]));
        let (_, first) = compositor.compose(&dark, &config, &mut rng).unwrap();
        assert_eq!(first.styled_modules, Some(40 * 40));

        let light = RgbaImage::from_pixel(80, 80, Rgba([255, 255, 255, 255]));
        let (surface, second) = compositor.compose(&light, &config, &mut rng).unwrap();
        assert_eq!(second.styled_modules, Some(0));
        assert_eq!(rgba(&surface, 41, 41), [255, 255, 255, 255]);
        assert_eq!(compositor.classifier().len(), 40 * 40);
    }

    #[test]
    fn background_shows_through_between_shrunken_modules() {
        // 200px gives a 5px pitch; 60% modules leave a 1px gap on each side.
        let base = RgbaImage::from_pixel(200, 200, Rgba([0, 0, 0, 255]));
        let config = RenderConfig::new()
            .with_module_size(60)
            .with_colors("#000000", "#ff0000");
        let (surface, _) = compose(&base, &config);
        assert_eq!(rgba(&surface, 0, 0), [255, 0, 0, 255]);
        assert_eq!(rgba(&surface, 2, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn animation_uses_the_clock() {
        let base = RgbaImage::from_pixel(200, 200, Rgba([0, 0, 0, 255]));
        let config = RenderConfig::new()
            .with_animation(AnimationConfig::new(AnimationType::Fade).with_timing(100.0, 0.0, 0.0));

        let (early, summary) = compose(&base, &config);
        assert!(summary.animated);
        assert_eq!(rgba(&early, 2, 2), [255, 255, 255, 255]);

        let clock = FixedClock(1_000.0);
        let mut compositor = StyleCompositor::new(&DefaultLogoLoader, &clock);
        let (late, _) = compositor
            .compose(&base, &config, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(rgba(&late, 2, 2), [0, 0, 0, 255]);
    }

    #[test]
    fn failed_logo_leaves_no_plate() {
        let base = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let config = RenderConfig::new().with_logo("/no/such/logo.png", None);
        let (surface, summary) = compose(&base, &config);
        assert!(!summary.logo_drawn);
        assert_eq!(rgba(&surface, 50, 50), [0, 0, 0, 255]);
    }

    #[test]
    fn inline_svg_logo_is_drawn() {
        let base = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8" fill="#00ff00"/></svg>"##;
        let config = RenderConfig::new().with_logo(svg, Some(20.0));
        let (surface, summary) = compose(&base, &config);
        assert!(summary.logo_drawn);
        assert_eq!(rgba(&surface, 50, 50), [0, 255, 0, 255]);
        // Plate edge: logo at 40..60, plate from 35.
        assert_eq!(rgba(&surface, 37, 50), [255, 255, 255, 255]);
    }

    #[test]
    fn top_tier_adds_a_shadow() {
        let base = cells(|cx, _| cx < 5);
        let config = RenderConfig::new().with_complexity(10);
        let (surface, summary) = compose(&base, &config);
        assert!(summary.tier.shadow);
        assert_eq!(raster::pixmap_to_rgba_image(&surface).dimensions(), (40, 40));
    }
}
