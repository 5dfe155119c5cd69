use glam::Vec2;
use std::fmt::Write as _;
use worldsim_common::{CELL_PIXELS, Frame, SQUARE_PIXELS};

use crate::palette::Palette;
use crate::surface::Surface;

/// Frame renderer interface. All renderers implement this trait.
///
/// A renderer reads one frame and produces output. It never mutates the frame.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, frame: &Frame) -> Self::Output;
}

/// Convert a grid position to the top-left pixel of its square.
pub fn grid_to_pixel(position: Vec2) -> (i64, i64) {
    let p = (position * CELL_PIXELS).floor();
    (p.x as i64, p.y as i64)
}

/// Outcome of painting one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Entities whose square was drawn (possibly clipped).
    pub painted: usize,
    /// Entities skipped because their kind has no color.
    pub skipped: usize,
}

/// Paints frames onto an owned [`Surface`].
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    surface: Surface,
    palette: Palette,
}

impl RasterRenderer {
    pub fn new(surface: Surface) -> Self {
        Self::with_palette(surface, Palette::default())
    }

    pub fn with_palette(surface: Surface, palette: Palette) -> Self {
        Self { surface, palette }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

impl Renderer for RasterRenderer {
    type Output = RenderStats;

    fn render(&mut self, frame: &Frame) -> RenderStats {
        self.surface.clear();

        let mut stats = RenderStats::default();
        for entity in &frame.entities {
            let Some(color) = self.palette.color_for(&entity.kind) else {
                tracing::trace!(kind = %entity.kind, "no color for entity kind, skipping");
                stats.skipped += 1;
                continue;
            };
            let (x, y) = grid_to_pixel(entity.position);
            self.surface
                .fill_rect(x, y, SQUARE_PIXELS, SQUARE_PIXELS, color);
            stats.painted += 1;
        }
        stats
    }
}

/// Text renderer for CLI output, logging, and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &Frame) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame (date={}) ===",
            frame.date.as_deref().unwrap_or("unknown")
        );
        let _ = writeln!(out, "Entities: {}", frame.len());
        let _ = writeln!(out, "Census: {}", frame.census());

        for entity in &frame.entities {
            let (px, py) = grid_to_pixel(entity.position);
            let _ = write!(
                out,
                "  {:<8} grid=({:.0}, {:.0}) px=({px}, {py})",
                entity.kind.as_str(),
                entity.position.x,
                entity.position.y,
            );
            if let Some(health) = entity.health {
                let _ = write!(out, " health={health}");
            }
            if let Some(age) = entity.age {
                let _ = write!(out, " age={age}");
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Rgba;
    use worldsim_common::Entity;

    fn raster(width: u32, height: u32) -> RasterRenderer {
        RasterRenderer::new(Surface::new(width, height).unwrap())
    }

    #[test]
    fn later_entity_occludes_earlier() {
        let mut r = raster(100, 100);
        let frame = Frame::new(vec![
            Entity::new("human", 1.0, 2.0),
            Entity::new("animal", 1.0, 2.0),
        ]);
        let stats = r.render(&frame);

        assert_eq!(stats.painted, 2);
        assert!(r.surface().region_is(5, 10, 5, 5, Rgba::GREEN));
        assert_eq!(r.surface().pixel(10, 10), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn unknown_kind_leaves_a_gap() {
        let mut r = raster(100, 100);
        let frame = Frame::new(vec![Entity::new("robot", 3.0, 3.0)]);
        let stats = r.render(&frame);

        assert_eq!(stats, RenderStats { painted: 0, skipped: 1 });
        assert!(r.surface().region_is(15, 15, 5, 5, Rgba::TRANSPARENT));
    }

    #[test]
    fn unknown_kind_does_not_stop_later_entities() {
        let mut r = raster(100, 100);
        let frame = Frame::new(vec![
            Entity::new("robot", 0.0, 0.0),
            Entity::new("insect", 2.0, 0.0),
        ]);
        r.render(&frame);

        assert!(r.surface().region_is(0, 0, 5, 5, Rgba::TRANSPARENT));
        assert!(r.surface().region_is(10, 0, 5, 5, Rgba::RED));
    }

    #[test]
    fn scale_is_five_pixels_per_cell() {
        let mut r = raster(100, 100);
        r.render(&Frame::new(vec![Entity::new("human", 10.0, 0.0)]));

        assert_eq!(r.surface().pixel(49, 0), Some(Rgba::TRANSPARENT));
        assert!(r.surface().region_is(50, 0, 5, 5, Rgba::BLUE));
        assert_eq!(r.surface().pixel(55, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn each_frame_replaces_the_previous() {
        let mut r = raster(50, 50);
        r.render(&Frame::new(vec![Entity::new("human", 0.0, 0.0)]));
        r.render(&Frame::new(vec![Entity::new("animal", 5.0, 5.0)]));

        assert!(r.surface().region_is(0, 0, 5, 5, Rgba::TRANSPARENT));
        assert!(r.surface().region_is(25, 25, 5, 5, Rgba::GREEN));
    }

    #[test]
    fn empty_frame_clears_surface() {
        let mut r = raster(20, 20);
        r.render(&Frame::new(vec![Entity::new("insect", 1.0, 1.0)]));
        r.render(&Frame::default());
        assert!(r.surface().region_is(0, 0, 20, 20, Rgba::TRANSPARENT));
    }

    #[test]
    fn off_surface_entities_are_clipped() {
        let mut r = raster(20, 20);
        let stats = r.render(&Frame::new(vec![
            Entity::new("human", 3.0, 3.0),
            Entity::new("human", 99.0, 99.0),
            Entity::new("animal", -1.0, 0.0),
        ]));

        assert_eq!(stats.painted, 3);
        assert!(r.surface().region_is(15, 15, 5, 5, Rgba::BLUE));
        assert!(r.surface().region_is(0, 0, 15, 15, Rgba::TRANSPARENT));
    }

    #[test]
    fn huge_coordinates_are_clipped() {
        let mut r = raster(20, 20);
        let stats = r.render(&Frame::new(vec![
            Entity::new("human", f32::INFINITY, 0.0),
            Entity::new("insect", f32::NEG_INFINITY, 0.0),
            Entity::new("human", 0.0, 2e18),
            Entity::new("animal", 1.0, 1.0),
        ]));

        assert_eq!(stats.painted, 4);
        assert!(r.surface().region_is(5, 5, 5, 5, Rgba::GREEN));
        assert!(r.surface().region_is(0, 0, 20, 5, Rgba::TRANSPARENT));
    }

    #[test]
    fn fractional_positions_floor_to_pixel() {
        assert_eq!(grid_to_pixel(Vec2::new(1.5, 0.3)), (7, 1));
        assert_eq!(grid_to_pixel(Vec2::new(-0.5, 0.0)), (-3, 0));
    }

    #[test]
    fn custom_palette() {
        let palette = Palette {
            human: Rgba::rgb(1, 2, 3),
            ..Palette::default()
        };
        let mut r = RasterRenderer::with_palette(Surface::new(10, 10).unwrap(), palette);
        r.render(&Frame::new(vec![Entity::new("human", 0.0, 0.0)]));
        assert_eq!(r.surface().pixel(0, 0), Some(Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn debug_renderer_empty_frame() {
        let output = DebugTextRenderer::new().render(&Frame::default());
        assert!(output.contains("date=unknown"));
        assert!(output.contains("Entities: 0"));
    }

    #[test]
    fn debug_renderer_with_entities() {
        let mut human = Entity::new("human", 1.0, 2.0);
        human.health = Some(90.0);
        human.age = Some(30);
        let frame = Frame {
            date: Some("0005-01-01T00:00:00".into()),
            entities: vec![human, Entity::new("robot", 3.0, 3.0)],
        };
        let output = DebugTextRenderer::new().render(&frame);

        assert!(output.contains("date=0005-01-01T00:00:00"));
        assert!(output.contains("Entities: 2"));
        assert!(output.contains("px=(5, 10)"));
        assert!(output.contains("health=90 age=30"));
        assert!(output.contains("robot"));
    }
}
