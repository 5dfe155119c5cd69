//! Rendering: a software raster surface and frame renderers.
//!
//! # Invariants
//! - Renderers read frames; they never mutate them.
//! - Every render clears the whole surface before painting, so each frame
//!   fully replaces the previous one.
//! - Paint order is frame order; later entities occlude earlier ones.

mod palette;
mod renderer;
mod surface;

pub use palette::Palette;
pub use renderer::{grid_to_pixel, DebugTextRenderer, RasterRenderer, RenderStats, Renderer};
pub use surface::{Rgba, Surface, SurfaceError};

pub fn crate_info() -> &'static str {
    "worldsim-render v0.1.0"
}
