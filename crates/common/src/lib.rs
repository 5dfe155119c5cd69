//! Shared data model for the worldsim viewer.
//!
//! # Invariants
//! - A `Frame` is a complete snapshot; it replaces the previous one wholesale.
//! - Entity identity does not persist across frames.
//! - Unknown entity kinds decode successfully and are carried as `EntityKind::Other`.

mod frame;
mod types;

pub use frame::{Census, Frame};
pub use types::{Entity, EntityKind};

/// Pixels per grid cell on the drawing surface.
pub const CELL_PIXELS: f32 = 5.0;

/// Side length, in pixels, of the square painted for one entity.
pub const SQUARE_PIXELS: u32 = 5;

/// Names of the events exchanged with the snapshot source.
pub mod event {
    /// Inbound: the source delivers a frame.
    pub const UPDATE: &str = "update";
    /// Outbound: ask the source for a fresh frame. Carries no payload.
    pub const REQUEST_UPDATE: &str = "request_update";
}

pub fn crate_info() -> &'static str {
    "worldsim-common v0.1.0"
}
