//! Render client: bridges UI controls, a push-based snapshot source and a
//! drawing surface.
//!
//! The client is single-threaded and cooperative. Two independent paths enter
//! it: the per-refresh request loop (`start` / `on_frame` / `pause`) and the
//! snapshot path (`pump` / `on_snapshot`).
//!
//! # Invariants
//! - At most one self-scheduling request chain exists at a time.
//! - `start` is a no-op while requesting; `pause` is a no-op while idle.
//! - Painting is independent of loop state: a snapshot arriving after `pause`
//!   is still painted.
//! - No failure is fatal. Connection loss, malformed frames and unknown
//!   controls are logged and the client carries on.

mod client;
mod clock;
mod config;
mod controls;
mod error;

pub use client::{ClientStats, LoopState, RenderClient};
pub use clock::{FrameClock, FrameHandle, RefreshClock, RefreshTimer};
pub use config::{ClientConfig, SURFACE_ELEMENT};
pub use controls::{Control, PAUSE_ELEMENT, START_ELEMENT};
pub use error::ClientError;

pub fn crate_info() -> &'static str {
    "worldsim-client v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("client"));
    }
}
