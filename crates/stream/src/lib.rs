//! Push channel to the snapshot source.
//!
//! The source pushes `update` events carrying a complete [`Frame`]; the client
//! fires `request_update` events without waiting for replies.
//!
//! # Invariants
//! - Emitting a request never blocks and never waits for a response.
//! - Requests and responses are not correlated; deliveries arrive in the order
//!   the source sends them.
//! - A malformed event is reported as [`StreamError::InvalidFrame`] and does not
//!   close the channel.
//! - Connection loss is reported once; there is no reconnect.
//!
//! [`Frame`]: worldsim_common::Frame

mod channel;
mod envelope;
mod error;
mod memory;
mod tcp;

pub use channel::{Delivery, PushChannel};
pub use envelope::{decode_line, encode_line, request_update, Envelope, ServerEvent};
pub use error::StreamError;
pub use memory::{memory_pair, MemoryChannel, MemoryPeer};
pub use tcp::TcpChannel;

pub fn crate_info() -> &'static str {
    "worldsim-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}
