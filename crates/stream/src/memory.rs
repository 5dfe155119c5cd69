use crossbeam_channel::{Receiver, Sender, TryRecvError};
use worldsim_common::Frame;

use crate::channel::{Delivery, PushChannel};
use crate::error::StreamError;

/// Create a connected in-process channel and the peer that plays the source.
pub fn memory_pair() -> (MemoryChannel, MemoryPeer) {
    let (request_tx, request_rx) = crossbeam_channel::unbounded();
    let (delivery_tx, delivery_rx) = crossbeam_channel::unbounded();
    (
        MemoryChannel {
            requests: request_tx,
            deliveries: delivery_rx,
            closed: false,
        },
        MemoryPeer {
            requests: request_rx,
            deliveries: delivery_tx,
        },
    )
}

/// Client end of an in-process channel.
pub struct MemoryChannel {
    requests: Sender<()>,
    deliveries: Receiver<Delivery>,
    closed: bool,
}

impl PushChannel for MemoryChannel {
    fn emit_request(&mut self) -> Result<(), StreamError> {
        self.requests
            .send(())
            .map_err(|_| StreamError::ConnectionLost("peer closed".into()))
    }

    fn try_next(&mut self) -> Option<Delivery> {
        match self.deliveries.try_recv() {
            Ok(delivery) => Some(delivery),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) if !self.closed => {
                self.closed = true;
                Some(Err(StreamError::ConnectionLost("peer closed".into())))
            }
            Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// Source end of an in-process channel.
///
/// Counts the requests the client fired and pushes deliveries on its own
/// schedule. Dropping the peer closes the channel.
pub struct MemoryPeer {
    requests: Receiver<()>,
    deliveries: Sender<Delivery>,
}

impl MemoryPeer {
    /// Requests emitted and not yet taken.
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Drain and count pending requests.
    pub fn take_requests(&self) -> usize {
        self.requests.try_iter().count()
    }

    pub fn push_frame(&self, frame: Frame) {
        let _ = self.deliveries.send(Ok(frame));
    }

    pub fn push_error(&self, error: StreamError) {
        let _ = self.deliveries.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldsim_common::Entity;

    #[test]
    fn requests_reach_the_peer() {
        let (mut channel, peer) = memory_pair();
        channel.emit_request().unwrap();
        channel.emit_request().unwrap();
        assert_eq!(peer.pending_requests(), 2);
        assert_eq!(peer.take_requests(), 2);
        assert_eq!(peer.pending_requests(), 0);
    }

    #[test]
    fn frames_are_delivered_in_order() {
        let (mut channel, peer) = memory_pair();
        peer.push_frame(Frame::new(vec![Entity::new("human", 0.0, 0.0)]));
        peer.push_frame(Frame::default());

        assert_eq!(channel.try_next().unwrap().unwrap().len(), 1);
        assert_eq!(channel.try_next().unwrap().unwrap().len(), 0);
        assert!(channel.try_next().is_none());
    }

    #[test]
    fn dropped_peer_reports_connection_lost_once() {
        let (mut channel, peer) = memory_pair();
        peer.push_frame(Frame::default());
        drop(peer);

        assert!(channel.try_next().unwrap().is_ok());
        let lost = channel.try_next().unwrap().unwrap_err();
        assert!(lost.is_connection_lost());
        assert!(channel.try_next().is_none());
        assert!(channel.emit_request().unwrap_err().is_connection_lost());
    }
}
