use worldsim_common::Frame;

use crate::error::StreamError;

/// One item delivered by the source: a frame, or a reported failure.
pub type Delivery = Result<Frame, StreamError>;

/// A bidirectional, push-based link to the snapshot source.
///
/// Both methods return immediately. Loss of the underlying link is reported
/// through `try_next` once; after that it yields `None`.
pub trait PushChannel {
    /// Fire a `request_update` event. Does not wait for a reply.
    fn emit_request(&mut self) -> Result<(), StreamError>;

    /// Next pending delivery, if any.
    fn try_next(&mut self) -> Option<Delivery>;
}

impl<T: PushChannel + ?Sized> PushChannel for Box<T> {
    fn emit_request(&mut self) -> Result<(), StreamError> {
        (**self).emit_request()
    }

    fn try_next(&mut self) -> Option<Delivery> {
        (**self).try_next()
    }
}
