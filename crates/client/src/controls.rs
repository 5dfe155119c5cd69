use crate::error::ClientError;

/// Element id of the start control.
pub const START_ELEMENT: &str = "start";
/// Element id of the pause control.
pub const PAUSE_ELEMENT: &str = "pause";

/// A UI control the client responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Pause,
}

impl Control {
    /// Resolve a clicked element id.
    pub fn from_element_id(id: &str) -> Result<Self, ClientError> {
        match id {
            START_ELEMENT => Ok(Control::Start),
            PAUSE_ELEMENT => Ok(Control::Pause),
            other => Err(ClientError::MissingElement(other.to_owned())),
        }
    }

    pub fn element_id(self) -> &'static str {
        match self {
            Control::Start => START_ELEMENT,
            Control::Pause => PAUSE_ELEMENT,
        }
    }
}
