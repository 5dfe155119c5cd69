use serde::{Deserialize, Serialize};
use serde_json::Value;
use worldsim_common::{Frame, event};

use crate::error::StreamError;

/// Wire envelope: one JSON object per line.
///
/// ```text
/// {"event":"request_update"}
/// {"event":"update","data":{"date":"0002-01-01T00:00:00","characters":[...]}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

/// An inbound event after decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A new frame to paint.
    Update(Frame),
    /// An event this client does not consume.
    Other(String),
}

/// The outbound `request_update` envelope. It carries no payload.
pub fn request_update() -> Envelope {
    Envelope {
        event: event::REQUEST_UPDATE.to_owned(),
        data: Value::Null,
    }
}

/// Serialize an envelope as a single newline-terminated line.
pub fn encode_line(envelope: &Envelope) -> Result<String, StreamError> {
    let mut line = serde_json::to_string(envelope)?;
    line.push('\n');
    Ok(line)
}

/// Decode one inbound line.
pub fn decode_line(line: &str) -> Result<ServerEvent, StreamError> {
    let envelope: Envelope = serde_json::from_str(line.trim())
        .map_err(|e| StreamError::InvalidFrame(format!("bad envelope: {e}")))?;

    if envelope.event != event::UPDATE {
        return Ok(ServerEvent::Other(envelope.event));
    }

    let frame: Frame = serde_json::from_value(envelope.data)
        .map_err(|e| StreamError::InvalidFrame(format!("bad update payload: {e}")))?;
    Ok(ServerEvent::Update(frame))
}
