/// Errors surfaced by a push channel.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StreamError {
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, StreamError::ConnectionLost(_))
    }
}
