use worldsim_render::SurfaceError;
use worldsim_stream::StreamError;

/// Conditions the client reports to the user. None of them stop the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection to snapshot source lost: {0}")]
    ConnectionLost(String),
    #[error("received an invalid frame: {0}")]
    InvalidFrame(String),
    #[error("no element with id `{0}`")]
    MissingElement(String),
    #[error("surface `{element}` is unusable: {source}")]
    Surface {
        element: String,
        #[source]
        source: SurfaceError,
    },
}

impl From<StreamError> for ClientError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::ConnectionLost(msg) => ClientError::ConnectionLost(msg),
            StreamError::InvalidFrame(msg) => ClientError::InvalidFrame(msg),
            StreamError::Encode(e) => ClientError::ConnectionLost(format!("request not sent: {e}")),
        }
    }
}
