use http::StatusCode;
use thiserror::Error;

/// Result type alias for BrightDoor operations
pub type Result<T, E = BrightDoorError> = std::result::Result<T, E>;

/// Errors that can occur while talking to the BrightDoor contact API
#[derive(Error, Debug)]
pub enum BrightDoorError {
    /// The auth test was answered, but not with a 200 JSON response.
    #[error("{0}")]
    Auth(String),

    /// No response was received (DNS, connect, TLS, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered a sync or lookup call with a non-success status.
    #[error("{message}")]
    RemoteRejection { status: StatusCode, message: String },

    /// A credential field is empty. Raised before any request is built.
    #[error("Invalid credentials: {0} is empty")]
    InvalidCredentials(&'static str),

    #[error("Refusing to send an empty request to {0}")]
    EmptyRequest(&'static str),

    #[error("Could not encode contact payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BrightDoorError {
    pub fn is_transport(&self) -> bool {
        matches!(self, BrightDoorError::Transport(_))
    }
}
