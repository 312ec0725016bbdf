//! Error types for the Powerlink node

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PowerlinkError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Powerlink API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),
}

pub type Result<T> = std::result::Result<T, PowerlinkError>;

impl PowerlinkError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        PowerlinkError::InvalidParameter(msg.into())
    }

    /// True when the remote call failed, as opposed to bad host input
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            PowerlinkError::Transport(_)
                | PowerlinkError::Status { .. }
                | PowerlinkError::MalformedResponse(_)
        )
    }
}
