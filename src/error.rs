use thiserror::Error;

/// Everything that can go wrong between the client and the task server.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request never reached the server, or no response came back.
    #[error("could not reach the task server: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response from the task server: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected on the client before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl SyncError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
