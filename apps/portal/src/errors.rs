use thiserror::Error;

/// Message surfaced when the status poll exhausts its attempt budget.
pub const POLL_TIMEOUT_MESSAGE: &str = "Processing timeout";

/// Client-level error type shared by the store client and the recommendation pipeline.
/// Every variant aborts the current operation; none of them touch the candidate cache.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The remote service answered with a non-success status.
    #[error("Request rejected (status {status}): {message}")]
    RequestRejected { status: u16, message: String },

    /// The call could not complete, or the response body could not be decoded.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote evaluator reported status "error" for the task.
    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("{POLL_TIMEOUT_MESSAGE} ({attempts} attempts)")]
    PollTimeout { attempts: u32 },

    /// The cycle was abandoned because a newer one started.
    #[error("Cancelled")]
    Cancelled,
}

impl ClientError {
    /// The single message shown to the user for a failed operation.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::RequestRejected { message, .. } => message.clone(),
            ClientError::Transport(msg) => {
                tracing::error!("Transport error: {msg}");
                "Could not reach the recruiting service".to_string()
            }
            ClientError::TaskFailed(msg) => msg.clone(),
            ClientError::PollTimeout { .. } => POLL_TIMEOUT_MESSAGE.to_string(),
            ClientError::Cancelled => "Cancelled".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Transport(format!("malformed response: {e}"))
    }
}
