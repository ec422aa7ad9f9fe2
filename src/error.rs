//! Error types shared by the display link and the animation controller.

use thiserror::Error;

/// Failures talking to the Hime Display process.
///
/// Every variant is a connectivity-class failure: the link marks itself
/// disconnected and the next command triggers a fresh connect.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Connection to display timed out after {0} ms")]
    ConnectTimeout(u64),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Display closed the connection")]
    Closed,

    #[error("No response to '{action}' within {timeout_ms} ms")]
    RequestTimeout { action: String, timeout_ms: u64 },

    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by controller operations.
#[derive(Debug, Error)]
pub enum AnimatorError {
    #[error("Display link error: {0}")]
    Link(#[from] LinkError),

    #[error("Display rejected '{action}': {reason}")]
    Rejected { action: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = AnimatorError> = std::result::Result<T, E>;
