//! Error type shared by the client and the chat session.

use std::time::Duration;
use thiserror::Error;

/// Why an outgoing message was refused before it reached the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMessage {
    #[error("message is empty")]
    Empty,
    #[error("message too long ({chars} characters, limit is {max})")]
    TooLong { chars: usize, max: usize },
}

/// Failure of a backend call.
///
/// `Transport` and `Application` are the two kinds the user sees as an
/// apology in the transcript. `Cancelled` is only produced by the session
/// when the caller aborts an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Connection refused, reset, TLS failure and the like.
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with an explicit `error` field.
    #[error("server error: {0}")]
    Application(String),

    /// The server answered with JSON we could not interpret.
    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("invalid message: {0}")]
    InvalidMessage(#[from] InvalidMessage),
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ChatError::Decode(e.to_string())
        } else {
            ChatError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Decode(e.to_string())
    }
}
