//! HTTP message types for the MedChat backend. Client ↔ server JSON.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, InvalidMessage};

/// Longest message (in characters) the backend accepts.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Trim `text` and check it against the emptiness and length limits.
pub fn validate_outgoing(text: &str, max_chars: usize) -> Result<&str, InvalidMessage> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InvalidMessage::Empty);
    }
    let chars = trimmed.chars().count();
    if chars > max_chars {
        return Err(InvalidMessage::TooLong {
            chars,
            max: max_chars,
        });
    }
    Ok(trimmed)
}

/// Client → server: `POST /chat` body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

impl<'a> ChatRequest<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { message }
    }
}

/// Server → client: successful chat answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Server → client: result of `POST /reprocess_pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReprocessReply {
    pub chunks_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Vector store statistics reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_chunks: u64,
    #[serde(default)]
    pub index_size: Option<u64>,
    #[serde(default)]
    pub dimension: Option<u64>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Server → client: `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub vector_database: Option<DatabaseStats>,
    #[serde(default, alias = "groq_model")]
    pub model: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Server → client: `{ "error": "..." }`, sent with any status code.
#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Decode a reply body into `T`, turning an `error` field into
/// `ChatError::Application` first.
pub fn decode_reply<T>(value: serde_json::Value) -> Result<T, ChatError>
where
    T: serde::de::DeserializeOwned,
{
    if value.get("error").is_some() {
        let body: ErrorBody = serde_json::from_value(value)?;
        return Err(ChatError::Application(body.error));
    }
    Ok(serde_json::from_value(value)?)
}
