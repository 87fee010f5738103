//! HTTP client for the MedChat backend: `/chat`, `/reprocess_pdf`, `/health`.

use std::time::Duration;

use crate::config::Config;
use crate::error::ChatError;
use crate::messages::{decode_reply, ChatReply, ChatRequest, HealthReport, ReprocessReply};

/// Backend client. Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Client {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:5000`).
    /// `timeout` bounds every request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        Self::new(&config.base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Like `ChatError::from`, but a fired request timeout stays a timeout.
    fn request_error(&self, e: reqwest::Error) -> ChatError {
        if e.is_timeout() {
            ChatError::Timeout(self.timeout)
        } else {
            ChatError::from(e)
        }
    }

    async fn read_json(&self, req: reqwest::RequestBuilder) -> Result<serde_json::Value, ChatError> {
        let resp = req.send().await.map_err(|e| self.request_error(e))?;
        log::debug!("reply status {}", resp.status());
        resp.json().await.map_err(|e| self.request_error(e))
    }

    /// Send one chat message. The text is sent as given; callers validate it
    /// with [`crate::validate_outgoing`] first.
    pub async fn chat(&self, message: &str) -> Result<ChatReply, ChatError> {
        let url = self.endpoint("chat");
        log::debug!("POST {} ({} chars)", url, message.chars().count());
        let value = self
            .read_json(self.http.post(&url).json(&ChatRequest::new(message)))
            .await?;
        decode_reply(value)
    }

    /// Ask the backend to rebuild its knowledge base from the source PDF.
    pub async fn reprocess_pdf(&self) -> Result<ReprocessReply, ChatError> {
        let url = self.endpoint("reprocess_pdf");
        log::debug!("POST {}", url);
        let value = self.read_json(self.http.post(&url)).await?;
        decode_reply(value)
    }

    pub async fn health(&self) -> Result<HealthReport, ChatError> {
        let url = self.endpoint("health");
        log::debug!("GET {}", url);
        let value = self.read_json(self.http.get(&url)).await?;
        let report: HealthReport = decode_reply(value)?;
        if report.status != "healthy" {
            log::warn!("backend reports status {:?}", report.status);
        }
        Ok(report)
    }
}
