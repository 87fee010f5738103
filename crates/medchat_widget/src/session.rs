//! Conversation controller: transcript, typing placeholder, and the
//! Idle ⇄ AwaitingResponse state machine that gates submissions.

use std::time::Duration;

use async_trait::async_trait;
use medchat_client::{validate_outgoing, ChatError, ChatReply, Client, Config, InvalidMessage};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::format::{escape_html, format_message};
use crate::notify::{NotificationCenter, NotificationKind};

/// Anything that can answer a chat message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<ChatReply, ChatError>;
}

#[async_trait]
impl ChatBackend for Client {
    async fn send(&self, message: &str) -> Result<ChatReply, ChatError> {
        self.chat(message).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// One transcript entry. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, sender: Sender, timestamp: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: timestamp.into(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "<div class=\"message {}-message\"><div class=\"message-content\">{}</div><div class=\"message-time\">{}</div></div>",
            self.sender.as_str(),
            format_message(&self.text),
            escape_html(&self.timestamp)
        )
    }
}

const TYPING_PLACEHOLDER: &str = "<div class=\"message bot-message typing-indicator\"><span></span><span></span><span></span></div>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

/// Result of offering text to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The trimmed message was appended and should be sent.
    Accepted(String),
    Empty,
    TooLong { chars: usize, max: usize },
    /// A request is already in flight.
    Busy,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_message_chars: usize,
    pub request_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_message_chars: config.max_message_chars(),
            request_timeout: config.request_timeout(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Local wall-clock time as shown next to messages.
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Bot text shown in place of an answer when a request fails.
pub fn apology_for(err: &ChatError) -> String {
    match err {
        ChatError::Application(msg) => {
            format!("Sorry, I couldn't answer that: {}. Please try again.", msg)
        }
        ChatError::Timeout(_) => {
            "Sorry, the server took too long to respond. Please try again.".to_string()
        }
        _ => "Sorry, I'm having trouble connecting to the server. Please try again.".to_string(),
    }
}

#[derive(Debug)]
pub struct ChatSession {
    state: SessionState,
    transcript: Vec<ChatMessage>,
    typing: bool,
    notifications: NotificationCenter,
    settings: SessionSettings,
}

impl ChatSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            state: SessionState::Idle,
            transcript: Vec::new(),
            typing: false,
            notifications: NotificationCenter::new(),
            settings,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// True while the typing placeholder is shown.
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// Validate `text` and, if accepted, move to AwaitingResponse.
    ///
    /// Length is checked before the busy state, so an overlong message always
    /// produces a warning.
    pub fn begin_submit(&mut self, text: &str) -> Submission {
        let message = match validate_outgoing(text, self.settings.max_message_chars) {
            Ok(m) => m.to_string(),
            Err(InvalidMessage::Empty) => return Submission::Empty,
            Err(InvalidMessage::TooLong { chars, max }) => {
                log::warn!("rejected message of {} chars (limit {})", chars, max);
                self.notifications.show(
                    format!("Message too long. Please keep it under {} characters.", max),
                    NotificationKind::Warning,
                );
                return Submission::TooLong { chars, max };
            }
        };
        if self.state == SessionState::AwaitingResponse {
            log::debug!("submission ignored: request already in flight");
            return Submission::Busy;
        }

        self.transcript
            .push(ChatMessage::new(message.clone(), Sender::User, local_timestamp()));
        self.typing = true;
        self.state = SessionState::AwaitingResponse;
        log::info!("session: idle -> awaiting response");
        Submission::Accepted(message)
    }

    /// Settle the in-flight request. Returns false (and does nothing) when
    /// no request is outstanding.
    pub fn complete(&mut self, result: Result<ChatReply, ChatError>) -> bool {
        if self.state != SessionState::AwaitingResponse {
            log::warn!("completion ignored: no request in flight");
            return false;
        }
        self.typing = false;
        match result {
            Ok(reply) => {
                let timestamp = reply.timestamp.unwrap_or_else(local_timestamp);
                self.transcript
                    .push(ChatMessage::new(reply.response, Sender::Bot, timestamp));
            }
            Err(ChatError::Cancelled) => {
                log::info!("request cancelled");
                self.notifications
                    .show("Request cancelled.", NotificationKind::Info);
            }
            Err(err) => {
                log::warn!("chat request failed: {}", err);
                self.transcript
                    .push(ChatMessage::new(apology_for(&err), Sender::Bot, local_timestamp()));
            }
        }
        self.state = SessionState::Idle;
        log::info!("session: awaiting response -> idle");
        true
    }

    /// Submit `text` to `backend` and wait for the reply, the configured
    /// timeout, or `cancel`, whichever comes first.
    pub async fn submit<B>(
        &mut self,
        backend: &B,
        text: &str,
        cancel: &CancellationToken,
    ) -> Submission
    where
        B: ChatBackend + ?Sized,
    {
        let submission = self.begin_submit(text);
        let Submission::Accepted(message) = &submission else {
            return submission;
        };

        let limit = self.settings.request_timeout;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChatError::Cancelled),
            r = tokio::time::timeout(limit, backend.send(message)) => {
                r.unwrap_or(Err(ChatError::Timeout(limit)))
            }
        };
        self.complete(result);
        submission
    }

    /// Empty the transcript. Ignored while a request is in flight.
    pub fn clear(&mut self) -> bool {
        if self.state == SessionState::AwaitingResponse {
            return false;
        }
        self.transcript.clear();
        true
    }

    /// Transcript as HTML, with the typing placeholder last when shown.
    pub fn render_transcript(&self) -> String {
        let mut out: String = self.transcript.iter().map(ChatMessage::render).collect();
        if self.typing {
            out.push_str(TYPING_PLACEHOLDER);
        }
        out
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}
