//! Frontend-facing facade: one chat session bound to one backend client.
//! Every method returns plain data; the page only has to insert the HTML.

use std::time::Instant;

use medchat_client::{ChatError, Client, Config, HealthReport, ReprocessReply};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::notify::{Notification, NotificationKind};
use crate::session::{ChatMessage, ChatSession, SessionSettings, SessionState, Submission};

/// Snapshot of everything the page shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetView {
    pub state: SessionState,
    pub typing: bool,
    pub messages: Vec<ChatMessage>,
    pub notifications: Vec<Notification>,
    pub transcript_html: String,
    pub notifications_html: String,
}

pub struct ChatWidget {
    client: Client,
    session: ChatSession,
    cancel: CancellationToken,
}

impl ChatWidget {
    pub fn new(client: Client, settings: SessionSettings) -> Self {
        Self {
            client,
            session: ChatSession::new(settings),
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let client = Client::from_config(config)?;
        Ok(Self::new(client, SessionSettings::from_config(config)))
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Token that aborts the request started by the next or current
    /// [`send_message`](Self::send_message).
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn send_message(&mut self, text: &str) -> Submission {
        // A token cancelled while idle must not abort the next request.
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        let token = self.cancel.clone();
        let submission = self.session.submit(&self.client, text, &token).await;
        if token.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        submission
    }

    /// Rebuild the backend knowledge base, reporting progress as notifications.
    pub async fn reprocess_knowledge_base(&mut self) -> Result<ReprocessReply, ChatError> {
        self.session.notifications_mut().show(
            "Reprocessing medical knowledge base. This may take a few minutes...",
            NotificationKind::Info,
        );
        let result = self.client.reprocess_pdf().await;
        match &result {
            Ok(reply) => {
                log::info!("knowledge base rebuilt: {} chunks", reply.chunks_count);
                self.session.notifications_mut().show(
                    format!(
                        "Knowledge base reprocessed successfully! {} chunks created.",
                        reply.chunks_count
                    ),
                    NotificationKind::Success,
                );
            }
            Err(e) => {
                log::warn!("reprocess failed: {}", e);
                self.session
                    .notifications_mut()
                    .show(format!("Failed to reprocess PDF: {}", e), NotificationKind::Error);
            }
        }
        result
    }

    /// One-shot backend health check; failures surface as a warning.
    pub async fn check_health(&mut self) -> Result<HealthReport, ChatError> {
        let result = self.client.health().await;
        if let Err(e) = &result {
            self.session.notifications_mut().show(
                format!("Medical assistant is unavailable: {}", e),
                NotificationKind::Warning,
            );
        }
        result
    }

    pub fn clear_chat(&mut self) -> bool {
        self.session.clear()
    }

    pub fn view(&mut self) -> WidgetView {
        self.view_at(Instant::now())
    }

    /// Sweep expired banners and snapshot the widget as of `now`.
    pub fn view_at(&mut self, now: Instant) -> WidgetView {
        let notices = self.session.notifications_mut();
        notices.sweep(now);
        let notifications = notices
            .active_at(now)
            .map(|b| b.notification.clone())
            .collect();
        let notifications_html = notices.render_at(now);

        WidgetView {
            state: self.session.state(),
            typing: self.session.is_typing(),
            messages: self.session.transcript().to_vec(),
            notifications,
            transcript_html: self.session.render_transcript(),
            notifications_html,
        }
    }
}
