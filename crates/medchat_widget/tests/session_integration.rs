//! Tests for the conversation state machine, driven by in-process backends.

use async_trait::async_trait;
use medchat_client::{ChatError, ChatReply};
use medchat_widget::session::apology_for;
use medchat_widget::{
    ChatBackend, ChatSession, NotificationKind, Sender, SessionSettings, SessionState, Submission,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Backend that answers every message with a fixed result and counts calls.
struct FixedBackend {
    result: Result<ChatReply, ChatError>,
    calls: AtomicUsize,
}

impl FixedBackend {
    fn answering(response: &str, timestamp: Option<&str>) -> Self {
        Self {
            result: Ok(ChatReply {
                response: response.into(),
                timestamp: timestamp.map(Into::into),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(err: ChatError) -> Self {
        Self {
            result: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FixedBackend {
    async fn send(&self, _message: &str) -> Result<ChatReply, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Backend that never answers.
struct StalledBackend;

#[async_trait]
impl ChatBackend for StalledBackend {
    async fn send(&self, _message: &str) -> Result<ChatReply, ChatError> {
        std::future::pending().await
    }
}

fn session_with_timeout(timeout: Duration) -> ChatSession {
    ChatSession::new(SessionSettings {
        max_message_chars: 500,
        request_timeout: timeout,
    })
}

#[tokio::test]
async fn successful_exchange_appends_user_and_bot_messages() {
    let backend = FixedBackend::answering("Drink water.\n- rest\n- fluids", Some("10:15"));
    let mut session = ChatSession::default();
    let cancel = CancellationToken::new();

    let outcome = session.submit(&backend, "  How do I treat a cold?  ", &cancel).await;
    assert_eq!(outcome, Submission::Accepted("How do I treat a cold?".into()));
    assert_eq!(backend.calls(), 1);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.is_typing());

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, Sender::User);
    assert_eq!(transcript[0].text, "How do I treat a cold?");
    assert_eq!(transcript[1].sender, Sender::Bot);
    assert_eq!(transcript[1].timestamp, "10:15");

    let html = session.render_transcript();
    assert!(html.contains("<ul><li>rest</li><li>fluids</li></ul>"));
    assert!(html.contains("<div class=\"message user-message\">"));
}

#[tokio::test]
async fn missing_server_timestamp_uses_local_time() {
    let backend = FixedBackend::answering("ok", None);
    let mut session = ChatSession::default();
    session
        .submit(&backend, "hi", &CancellationToken::new())
        .await;

    let ts = &session.transcript()[1].timestamp;
    // %H:%M
    assert_eq!(ts.len(), 5);
    assert_eq!(&ts[2..3], ":");
}

#[tokio::test]
async fn overlong_message_is_rejected_with_warning() {
    let backend = FixedBackend::answering("unused", None);
    let mut session = ChatSession::default();
    let long = "x".repeat(501);

    let outcome = session.submit(&backend, &long, &CancellationToken::new()).await;
    assert_eq!(outcome, Submission::TooLong { chars: 501, max: 500 });
    assert!(session.transcript().is_empty());
    assert_eq!(backend.calls(), 0);
    assert_eq!(session.state(), SessionState::Idle);

    let banners = session.notifications().banners();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].notification.kind, NotificationKind::Warning);
}

#[tokio::test]
async fn empty_message_is_a_silent_no_op() {
    let backend = FixedBackend::answering("unused", None);
    let mut session = ChatSession::default();

    let outcome = session.submit(&backend, " \n\t", &CancellationToken::new()).await;
    assert_eq!(outcome, Submission::Empty);
    assert!(session.transcript().is_empty());
    assert!(session.notifications().banners().is_empty());
    assert_eq!(backend.calls(), 0);
}

#[test]
fn submitting_while_awaiting_response_is_ignored() {
    let mut session = ChatSession::default();
    assert!(matches!(session.begin_submit("first"), Submission::Accepted(_)));
    assert_eq!(session.state(), SessionState::AwaitingResponse);
    assert!(session.is_typing());
    assert_eq!(session.transcript().len(), 1);

    assert_eq!(session.begin_submit("second"), Submission::Busy);
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.state(), SessionState::AwaitingResponse);

    // Overlong input still warns while busy, but changes nothing else.
    let long = "y".repeat(600);
    assert!(matches!(session.begin_submit(&long), Submission::TooLong { .. }));
    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.notifications().banners().len(), 1);
}

#[test]
fn typing_placeholder_is_rendered_only_while_waiting() {
    let mut session = ChatSession::default();
    session.begin_submit("question");
    assert!(session.render_transcript().contains("typing-indicator"));

    session.complete(Ok(ChatReply {
        response: "answer".into(),
        timestamp: Some("08:00".into()),
    }));
    assert!(!session.render_transcript().contains("typing-indicator"));
}

#[test]
fn completion_without_request_is_ignored() {
    let mut session = ChatSession::default();
    let applied = session.complete(Ok(ChatReply {
        response: "stray".into(),
        timestamp: None,
    }));
    assert!(!applied);
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn transport_failure_appends_one_apology_and_returns_to_idle() {
    let backend = FixedBackend::failing(ChatError::Transport("connection refused".into()));
    let mut session = ChatSession::default();

    session
        .submit(&backend, "hello", &CancellationToken::new())
        .await;

    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.is_typing());
    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].sender, Sender::Bot);
    assert_eq!(
        transcript[1].text,
        apology_for(&ChatError::Transport(String::new()))
    );

    // The session is usable again.
    let ok = FixedBackend::answering("back online", None);
    session.submit(&ok, "retry", &CancellationToken::new()).await;
    assert_eq!(session.transcript().len(), 4);
}

#[tokio::test]
async fn application_error_apology_mentions_server_message() {
    let backend = FixedBackend::failing(ChatError::Application("Message too long".into()));
    let mut session = ChatSession::default();
    session.submit(&backend, "hi", &CancellationToken::new()).await;

    let apology = &session.transcript()[1].text;
    assert!(apology.starts_with("Sorry"));
    assert!(apology.contains("Message too long"));
}

#[tokio::test]
async fn stalled_backend_times_out() {
    let mut session = session_with_timeout(Duration::from_millis(50));
    let outcome = session
        .submit(&StalledBackend, "anyone there?", &CancellationToken::new())
        .await;

    assert!(matches!(outcome, Submission::Accepted(_)));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.transcript().len(), 2);
    assert!(session.transcript()[1].text.contains("took too long"));
}

#[tokio::test]
async fn cancellation_returns_to_idle_without_apology() {
    let mut session = session_with_timeout(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    session.submit(&StalledBackend, "question", &cancel).await;

    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.is_typing());
    assert_eq!(session.transcript().len(), 1);
    let banners = session.notifications().banners();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].notification.kind, NotificationKind::Info);
}

#[test]
fn clear_empties_transcript_only_when_idle() {
    let mut session = ChatSession::default();
    session.begin_submit("one");
    assert!(!session.clear());
    assert_eq!(session.transcript().len(), 1);

    session.complete(Err(ChatError::Transport("down".into())));
    assert!(session.clear());
    assert!(session.transcript().is_empty());
    assert_eq!(session.render_transcript(), "");
}

#[test]
fn bot_text_is_escaped_in_transcript() {
    let mut session = ChatSession::default();
    session.begin_submit("q");
    session.complete(Ok(ChatReply {
        response: "<img src=x onerror=alert(1)>".into(),
        timestamp: Some("12:00".into()),
    }));
    let html = session.render_transcript();
    assert!(!html.contains("<img"));
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
}
