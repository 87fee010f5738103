//! MedChat widget core: renders chat text as HTML, manages notification
//! banners, and runs the conversation state machine over the HTTP client.

pub mod format;
pub mod notify;
pub mod session;
pub mod widget;

pub use format::{escape_html, format_message};
pub use notify::{darken, Notification, NotificationCenter, NotificationKind, Phase, Rgb};
pub use session::{ChatBackend, ChatMessage, ChatSession, Sender, SessionSettings, SessionState, Submission};
pub use widget::{ChatWidget, WidgetView};
