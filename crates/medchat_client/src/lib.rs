//! MedChat client library (config, HTTP wire messages, backend calls).
//! Used by the chat widget and the `medchat` CLI.

pub mod client;
pub mod config;
pub mod error;
pub mod messages;

pub use client::Client;
pub use config::{default_config_path, ChatSection, Config, ConfigError, ServerSection};
pub use error::{ChatError, InvalidMessage};
pub use messages::{
    validate_outgoing, ChatReply, DatabaseStats, HealthReport, ReprocessReply, MAX_MESSAGE_CHARS,
};
