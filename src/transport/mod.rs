//! Transport layer - every call the bot makes to the chat platform.
//!
//! The moderation core only talks to the platform through [`Transport`],
//! so stages can be exercised in tests against a recording fake.

mod telegram;

#[cfg(test)]
pub mod fake;

pub use telegram::{TelegramTransport, ThrottledBot};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::ReplyFormat;

/// Transport failures. Callers treat all of them as non-fatal.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),

    #[error("request cancelled by shutdown")]
    Cancelled,
}

/// A message the bot has just sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
    /// Author as reported back by the platform.
    pub from_user_id: Option<u64>,
}

/// The bot's own account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: u64,
    pub first_name: String,
    pub username: Option<String>,
}

/// Outbound operations against the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        format: ReplyFormat,
    ) -> Result<SentMessage, TransportError>;

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;

    async fn ban(
        &self,
        chat_id: i64,
        user_id: u64,
        until: DateTime<Utc>,
    ) -> Result<(), TransportError>;

    async fn unban(&self, chat_id: i64, user_id: u64) -> Result<(), TransportError>;

    async fn list_admins(&self, chat_id: i64) -> Result<Vec<u64>, TransportError>;

    async fn get_self(&self) -> Result<BotIdentity, TransportError>;
}
