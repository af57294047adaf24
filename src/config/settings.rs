//! Moderation settings loaded from the settings JSON file.

use serde::{Deserialize, Serialize};

use super::Captions;

/// How outgoing replies are formatted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyFormat {
    Plain,
    #[default]
    Html,
}

/// Moderation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Warnings that trigger a ban.
    pub max_warnings: u32,

    /// Days until a warned user's restrictions are lifted automatically.
    pub unmute_delay_days: i64,

    /// Minimum interval between two counted warnings for the same user.
    pub warn_cooldown_seconds: i64,

    /// Whether admins can be warned at all.
    pub allow_admin_warnings: bool,

    /// Delete the message that caused a warning (or the warn command itself).
    pub delete_warn_message: bool,

    /// Delete "user joined" / "user left" service messages.
    pub delete_joined_left_message: bool,

    /// Interval of the deferred-deletion sweep.
    pub delete_bot_message_timeout_seconds: u64,

    /// Age after which the bot's own replies are deleted.
    pub message_ttl_seconds: i64,

    /// Interval of the maintenance tick.
    pub update_delay_minutes: u64,

    /// Length of a ban issued at the warning limit.
    pub ban_duration_days: i64,

    pub reply_format: ReplyFormat,

    /// Chat receiving warning notifications.
    pub audit_chat_id: Option<i64>,

    /// Chats the bot moderates.
    pub registered_chats: Vec<i64>,

    pub captions: Captions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_warnings: 3,
            unmute_delay_days: 1,
            warn_cooldown_seconds: 60,
            allow_admin_warnings: false,
            delete_warn_message: true,
            delete_joined_left_message: true,
            delete_bot_message_timeout_seconds: 10,
            message_ttl_seconds: 60,
            update_delay_minutes: 5,
            ban_duration_days: 30,
            reply_format: ReplyFormat::default(),
            audit_chat_id: None,
            registered_chats: Vec::new(),
            captions: Captions::default(),
        }
    }
}

impl Settings {
    /// Check if a chat is registered for moderation.
    pub fn is_registered(&self, chat_id: i64) -> bool {
        self.registered_chats.contains(&chat_id)
    }
}
