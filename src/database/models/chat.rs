//! Chat data model.

use serde::{Deserialize, Serialize};

/// A group the bot has seen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Telegram chat ID.
    pub chat_id: i64,
    /// Chat title.
    pub title: String,
    /// Admin user IDs, refreshed from Telegram periodically.
    #[serde(default)]
    pub admins: Vec<u64>,
}

impl ChatRecord {
    pub fn new(chat_id: i64, title: impl Into<String>) -> Self {
        Self {
            chat_id,
            title: title.into(),
            admins: Vec::new(),
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admins.contains(&user_id)
    }
}
