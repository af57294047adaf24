//! Warning ledger models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user warning state within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarnedUser {
    pub user_id: u64,
    /// Active warnings, always within `0..=max_warnings`.
    pub warnings: u32,
    /// When restrictions from these warnings are lifted.
    #[serde(default)]
    pub unmute_at: Option<DateTime<Utc>>,
}

impl WarnedUser {
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id,
            warnings: 0,
            unmute_at: None,
        }
    }
}

/// Warning ledger of one chat as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatWarningsDoc {
    pub chat_id: i64,
    #[serde(default)]
    pub users: Vec<WarnedUser>,
}
