//! User data model.
//!
//! Stores user data from Telegram plus the moderation override flag.

use serde::{Deserialize, Serialize};
use teloxide::types::User;

use crate::utils::full_name;

/// Cached user data from Telegram + internal state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Telegram user ID.
    pub user_id: u64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: Option<String>,
    /// Username without @, as shown by Telegram.
    pub username: Option<String>,
    #[serde(default)]
    pub is_bot: bool,

    /// May post media without counting as flood.
    #[serde(default)]
    pub write_allowed: bool,
}

impl UserRecord {
    /// Create a new UserRecord from a Telegram User.
    pub fn from_telegram(user: &User) -> Self {
        Self {
            user_id: user.id.0,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            is_bot: user.is_bot,
            write_allowed: false,
        }
    }

    /// First and last name joined.
    pub fn display_name(&self) -> String {
        full_name(&self.first_name, self.last_name.as_deref())
    }

    /// Username lowercased for lookups.
    pub fn handle_key(&self) -> Option<String> {
        self.username.as_ref().map(|u| u.to_lowercase())
    }
}
