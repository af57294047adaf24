//! In-memory chat and user records.
//!
//! Both registries are process-wide and shared between the pipeline, the
//! maintenance tick and persistence. All access goes through the methods
//! below so get-or-create stays race-free.

use dashmap::DashMap;
use tracing::debug;

use crate::database::{ChatRecord, UserRecord};

/// Users seen by the bot, indexed by id and by lowercased handle.
#[derive(Debug, Default)]
pub struct UserRegistry {
    by_id: DashMap<u64, UserRecord>,
    by_handle: DashMap<String, u64>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry contents with persisted records.
    pub fn load(&self, users: Vec<UserRecord>) {
        self.by_id.clear();
        self.by_handle.clear();
        for user in users {
            if let Some(handle) = user.handle_key() {
                self.by_handle.insert(handle, user.user_id);
            }
            self.by_id.insert(user.user_id, user);
        }
    }

    /// Upsert profile data from a fresh sighting.
    ///
    /// The `write_allowed` override is internal state and survives the update.
    pub fn observe(&self, seen: &UserRecord) -> UserRecord {
        let mut entry = self
            .by_id
            .entry(seen.user_id)
            .or_insert_with(|| seen.clone());

        let old_handle = entry.handle_key();
        entry.first_name.clone_from(&seen.first_name);
        entry.last_name.clone_from(&seen.last_name);
        entry.username.clone_from(&seen.username);
        entry.is_bot = seen.is_bot;
        let record = entry.clone();
        drop(entry);

        let new_handle = record.handle_key();
        if old_handle != new_handle {
            if let Some(old) = old_handle {
                self.by_handle.remove_if(&old, |_, id| *id == record.user_id);
            }
            debug!("User {} handle is now {:?}", record.user_id, record.username);
        }
        if let Some(handle) = new_handle {
            self.by_handle.insert(handle, record.user_id);
        }

        record
    }

    pub fn find(&self, user_id: u64) -> Option<UserRecord> {
        self.by_id.get(&user_id).map(|u| u.clone())
    }

    /// Look up a user by `@handle` or `handle`, case-insensitively.
    pub fn find_by_handle(&self, handle: &str) -> Option<UserRecord> {
        let key = handle.trim_start_matches('@').to_lowercase();
        let id = *self.by_handle.get(&key)?;
        self.find(id)
    }

    /// Set the anti-flood override. Unknown users are ignored.
    pub fn set_write_allowed(&self, user_id: u64, allowed: bool) -> bool {
        match self.by_id.get_mut(&user_id) {
            Some(mut user) => {
                user.write_allowed = allowed;
                true
            }
            None => false,
        }
    }

    pub fn all(&self) -> Vec<UserRecord> {
        self.by_id.iter().map(|u| u.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// Chats seen by the bot, with their cached admin sets.
#[derive(Debug, Default)]
pub struct ChatRegistry {
    chats: DashMap<i64, ChatRecord>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, chats: Vec<ChatRecord>) {
        self.chats.clear();
        for chat in chats {
            self.chats.insert(chat.chat_id, chat);
        }
    }

    /// Get-or-create the chat and refresh its title.
    pub fn observe(&self, chat_id: i64, title: &str) {
        self.chats
            .entry(chat_id)
            .and_modify(|c| c.title = title.to_string())
            .or_insert_with(|| ChatRecord::new(chat_id, title));
    }

    pub fn set_admins(&self, chat_id: i64, admins: Vec<u64>) {
        self.chats
            .entry(chat_id)
            .or_insert_with(|| ChatRecord::new(chat_id, ""))
            .admins = admins;
    }

    pub fn is_admin(&self, chat_id: i64, user_id: u64) -> bool {
        self.chats
            .get(&chat_id)
            .is_some_and(|c| c.is_admin(user_id))
    }

    #[cfg(test)]
    pub fn find(&self, chat_id: i64) -> Option<ChatRecord> {
        self.chats.get(&chat_id).map(|c| c.clone())
    }

    pub fn ids(&self) -> Vec<i64> {
        self.chats.iter().map(|c| *c.key()).collect()
    }

    pub fn all(&self) -> Vec<ChatRecord> {
        self.chats.iter().map(|c| c.value().clone()).collect()
    }
}
