//! Warning ledger.
//!
//! Counts live per chat behind a `parking_lot::Mutex`; the lock is only ever
//! held for plain bookkeeping, never across a transport call.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::database::{ChatWarningsDoc, WarnedUser};

/// Warnings of every user in one chat.
#[derive(Debug)]
pub struct ChatWarnings {
    chat_id: i64,
    users: Mutex<Vec<WarnedUser>>,
}

impl ChatWarnings {
    fn new(chat_id: i64, users: Vec<WarnedUser>) -> Self {
        Self {
            chat_id,
            users: Mutex::new(users),
        }
    }

    fn with_user<T>(&self, user_id: u64, f: impl FnOnce(&mut WarnedUser) -> T) -> T {
        let mut users = self.users.lock();
        let idx = match users.iter().position(|u| u.user_id == user_id) {
            Some(idx) => idx,
            None => {
                users.push(WarnedUser::new(user_id));
                users.len() - 1
            }
        };
        f(&mut users[idx])
    }

    fn snapshot(&self) -> ChatWarningsDoc {
        ChatWarningsDoc {
            chat_id: self.chat_id,
            users: self.users.lock().clone(),
        }
    }
}

/// Handle to one user's warning entry in one chat.
#[derive(Debug, Clone)]
pub struct WarnedUserRef {
    chat: Arc<ChatWarnings>,
    user_id: u64,
}

impl WarnedUserRef {
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn chat_id(&self) -> i64 {
        self.chat.chat_id
    }

    pub fn warnings(&self) -> u32 {
        self.chat.with_user(self.user_id, |u| u.warnings)
    }

    /// Count one warning, clamped to `max`, and push the unmute time out.
    pub fn record_warning(&self, now: DateTime<Utc>, max: u32, unmute_delay: Duration) -> u32 {
        self.chat.with_user(self.user_id, |u| {
            u.warnings = (u.warnings + 1).min(max);
            u.unmute_at = Some(now + unmute_delay);
            u.warnings
        })
    }

    /// Remove one warning. Returns the new count.
    pub fn decrement(&self) -> u32 {
        self.chat.with_user(self.user_id, |u| {
            u.warnings = u.warnings.saturating_sub(1);
            u.warnings
        })
    }

    /// Clear all warnings, e.g. after a successful ban.
    pub fn reset(&self) {
        self.chat.with_user(self.user_id, |u| {
            u.warnings = 0;
            u.unmute_at = None;
        });
    }
}

/// Process-wide warning state: counts per chat and warn cool-downs.
#[derive(Debug, Default)]
pub struct WarningLedger {
    chats: DashMap<i64, Arc<ChatWarnings>>,
    cooldowns: DashMap<(i64, u64), DateTime<Utc>>,
}

impl WarningLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the ledger with persisted data.
    pub fn load(&self, docs: Vec<ChatWarningsDoc>) {
        self.chats.clear();
        for doc in docs {
            self.chats
                .insert(doc.chat_id, Arc::new(ChatWarnings::new(doc.chat_id, doc.users)));
        }
    }

    pub fn export(&self) -> Vec<ChatWarningsDoc> {
        self.chats.iter().map(|c| c.snapshot()).collect()
    }

    /// Get-or-create the warnings of a chat.
    pub fn resolve_chat_warning(&self, chat_id: i64) -> Arc<ChatWarnings> {
        self.chats
            .entry(chat_id)
            .or_insert_with(|| Arc::new(ChatWarnings::new(chat_id, Vec::new())))
            .clone()
    }

    /// Get-or-create a user's entry in a chat.
    pub fn resolve_warned_user(&self, user_id: u64, chat: &Arc<ChatWarnings>) -> WarnedUserRef {
        chat.with_user(user_id, |_| ());
        WarnedUserRef {
            chat: Arc::clone(chat),
            user_id,
        }
    }

    /// Look up an entry without creating it.
    pub fn find(&self, chat_id: i64, user_id: u64) -> Option<WarnedUser> {
        let chat = self.chats.get(&chat_id)?;
        let users = chat.users.lock();
        users.iter().find(|u| u.user_id == user_id).cloned()
    }

    pub fn find_count(&self, chat_id: i64, user_id: u64) -> u32 {
        self.find(chat_id, user_id).map_or(0, |u| u.warnings)
    }

    /// Open a new cool-down window unless one is still running.
    ///
    /// Returns `true` if the window was (re)started, i.e. the warning counts.
    pub fn try_start_cooldown(
        &self,
        chat_id: i64,
        user_id: u64,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> bool {
        let mut started = false;
        self.cooldowns
            .entry((chat_id, user_id))
            .and_modify(|expires| {
                if *expires <= now {
                    *expires = now + cooldown;
                    started = true;
                }
            })
            .or_insert_with(|| {
                started = true;
                now + cooldown
            });
        started
    }

    /// Reset every entry whose unmute time has passed.
    ///
    /// Returns the `(chat, user)` pairs that were released.
    pub fn release_expired(&self, now: DateTime<Utc>) -> Vec<(i64, u64)> {
        let mut released = Vec::new();
        for chat in self.chats.iter() {
            let mut users = chat.users.lock();
            for user in users.iter_mut() {
                if user.unmute_at.is_some_and(|at| at <= now) {
                    user.warnings = 0;
                    user.unmute_at = None;
                    released.push((chat.chat_id, user.user_id));
                }
            }
        }
        self.cooldowns.retain(|_, expires| *expires > now);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_is_idempotent() {
        let ledger = WarningLedger::new();
        let a = ledger.resolve_chat_warning(-100);
        let b = ledger.resolve_chat_warning(-100);
        assert!(Arc::ptr_eq(&a, &b));

        let first = ledger.resolve_warned_user(1, &a);
        first.record_warning(Utc::now(), 3, Duration::days(1));
        let second = ledger.resolve_warned_user(1, &b);
        assert_eq!(second.warnings(), 1);
        assert_eq!(a.users.lock().len(), 1);
    }

    #[test]
    fn test_count_stays_in_bounds() {
        let ledger = WarningLedger::new();
        let chat = ledger.resolve_chat_warning(-100);
        let user = ledger.resolve_warned_user(1, &chat);

        assert_eq!(user.decrement(), 0);
        for _ in 0..10 {
            user.record_warning(Utc::now(), 3, Duration::days(1));
        }
        assert_eq!(user.warnings(), 3);
        assert_eq!(user.decrement(), 2);
    }

    #[test]
    fn test_cooldown_window() {
        let ledger = WarningLedger::new();
        let now = Utc::now();
        let window = Duration::seconds(60);

        assert!(ledger.try_start_cooldown(-100, 1, now, window));
        assert!(!ledger.try_start_cooldown(-100, 1, now + Duration::seconds(30), window));
        assert!(ledger.try_start_cooldown(-100, 2, now, window));
        assert!(ledger.try_start_cooldown(-200, 1, now, window));
        assert!(ledger.try_start_cooldown(-100, 1, now + Duration::seconds(60), window));
    }

    #[test]
    fn test_release_expired() {
        let ledger = WarningLedger::new();
        let now = Utc::now();
        let chat = ledger.resolve_chat_warning(-100);
        ledger
            .resolve_warned_user(1, &chat)
            .record_warning(now - Duration::days(2), 3, Duration::days(1));
        ledger
            .resolve_warned_user(2, &chat)
            .record_warning(now, 3, Duration::days(1));

        assert_eq!(ledger.release_expired(now), vec![(-100, 1)]);
        assert_eq!(ledger.find_count(-100, 1), 0);
        assert_eq!(ledger.find_count(-100, 2), 1);
    }

    #[test]
    fn test_export_load() {
        let ledger = WarningLedger::new();
        let chat = ledger.resolve_chat_warning(-100);
        ledger
            .resolve_warned_user(1, &chat)
            .record_warning(Utc::now(), 3, Duration::days(1));

        let restored = WarningLedger::new();
        restored.load(ledger.export());
        assert_eq!(restored.find_count(-100, 1), 1);
        assert_eq!(restored.find_count(-100, 2), 0);
    }
}
