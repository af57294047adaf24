//! Recording transport for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{BotIdentity, SentMessage, Transport, TransportError};
use crate::config::ReplyFormat;

pub const BOT_ID: u64 = 999;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { chat_id: i64, text: String },
    Delete { chat_id: i64, message_id: i32 },
    Ban { chat_id: i64, user_id: u64 },
    Unban { chat_id: i64, user_id: u64 },
    ListAdmins { chat_id: i64 },
}

#[derive(Default)]
pub struct FakeTransport {
    calls: Mutex<Vec<Call>>,
    next_message_id: AtomicI32,
    pub admins: Mutex<HashMap<i64, Vec<u64>>>,
    pub failing_bans: Mutex<HashSet<u64>>,
    pub failing_deletes: Mutex<HashSet<i32>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI32::new(1000),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn bans(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::Ban { .. })).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        _format: ReplyFormat,
    ) -> Result<SentMessage, TransportError> {
        self.record(Call::Send {
            chat_id,
            text: text.to_string(),
        });
        Ok(SentMessage {
            chat_id,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst),
            from_user_id: Some(BOT_ID),
        })
    }

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.record(Call::Delete {
            chat_id,
            message_id,
        });
        if self.failing_deletes.lock().contains(&message_id) {
            return Err(TransportError::Cancelled);
        }
        Ok(())
    }

    async fn ban(
        &self,
        chat_id: i64,
        user_id: u64,
        _until: DateTime<Utc>,
    ) -> Result<(), TransportError> {
        self.record(Call::Ban { chat_id, user_id });
        if self.failing_bans.lock().contains(&user_id) {
            return Err(TransportError::Cancelled);
        }
        Ok(())
    }

    async fn unban(&self, chat_id: i64, user_id: u64) -> Result<(), TransportError> {
        self.record(Call::Unban { chat_id, user_id });
        Ok(())
    }

    async fn list_admins(&self, chat_id: i64) -> Result<Vec<u64>, TransportError> {
        self.record(Call::ListAdmins { chat_id });
        Ok(self.admins.lock().get(&chat_id).cloned().unwrap_or_default())
    }

    async fn get_self(&self) -> Result<BotIdentity, TransportError> {
        Ok(BotIdentity {
            id: BOT_ID,
            first_name: "Warnguard".into(),
            username: Some("warnguard_bot".into()),
        })
    }
}
