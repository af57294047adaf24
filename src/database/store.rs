//! Persistence of the in-memory moderation state.
//!
//! Everything is loaded once at startup and written back by the maintenance
//! tick and on shutdown. Documents are upserted by their natural key.

use anyhow::Result;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Document, doc};
use mongodb::options::ReplaceOptions;
use serde::Serialize;
use tracing::debug;

use super::Database;
use super::models::{ChatRecord, ChatWarningsDoc, UserRecord};

/// Load/save interface over the three record kinds.
#[async_trait]
pub trait Store: Send + Sync {
    async fn load_chats(&self) -> Result<Vec<ChatRecord>>;
    async fn load_users(&self) -> Result<Vec<UserRecord>>;
    async fn load_warnings(&self) -> Result<Vec<ChatWarningsDoc>>;

    async fn save_chats(&self, chats: &[ChatRecord]) -> Result<()>;
    async fn save_users(&self, users: &[UserRecord]) -> Result<()>;
    async fn save_warnings(&self, warnings: &[ChatWarningsDoc]) -> Result<()>;
}

/// MongoDB-backed store with `chats`, `users` and `warnings` collections.
pub struct MongoStore {
    chats: Collection<ChatRecord>,
    users: Collection<UserRecord>,
    warnings: Collection<ChatWarningsDoc>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            chats: db.collection("chats"),
            users: db.collection("users"),
            warnings: db.collection("warnings"),
        }
    }
}

async fn upsert<T>(collection: &Collection<T>, filter: Document, value: &T) -> Result<()>
where
    T: Serialize + Send + Sync,
{
    let options = ReplaceOptions::builder().upsert(true).build();
    collection
        .replace_one(filter, value)
        .with_options(options)
        .await?;
    Ok(())
}

#[async_trait]
impl Store for MongoStore {
    async fn load_chats(&self) -> Result<Vec<ChatRecord>> {
        Ok(self.chats.find(doc! {}).await?.try_collect().await?)
    }

    async fn load_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.users.find(doc! {}).await?.try_collect().await?)
    }

    async fn load_warnings(&self) -> Result<Vec<ChatWarningsDoc>> {
        Ok(self.warnings.find(doc! {}).await?.try_collect().await?)
    }

    async fn save_chats(&self, chats: &[ChatRecord]) -> Result<()> {
        for chat in chats {
            upsert(&self.chats, doc! { "chat_id": chat.chat_id }, chat).await?;
        }
        debug!("Saved {} chats", chats.len());
        Ok(())
    }

    async fn save_users(&self, users: &[UserRecord]) -> Result<()> {
        for user in users {
            upsert(&self.users, doc! { "user_id": user.user_id as i64 }, user).await?;
        }
        debug!("Saved {} users", users.len());
        Ok(())
    }

    async fn save_warnings(&self, warnings: &[ChatWarningsDoc]) -> Result<()> {
        for chat in warnings {
            upsert(&self.warnings, doc! { "chat_id": chat.chat_id }, chat).await?;
        }
        debug!("Saved warnings of {} chats", warnings.len());
        Ok(())
    }
}

/// In-memory store used by tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub chats: parking_lot::Mutex<Vec<ChatRecord>>,
    pub users: parking_lot::Mutex<Vec<UserRecord>>,
    pub warnings: parking_lot::Mutex<Vec<ChatWarningsDoc>>,
}

#[cfg(test)]
#[async_trait]
impl Store for MemoryStore {
    async fn load_chats(&self) -> Result<Vec<ChatRecord>> {
        Ok(self.chats.lock().clone())
    }

    async fn load_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.users.lock().clone())
    }

    async fn load_warnings(&self) -> Result<Vec<ChatWarningsDoc>> {
        Ok(self.warnings.lock().clone())
    }

    async fn save_chats(&self, chats: &[ChatRecord]) -> Result<()> {
        *self.chats.lock() = chats.to_vec();
        Ok(())
    }

    async fn save_users(&self, users: &[UserRecord]) -> Result<()> {
        *self.users.lock() = users.to_vec();
        Ok(())
    }

    async fn save_warnings(&self, warnings: &[ChatWarningsDoc]) -> Result<()> {
        *self.warnings.lock() = warnings.to_vec();
        Ok(())
    }
}
