//! Teloxide-backed transport.

use std::future::IntoFuture;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::adaptors::Throttle;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};
use tokio_util::sync::CancellationToken;

use super::{BotIdentity, SentMessage, Transport, TransportError};
use crate::config::ReplyFormat;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// [`Transport`] over the Telegram Bot API.
///
/// Every request is raced against the shutdown token and aborted with
/// [`TransportError::Cancelled`] once it fires.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: ThrottledBot,
    shutdown: CancellationToken,
}

impl TelegramTransport {
    pub fn new(bot: ThrottledBot, shutdown: CancellationToken) -> Self {
        Self { bot, shutdown }
    }

    async fn call<F, T>(&self, request: F) -> Result<T, TransportError>
    where
        F: IntoFuture<Output = Result<T, teloxide::RequestError>>,
    {
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(TransportError::Cancelled),
            result = request.into_future() => result.map_err(TransportError::from),
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        format: ReplyFormat,
    ) -> Result<SentMessage, TransportError> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if format == ReplyFormat::Html {
            request = request.parse_mode(ParseMode::Html);
        }

        let message = self.call(request).await?;
        Ok(SentMessage {
            chat_id: message.chat.id.0,
            message_id: message.id.0,
            from_user_id: message.from.as_ref().map(|u| u.id.0),
        })
    }

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.call(self.bot.delete_message(ChatId(chat_id), MessageId(message_id)))
            .await?;
        Ok(())
    }

    async fn ban(
        &self,
        chat_id: i64,
        user_id: u64,
        until: DateTime<Utc>,
    ) -> Result<(), TransportError> {
        self.call(
            self.bot
                .ban_chat_member(ChatId(chat_id), UserId(user_id))
                .until_date(until),
        )
        .await?;
        Ok(())
    }

    async fn unban(&self, chat_id: i64, user_id: u64) -> Result<(), TransportError> {
        self.call(
            self.bot
                .unban_chat_member(ChatId(chat_id), UserId(user_id))
                .only_if_banned(true),
        )
        .await?;
        Ok(())
    }

    async fn list_admins(&self, chat_id: i64) -> Result<Vec<u64>, TransportError> {
        let members = self
            .call(self.bot.get_chat_administrators(ChatId(chat_id)))
            .await?;
        Ok(members.iter().map(|m| m.user.id.0).collect())
    }

    async fn get_self(&self) -> Result<BotIdentity, TransportError> {
        let me = self.call(self.bot.get_me()).await?;
        Ok(BotIdentity {
            id: me.user.id.0,
            first_name: me.user.first_name.clone(),
            username: me.user.username.clone(),
        })
    }
}
