//! Outbound replies.
//!
//! Every user-visible message goes through [`Responder`]: captions are
//! rendered, sent in the configured format and queued for deletion.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use super::cleanup::DeleteQueueHandle;
use super::context::EventContext;
use super::template::{self, Subject, TemplateVars};
use super::warnings::WarningLedger;
use crate::config::{ConfigContext, ReplyFormat};
use crate::database::UserRecord;
use crate::transport::Transport;
use crate::utils::html_escape;

#[derive(Clone)]
pub struct Responder {
    transport: Arc<dyn Transport>,
    config: Arc<ConfigContext>,
    ledger: Arc<WarningLedger>,
    deletions: DeleteQueueHandle,
}

impl Responder {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<ConfigContext>,
        ledger: Arc<WarningLedger>,
        deletions: DeleteQueueHandle,
    ) -> Self {
        Self {
            transport,
            config,
            ledger,
            deletions,
        }
    }

    /// Render `caption` for this event and send it to the chat.
    ///
    /// Empty captions are not sent.
    pub async fn reply(
        &self,
        ctx: &EventContext,
        caption: &str,
        mentioned: Option<&UserRecord>,
    ) -> Result<()> {
        let text = self.render(ctx.chat_id, caption, Some(&ctx.sender), mentioned);
        let format = self.config.current().settings.reply_format;
        self.send(ctx.chat_id, &text, format).await
    }

    /// Send user-written `text` as is. No placeholders are expanded; in
    /// HTML mode the text is escaped.
    pub async fn reply_text(&self, ctx: &EventContext, text: &str) -> Result<()> {
        let format = self.config.current().settings.reply_format;
        let text = match format {
            ReplyFormat::Html => html_escape(text),
            ReplyFormat::Plain => text.to_string(),
        };
        self.send(ctx.chat_id, &text, format).await
    }

    async fn send(&self, chat_id: i64, text: &str, format: ReplyFormat) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let sent = self.transport.send(chat_id, text, format).await?;
        if self.deletions.mark_on_delete(&sent) {
            debug!("Reply {} in chat {} queued for deletion", sent.message_id, sent.chat_id);
        }
        Ok(())
    }

    /// Delete the message that caused this event. Failures are logged only.
    pub async fn delete_trigger(&self, ctx: &EventContext) {
        let Some(message_id) = ctx.message_id else {
            return;
        };
        if let Err(e) = self.transport.delete(ctx.chat_id, message_id).await {
            warn!(
                "Failed to delete message {} in chat {}: {}",
                message_id, ctx.chat_id, e
            );
        }
    }

    /// Render `caption` and post it to the audit chat, if one is configured.
    pub async fn audit(&self, chat_id: i64, caption: &str, user: &UserRecord) -> Result<()> {
        let snapshot = self.config.current();
        let Some(audit_chat) = snapshot.settings.audit_chat_id else {
            return Ok(());
        };

        let text = self.render(chat_id, caption, None, Some(user));
        self.transport
            .send(audit_chat, &text, snapshot.settings.reply_format)
            .await?;
        Ok(())
    }

    fn render(
        &self,
        chat_id: i64,
        caption: &str,
        sender: Option<&UserRecord>,
        mentioned: Option<&UserRecord>,
    ) -> String {
        let snapshot = self.config.current();
        let vars = TemplateVars {
            sender: sender.map(|u| self.subject(chat_id, u)),
            mentioned: mentioned.map(|u| self.subject(chat_id, u)),
            settings: &snapshot.settings,
        };

        template::render(caption, &vars, snapshot.settings.reply_format)
    }

    fn subject<'u>(&self, chat_id: i64, user: &'u UserRecord) -> Subject<'u> {
        let entry = self.ledger.find(chat_id, user.user_id);
        Subject::new(user)
            .with_warnings(entry.as_ref().map_or(0, |e| e.warnings))
            .with_unmute_at(entry.and_then(|e| e.unmute_at))
    }
}
