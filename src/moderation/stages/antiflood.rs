//! One free media message per poster window.
//!
//! A non-admin without the write override may post a single photo or video
//! per window; further media is removed and counts as a warning that never
//! bans on its own.

use async_trait::async_trait;
use tracing::info;

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::gate::Requirement;
use crate::moderation::pipeline::{Flow, Stage};

pub struct AntiFloodStage {
    services: Services,
}

impl AntiFloodStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for AntiFloodStage {
    fn name(&self) -> &'static str {
        "antiflood"
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[
            Requirement::RegisteredChat,
            Requirement::TextOrMedia,
            Requirement::BotAdmin,
        ]
    }

    fn applies(&self, ctx: &EventContext) -> bool {
        !ctx.is_sender_admin
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        if ctx.allow_post || !ctx.is_photo_or_video() {
            return Ok(Flow::Continue);
        }

        let sender = self
            .services
            .users
            .find(ctx.sender.user_id)
            .unwrap_or_else(|| ctx.sender.clone());
        if sender.write_allowed {
            return Ok(Flow::Continue);
        }

        let snapshot = self.services.config.current();
        if snapshot.settings.delete_warn_message {
            self.services.responder.delete_trigger(ctx).await;
        }

        let warned = self.services.warns.resolve_sender(ctx);
        self.services.warns.warn(&warned, &sender, false).await?;
        info!(
            "Extra media from {} in chat {}, warnings {}",
            sender.user_id,
            ctx.chat_id,
            warned.warnings()
        );

        self.services
            .responder
            .reply(ctx, &snapshot.settings.captions.only_one_free_message, Some(&sender))
            .await?;
        Ok(Flow::Stop)
    }
}
