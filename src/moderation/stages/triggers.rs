//! Auto-replies.

use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::gate::Requirement;
use crate::moderation::pipeline::{Flow, Stage};
use crate::utils::truncate;

pub struct TriggersStage {
    services: Services,
}

impl TriggersStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for TriggersStage {
    fn name(&self) -> &'static str {
        "triggers"
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[Requirement::RegisteredChat, Requirement::TextOrMedia]
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        let snapshot = self.services.config.current();
        let Some(trigger) = snapshot
            .triggers
            .iter()
            .find(|t| t.applies_to(ctx.chat_id) && t.matches(&ctx.text))
        else {
            return Ok(Flow::Continue);
        };

        if trigger.responses.is_empty() {
            return Ok(Flow::Continue);
        }

        let response = &trigger.responses[rand::rng().random_range(0..trigger.responses.len())];
        info!(
            "Message \"{}\" from {} in chat {} triggered a reply",
            truncate(&ctx.text, 50),
            ctx.sender.user_id,
            ctx.chat_id
        );
        self.services.responder.reply(ctx, response, None).await?;
        Ok(Flow::Continue)
    }
}
