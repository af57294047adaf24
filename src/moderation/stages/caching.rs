//! Keeps the user and chat records current.

use async_trait::async_trait;

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::pipeline::{Flow, Stage};

pub struct CachingStage {
    services: Services,
}

impl CachingStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for CachingStage {
    fn name(&self) -> &'static str {
        "caching"
    }

    fn applies(&self, ctx: &EventContext) -> bool {
        ctx.is_message
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        self.services.users.observe(&ctx.sender);
        if let Some(replied) = &ctx.reply_to {
            self.services.users.observe(replied);
        }
        self.services.chats.observe(ctx.chat_id, &ctx.chat_title);
        Ok(Flow::Continue)
    }
}
