//! Join/leave handling.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::pipeline::{Flow, Stage};

pub struct MembershipStage {
    services: Services,
}

impl MembershipStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for MembershipStage {
    fn name(&self) -> &'static str {
        "membership"
    }

    fn applies(&self, ctx: &EventContext) -> bool {
        ctx.is_membership_change
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        let delete_service = self.services.config.current().settings.delete_joined_left_message;
        if ctx.membership.service_message && delete_service && ctx.is_bot_admin {
            self.services.responder.delete_trigger(ctx).await;
        }

        if ctx.membership.joined.contains(&ctx.bot.id) {
            info!("Added to chat {} ({})", ctx.chat_title, ctx.chat_id);
            self.services.chats.observe(ctx.chat_id, &ctx.chat_title);
            if let Err(e) = self.services.refresh_admins(ctx.chat_id).await {
                warn!("Failed to load admins of chat {}: {}", ctx.chat_id, e);
            }
        }

        Ok(Flow::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::moderation::context::MessageKind;
    use crate::moderation::context::testing::{CHAT, message, user};
    use crate::moderation::testing::harness;
    use crate::transport::fake::{BOT_ID, Call};

    fn join(joined: Vec<u64>) -> EventContext {
        let mut ctx = message(user(1, "alice"), "");
        ctx.is_text = false;
        ctx.kind = MessageKind::Service;
        ctx.is_membership_change = true;
        ctx.membership.joined = joined;
        ctx.membership.service_message = true;
        ctx
    }

    #[tokio::test]
    async fn test_service_message_deleted() {
        let h = harness(Settings::default());
        let stage = MembershipStage::new(h.services.clone());

        assert_eq!(stage.handle(&join(vec![1])).await.unwrap(), Flow::Stop);
        assert_eq!(
            h.transport.calls(),
            vec![Call::Delete {
                chat_id: CHAT,
                message_id: 10
            }]
        );
    }

    #[tokio::test]
    async fn test_bot_join_loads_admins() {
        let h = harness(Settings {
            delete_joined_left_message: false,
            ..Settings::default()
        });
        h.services.chats.set_admins(CHAT, Vec::new());
        let stage = MembershipStage::new(h.services.clone());

        stage.handle(&join(vec![BOT_ID])).await.unwrap();
        assert_eq!(h.transport.calls(), vec![Call::ListAdmins { chat_id: CHAT }]);
        assert!(h.services.chats.is_admin(CHAT, BOT_ID));
    }
}
