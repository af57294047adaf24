//! Admin set refresh on promotion/demotion.

use async_trait::async_trait;

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::pipeline::{Flow, Stage};

pub struct AdminsStage {
    services: Services,
}

impl AdminsStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for AdminsStage {
    fn name(&self) -> &'static str {
        "admins"
    }

    fn applies(&self, ctx: &EventContext) -> bool {
        ctx.is_admins_update
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        self.services.refresh_admins(ctx.chat_id).await?;
        Ok(Flow::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::moderation::context::testing::{CHAT, message, user};
    use crate::moderation::pipeline::DispatchOutcome;
    use crate::moderation::stages::build_pipeline;
    use crate::moderation::testing::harness;
    use crate::transport::fake::Call;

    #[tokio::test]
    async fn test_promotion_refreshes_and_stops() {
        let h = harness(Settings::default());
        h.transport.admins.lock().get_mut(&CHAT).unwrap().push(7);

        let mut ctx = message(user(1, "alice"), "");
        ctx.is_message = false;
        ctx.is_text = false;
        ctx.is_admins_update = true;

        let outcome = build_pipeline(&h.services).dispatch(&ctx).await;
        assert_eq!(outcome, DispatchOutcome::Stopped("admins"));
        assert!(h.services.chats.is_admin(CHAT, 7));
        assert_eq!(h.transport.calls(), vec![Call::ListAdmins { chat_id: CHAT }]);
    }
}
