//! Forbidden content.

use async_trait::async_trait;
use tracing::info;

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::gate::Requirement;
use crate::moderation::pipeline::{Flow, Stage};
use crate::moderation::service::WarnOutcome;
use crate::utils::truncate;

pub struct IllegalTriggersStage {
    services: Services,
}

impl IllegalTriggersStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }
}

#[async_trait]
impl Stage for IllegalTriggersStage {
    fn name(&self) -> &'static str {
        "illegal_triggers"
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[
            Requirement::RegisteredChat,
            Requirement::TextOrMedia,
            Requirement::BotAdmin,
        ]
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        let snapshot = self.services.config.current();
        let settings = &snapshot.settings;

        let Some(trigger) = snapshot.illegal_triggers.iter().find(|t| {
            !(t.ignore_admins && ctx.is_sender_admin) && t.applies_to(ctx.chat_id) && t.matches(&ctx.text)
        }) else {
            return Ok(Flow::Continue);
        };

        info!(
            "Message \"{}\" from {} in chat {} triggered an illegal trigger",
            truncate(&ctx.text, 50),
            ctx.sender.user_id,
            ctx.chat_id
        );

        if trigger.delete_message {
            self.services.responder.delete_trigger(ctx).await;
        }

        if !trigger.warn_member || (ctx.is_sender_admin && !settings.allow_admin_warnings) {
            return Ok(Flow::Continue);
        }

        let warned = self.services.warns.resolve_sender(ctx);
        let outcome = self
            .services
            .warns
            .warn(&warned, &ctx.sender, !ctx.is_sender_admin)
            .await?;

        let caption = match outcome {
            WarnOutcome::Banned => &settings.captions.illegal_trigger_banned,
            WarnOutcome::NotBanned | WarnOutcome::BanFailed => &settings.captions.illegal_trigger_warned,
        };
        self.services
            .responder
            .reply(ctx, caption, Some(&ctx.sender))
            .await?;
        Ok(Flow::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IllegalTrigger, Settings, Snapshot};
    use crate::moderation::context::testing::{CHAT, message, user};
    use crate::moderation::testing::{ADMIN, Harness, harness_with};
    use crate::transport::fake::Call;

    fn setup(trigger: IllegalTrigger, max_warnings: u32) -> Harness {
        harness_with(Snapshot {
            settings: Settings {
                max_warnings,
                reply_format: crate::config::ReplyFormat::Plain,
                ..Settings::default()
            },
            triggers: Vec::new(),
            illegal_triggers: vec![trigger],
        })
    }

    fn spam_trigger() -> IllegalTrigger {
        IllegalTrigger {
            illegal_words: vec!["casino".into()],
            chat: None,
            delete_message: true,
            warn_member: true,
            ignore_admins: false,
        }
    }

    #[tokio::test]
    async fn test_match_deletes_warns_and_stops() {
        let h = setup(spam_trigger(), 3);
        let stage = IllegalTriggersStage::new(h.services.clone());

        let flow = stage.handle(&message(user(2, "bob"), "best CASINO online")).await.unwrap();
        assert_eq!(flow, Flow::Stop);
        assert_eq!(h.services.ledger.find_count(CHAT, 2), 1);
        assert!(h.transport.calls().contains(&Call::Delete {
            chat_id: CHAT,
            message_id: 10
        }));
        assert_eq!(
            h.transport.sent_texts(),
            vec!["@bob posted forbidden content and was warned (1/3).".to_string()]
        );
    }

    #[tokio::test]
    async fn test_ban_at_limit() {
        let h = setup(spam_trigger(), 1);
        let stage = IllegalTriggersStage::new(h.services.clone());

        stage.handle(&message(user(2, "bob"), "casino")).await.unwrap();
        assert_eq!(h.transport.bans(), 1);
        assert_eq!(
            h.transport.sent_texts(),
            vec!["@bob posted forbidden content and has been banned.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_admin_sender() {
        let h = setup(spam_trigger(), 3);
        let stage = IllegalTriggersStage::new(h.services.clone());
        let mut ctx = message(user(ADMIN, "admin"), "casino");
        ctx.is_sender_admin = true;

        // Deleted but not warned.
        assert_eq!(stage.handle(&ctx).await.unwrap(), Flow::Continue);
        assert_eq!(h.services.ledger.find_count(CHAT, ADMIN), 0);
        assert_eq!(h.transport.calls().len(), 1);

        let h = setup(
            IllegalTrigger {
                ignore_admins: true,
                ..spam_trigger()
            },
            3,
        );
        let stage = IllegalTriggersStage::new(h.services.clone());
        assert_eq!(stage.handle(&ctx).await.unwrap(), Flow::Continue);
        assert!(h.transport.calls().is_empty());
    }
}
