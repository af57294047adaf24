//! Administrative commands.

use async_trait::async_trait;
use rand::Rng;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::moderation::Services;
use crate::moderation::context::EventContext;
use crate::moderation::gate::Requirement;
use crate::moderation::mention::{MentionFailure, resolve_mention};
use crate::moderation::pipeline::{Flow, Stage};
use crate::moderation::service::{UnwarnOutcome, WarnDirection, WarnOutcome};
use crate::utils::split_command;

/// Commands understood in registered chats.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Moderation commands:")]
pub enum Command {
    #[command(description = "Warn a user (reply or mention)")]
    Warn(String),

    #[command(description = "Remove one warning")]
    Unwarn(String),

    #[command(description = "Show warnings of a user or yourself")]
    Wcount(String),

    #[command(description = "Let a user post media freely")]
    Allow(String),

    #[command(description = "Revoke free posting and clear warnings")]
    Unallow(String),

    #[command(description = "Pick a random line of the message")]
    Random(String),
}

pub struct CommandsStage {
    services: Services,
}

impl CommandsStage {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    async fn warn(&self, ctx: &EventContext) -> anyhow::Result<()> {
        let snapshot = self.services.config.current();
        let settings = &snapshot.settings;
        let captions = &settings.captions;

        let target = match self.services.warns.try_resolve_warned_user(ctx) {
            Ok(target) => target,
            Err(denial) => {
                let caption = denial.caption(captions, WarnDirection::Warn);
                return self.services.responder.reply(ctx, caption, None).await;
            }
        };

        let outcome = self
            .services
            .warns
            .warn(&target.warned, &target.user, !target.is_admin)
            .await?;

        if settings.delete_warn_message {
            self.services.responder.delete_trigger(ctx).await;
        }

        info!(
            "[Admin] {} warned {} in chat {}: {:?}",
            ctx.sender.user_id, target.user.user_id, ctx.chat_id, outcome
        );

        let caption = match outcome {
            WarnOutcome::Banned => &captions.banned_successfully,
            WarnOutcome::NotBanned => &captions.warned_successfully,
            WarnOutcome::BanFailed => &captions.ban_failed,
        };
        self.services
            .responder
            .reply(ctx, caption, Some(&target.user))
            .await
    }

    async fn unwarn(&self, ctx: &EventContext) -> anyhow::Result<()> {
        let snapshot = self.services.config.current();
        let settings = &snapshot.settings;
        let captions = &settings.captions;

        let target = match self.services.warns.try_resolve_warned_user(ctx) {
            Ok(target) => target,
            Err(denial) => {
                let caption = denial.caption(captions, WarnDirection::Unwarn);
                return self.services.responder.reply(ctx, caption, None).await;
            }
        };

        if settings.delete_warn_message {
            self.services.responder.delete_trigger(ctx).await;
        }

        let caption = match self.services.warns.unwarn(&target.warned).await? {
            UnwarnOutcome::NoWarnings => &captions.unwarn_user_no_warnings,
            UnwarnOutcome::Unwarned(left) => {
                info!(
                    "[Admin] {} unwarned {} in chat {}, {} left",
                    ctx.sender.user_id, target.user.user_id, ctx.chat_id, left
                );
                &captions.unwarned_successfully
            }
        };
        self.services
            .responder
            .reply(ctx, caption, Some(&target.user))
            .await
    }

    async fn wcount(&self, ctx: &EventContext) -> anyhow::Result<()> {
        let snapshot = self.services.config.current();
        let settings = &snapshot.settings;
        let captions = &settings.captions;

        let user = match resolve_mention(ctx, &self.services.users) {
            Ok(user) => user,
            Err(MentionFailure::NotMentioned) => ctx.sender.clone(),
            Err(failure) => {
                let caption = match failure {
                    MentionFailure::TargetsAnotherBot => &captions.wcount_bot_attempt,
                    MentionFailure::TargetsThisBot => &captions.wcount_bot_self_attempt,
                    MentionFailure::NotFound | MentionFailure::NotMentioned => {
                        &captions.user_not_found
                    }
                };
                return self.services.responder.reply(ctx, caption, None).await;
            }
        };

        if !settings.allow_admin_warnings && self.services.chats.is_admin(ctx.chat_id, user.user_id) {
            return self
                .services
                .responder
                .reply(ctx, &captions.wcount_admin_attempt, None)
                .await;
        }

        let caption = if self.services.ledger.find_count(ctx.chat_id, user.user_id) == 0 {
            &captions.wcount_no_warnings
        } else {
            &captions.wcount_message
        };
        self.services.responder.reply(ctx, caption, Some(&user)).await
    }

    async fn allow(&self, ctx: &EventContext, allow: bool) -> anyhow::Result<()> {
        let snapshot = self.services.config.current();
        let settings = &snapshot.settings;
        let captions = &settings.captions;

        let target = match self.services.warns.try_resolve_warned_user(ctx) {
            Ok(target) => target,
            Err(denial) => {
                let caption = denial.caption(captions, WarnDirection::Unwarn);
                return self.services.responder.reply(ctx, caption, None).await;
            }
        };

        if settings.delete_warn_message {
            self.services.responder.delete_trigger(ctx).await;
        }

        self.services.warns.allow_write(&target, allow).await?;
        info!(
            "[Admin] {} set free posting of {} in chat {} to {}",
            ctx.sender.user_id, target.user.user_id, ctx.chat_id, allow
        );

        let caption = if allow {
            &captions.allow_write_successfully
        } else {
            &captions.unallow_write_successfully
        };
        self.services
            .responder
            .reply(ctx, caption, Some(&target.user))
            .await
    }

    async fn random(&self, ctx: &EventContext) -> anyhow::Result<()> {
        let lines: Vec<&str> = ctx.text.lines().collect();
        if lines.len() < 2 {
            let snapshot = self.services.config.current();
            return self
                .services
                .responder
                .reply(ctx, &snapshot.settings.captions.invalid_operation, None)
                .await;
        }

        let line = lines[rand::rng().random_range(1..lines.len())];
        self.services.responder.reply_text(ctx, line).await
    }
}

#[async_trait]
impl Stage for CommandsStage {
    fn name(&self) -> &'static str {
        "commands"
    }

    fn requirements(&self) -> &'static [Requirement] {
        &[Requirement::RegisteredChat]
    }

    fn applies(&self, ctx: &EventContext) -> bool {
        ctx.is_command
    }

    async fn handle(&self, ctx: &EventContext) -> anyhow::Result<Flow> {
        let Some((word, args)) = split_command(&ctx.text) else {
            return Ok(Flow::Continue);
        };

        // Re-joined with a space: the derived parser only splits on spaces.
        let normalized = if args.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", word, args)
        };
        let bot_name = ctx.bot.username.as_deref().unwrap_or_default();
        let command = match Command::parse(&normalized, bot_name) {
            Ok(command) => command,
            Err(e) => {
                debug!("Not a moderation command: {}", e);
                return Ok(Flow::Continue);
            }
        };

        match command {
            Command::Warn(_) => self.warn(ctx).await?,
            Command::Unwarn(_) => self.unwarn(ctx).await?,
            Command::Wcount(_) => self.wcount(ctx).await?,
            Command::Allow(_) => self.allow(ctx, true).await?,
            Command::Unallow(_) => self.allow(ctx, false).await?,
            Command::Random(_) => self.random(ctx).await?,
        }
        Ok(Flow::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReplyFormat, Settings};
    use crate::moderation::context::Entity;
    use crate::moderation::context::testing::{CHAT, message, user};
    use crate::moderation::pipeline::DispatchOutcome;
    use crate::moderation::stages::build_pipeline;
    use crate::moderation::testing::{ADMIN, harness};
    use crate::transport::fake::Call;

    fn plain(max_warnings: u32) -> Settings {
        Settings {
            max_warnings,
            warn_cooldown_seconds: 0,
            reply_format: ReplyFormat::Plain,
            ..Settings::default()
        }
    }

    fn admin_reply(text: &str, target: &str, target_id: u64) -> EventContext {
        let mut ctx = message(user(ADMIN, "admin"), text);
        ctx.is_sender_admin = true;
        ctx.entities = vec![Entity::Other];
        ctx.reply_to = Some(user(target_id, target));
        ctx
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/warn @bob", "warnguard_bot").unwrap(),
            Command::Warn("@bob".into())
        );
        assert_eq!(
            Command::parse("/wcount@warnguard_bot", "warnguard_bot").unwrap(),
            Command::Wcount(String::new())
        );
        assert!(Command::parse("/warn@other_bot", "warnguard_bot").is_err());
        assert!(Command::parse("/start", "warnguard_bot").is_err());
    }

    #[tokio::test]
    async fn test_warn_to_ban_end_to_end() {
        let mut h = harness(plain(2));
        let pipeline = build_pipeline(&h.services);

        let outcome = pipeline.dispatch(&admin_reply("/warn", "bob", 2)).await;
        assert_eq!(outcome, DispatchOutcome::Stopped("commands"));
        assert_eq!(h.services.ledger.find_count(CHAT, 2), 1);

        pipeline.dispatch(&admin_reply("/warn", "bob", 2)).await;
        assert_eq!(h.services.ledger.find_count(CHAT, 2), 0);

        let calls = h.transport.calls();
        let deletes = calls
            .iter()
            .filter(|c| matches!(c, Call::Delete { message_id: 10, .. }))
            .count();
        assert_eq!(deletes, 2);
        assert!(calls.contains(&Call::Ban {
            chat_id: CHAT,
            user_id: 2
        }));
        assert_eq!(h.transport.bans(), 1);
        assert_eq!(
            h.transport.sent_texts(),
            vec![
                "@bob has been warned (1/2).".to_string(),
                "@bob reached 2 warnings and has been banned.".to_string(),
            ]
        );
        assert_eq!(h.scheduler.drain_pending(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_is_refused() {
        let h = harness(plain(3));
        let pipeline = build_pipeline(&h.services);

        let mut ctx = admin_reply("/warn", "bob", 2);
        ctx.sender = user(3, "carol");
        ctx.is_sender_admin = false;

        pipeline.dispatch(&ctx).await;
        assert_eq!(h.services.ledger.find_count(CHAT, 2), 0);
        assert_eq!(
            h.transport.sent_texts(),
            vec![Settings::default().captions.user_no_permissions]
        );
    }

    #[tokio::test]
    async fn test_unwarn_and_wcount() {
        let h = harness(plain(3));
        let stage = CommandsStage::new(h.services.clone());

        stage.handle(&admin_reply("/warn", "bob", 2)).await.unwrap();
        stage.handle(&admin_reply("/wcount", "bob", 2)).await.unwrap();
        stage.handle(&admin_reply("/unwarn", "bob", 2)).await.unwrap();
        stage.handle(&admin_reply("/unwarn", "bob", 2)).await.unwrap();
        stage.handle(&admin_reply("/wcount", "bob", 2)).await.unwrap();

        let texts = h.transport.sent_texts();
        assert_eq!(texts[1], "@bob has 1/3 warnings.");
        assert_eq!(texts[2], "Removed a warning from @bob (0/3).");
        assert_eq!(texts[3], "@bob has no warnings.");
        assert_eq!(texts[4], "@bob has no warnings.");
    }

    #[tokio::test]
    async fn test_wcount_defaults_to_sender() {
        let h = harness(plain(3));
        let stage = CommandsStage::new(h.services.clone());

        let ctx = message(user(2, "bob"), "/wcount");
        stage.handle(&ctx).await.unwrap();
        assert_eq!(h.transport.sent_texts(), vec!["@bob has no warnings.".to_string()]);
    }

    #[tokio::test]
    async fn test_random_needs_two_lines() {
        let h = harness(plain(3));
        let stage = CommandsStage::new(h.services.clone());

        stage.handle(&message(user(1, "alice"), "/random")).await.unwrap();
        stage.handle(&message(user(1, "alice"), "/random pick\nonly")).await.unwrap();
        assert_eq!(
            h.transport.sent_texts(),
            vec![Settings::default().captions.invalid_operation, "only".to_string()]
        );
    }

    #[tokio::test]
    async fn test_random_after_newline() {
        let h = harness(plain(3));
        let stage = CommandsStage::new(h.services.clone());

        let flow = stage
            .handle(&message(user(1, "alice"), "/random\nheads\ntails"))
            .await
            .unwrap();
        assert_eq!(flow, Flow::Stop);

        let texts = h.transport.sent_texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0] == "heads" || texts[0] == "tails");
    }

    #[tokio::test]
    async fn test_random_line_is_sent_verbatim() {
        let h = harness(Settings {
            reply_format: ReplyFormat::Html,
            ..plain(3)
        });
        let stage = CommandsStage::new(h.services.clone());

        stage
            .handle(&message(user(1, "alice"), "/random x\n{SenderUser.Id} a<b {a.b}"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent_texts(),
            vec!["{SenderUser.Id} a&lt;b {a.b}".to_string()]
        );
    }

    #[tokio::test]
    async fn test_command_followed_by_newline() {
        let h = harness(plain(3));
        let stage = CommandsStage::new(h.services.clone());

        let flow = stage
            .handle(&admin_reply("/warn\nspamming links", "bob", 2))
            .await
            .unwrap();
        assert_eq!(flow, Flow::Stop);
        assert_eq!(h.services.ledger.find_count(CHAT, 2), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_continues() {
        let h = harness(plain(3));
        let stage = CommandsStage::new(h.services.clone());
        let flow = stage.handle(&message(user(1, "alice"), "/start")).await.unwrap();
        assert_eq!(flow, Flow::Continue);
    }
}
