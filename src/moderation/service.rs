//! Warn/ban state machine.
//!
//! All warning mutations triggered by commands and automatic stages go
//! through [`WarnService`].

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::context::EventContext;
use super::mention::{MentionFailure, resolve_mention};
use super::records::{ChatRegistry, UserRegistry};
use super::responder::Responder;
use super::warnings::{WarnedUserRef, WarningLedger};
use crate::config::{Captions, ConfigContext};
use crate::database::UserRecord;
use crate::transport::Transport;

/// Which caption family a denial is reported with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnDirection {
    Warn,
    Unwarn,
}

/// Why an administrative action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnDenial {
    SenderNotAdmin,
    BotNotAdmin,
    Mention(MentionFailure),
    TargetIsAdmin,
}

impl WarnDenial {
    pub fn caption<'c>(&self, captions: &'c Captions, direction: WarnDirection) -> &'c str {
        let warn = direction == WarnDirection::Warn;
        match self {
            Self::SenderNotAdmin => &captions.user_no_permissions,
            Self::BotNotAdmin => &captions.bot_has_no_permissions,
            Self::Mention(MentionFailure::NotMentioned) => &captions.invalid_operation,
            Self::Mention(MentionFailure::NotFound) => &captions.user_not_found,
            Self::Mention(MentionFailure::TargetsAnotherBot) if warn => &captions.warn_bot_attempt,
            Self::Mention(MentionFailure::TargetsAnotherBot) => &captions.unwarn_bot_attempt,
            Self::Mention(MentionFailure::TargetsThisBot) if warn => &captions.warn_bot_self_attempt,
            Self::Mention(MentionFailure::TargetsThisBot) => &captions.unwarn_bot_self_attempt,
            Self::TargetIsAdmin if warn => &captions.warn_admin_attempt,
            Self::TargetIsAdmin => &captions.unwarn_admin_attempt,
        }
    }
}

/// A resolved subject of a warn-family command.
#[derive(Debug, Clone)]
pub struct WarnTarget {
    pub user: UserRecord,
    pub warned: WarnedUserRef,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarnOutcome {
    NotBanned,
    Banned,
    /// The limit was reached but the ban request failed; the count stays at
    /// the limit so the next warning retries.
    BanFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnwarnOutcome {
    NoWarnings,
    Unwarned(u32),
}

pub struct WarnService {
    config: Arc<ConfigContext>,
    users: Arc<UserRegistry>,
    chats: Arc<ChatRegistry>,
    ledger: Arc<WarningLedger>,
    transport: Arc<dyn Transport>,
    responder: Responder,
}

impl WarnService {
    pub fn new(
        config: Arc<ConfigContext>,
        users: Arc<UserRegistry>,
        chats: Arc<ChatRegistry>,
        ledger: Arc<WarningLedger>,
        transport: Arc<dyn Transport>,
        responder: Responder,
    ) -> Self {
        Self {
            config,
            users,
            chats,
            ledger,
            transport,
            responder,
        }
    }

    /// Check permissions and resolve the command target.
    ///
    /// Order: sender admin, bot admin, mention, admin target.
    pub fn try_resolve_warned_user(&self, ctx: &EventContext) -> Result<WarnTarget, WarnDenial> {
        if !ctx.is_sender_admin {
            return Err(WarnDenial::SenderNotAdmin);
        }
        if !ctx.is_bot_admin {
            return Err(WarnDenial::BotNotAdmin);
        }

        let user = resolve_mention(ctx, &self.users).map_err(WarnDenial::Mention)?;
        let is_admin = self.chats.is_admin(ctx.chat_id, user.user_id);
        if is_admin && !self.config.current().settings.allow_admin_warnings {
            return Err(WarnDenial::TargetIsAdmin);
        }

        let chat = self.ledger.resolve_chat_warning(ctx.chat_id);
        let warned = self.ledger.resolve_warned_user(user.user_id, &chat);
        Ok(WarnTarget {
            user,
            warned,
            is_admin,
        })
    }

    /// The sender's own entry, for automatic warnings.
    pub fn resolve_sender(&self, ctx: &EventContext) -> WarnedUserRef {
        let chat = self.ledger.resolve_chat_warning(ctx.chat_id);
        self.ledger.resolve_warned_user(ctx.sender.user_id, &chat)
    }

    pub async fn warn(
        &self,
        warned: &WarnedUserRef,
        user: &UserRecord,
        should_attempt_ban: bool,
    ) -> Result<WarnOutcome> {
        self.warn_at(warned, user, should_attempt_ban, Utc::now()).await
    }

    /// Count a warning (unless the cool-down is running) and ban at the limit.
    pub async fn warn_at(
        &self,
        warned: &WarnedUserRef,
        user: &UserRecord,
        should_attempt_ban: bool,
        now: DateTime<Utc>,
    ) -> Result<WarnOutcome> {
        let snapshot = self.config.current();
        let settings = &snapshot.settings;
        let max = settings.max_warnings.max(1);
        let chat_id = warned.chat_id();

        let counted = self.ledger.try_start_cooldown(
            chat_id,
            warned.user_id(),
            now,
            Duration::seconds(settings.warn_cooldown_seconds),
        );
        if counted {
            let count =
                warned.record_warning(now, max, Duration::days(settings.unmute_delay_days));
            info!(
                "Warned user {} in chat {}: {}/{}",
                warned.user_id(),
                chat_id,
                count,
                max
            );

            if let Some(caption) = &settings.captions.warn_notification
                && let Err(e) = self.responder.audit(chat_id, caption, user).await
            {
                warn!("Failed to send warn notification: {:#}", e);
            }
        }

        if warned.warnings() < max || !should_attempt_ban {
            return Ok(WarnOutcome::NotBanned);
        }

        let until = now + Duration::days(settings.ban_duration_days);
        match self.transport.ban(chat_id, warned.user_id(), until).await {
            Ok(()) => {
                warned.reset();
                info!("Banned user {} in chat {}", warned.user_id(), chat_id);
                Ok(WarnOutcome::Banned)
            }
            Err(e) => {
                warn!(
                    "Failed to ban user {} in chat {}: {}",
                    warned.user_id(),
                    chat_id,
                    e
                );
                Ok(WarnOutcome::BanFailed)
            }
        }
    }

    /// Remove one warning and lift any ban.
    pub async fn unwarn(&self, warned: &WarnedUserRef) -> Result<UnwarnOutcome> {
        let outcome = if warned.warnings() == 0 {
            UnwarnOutcome::NoWarnings
        } else {
            UnwarnOutcome::Unwarned(warned.decrement())
        };

        self.transport
            .unban(warned.chat_id(), warned.user_id())
            .await?;
        Ok(outcome)
    }

    /// Set the anti-flood override. Revoking it also clears the warnings.
    pub async fn allow_write(&self, target: &WarnTarget, allow: bool) -> Result<()> {
        self.users.observe(&target.user);
        self.users.set_write_allowed(target.user.user_id, allow);
        if !allow {
            target.warned.reset();
        }

        self.transport
            .unban(target.warned.chat_id(), target.user.user_id)
            .await?;
        Ok(())
    }

    /// Reset and unban everyone whose restriction period is over.
    pub async fn release_expired(&self, now: DateTime<Utc>) -> usize {
        let released = self.ledger.release_expired(now);
        for &(chat_id, user_id) in &released {
            if let Err(e) = self.transport.unban(chat_id, user_id).await {
                warn!("Failed to unban user {} in chat {}: {}", user_id, chat_id, e);
            }
        }
        released.len()
    }
}
