//! Caption templates for every user-visible reply.
//!
//! Captions are rendered by [`crate::moderation::template`], so they may use
//! `{SenderUser.*}`, `{MentionedUser.*}` and `{Config.*}` placeholders.

use serde::{Deserialize, Serialize};

/// All reply templates. Missing keys in the settings file fall back to the
/// defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Captions {
    pub user_no_permissions: String,
    pub bot_has_no_permissions: String,
    pub invalid_operation: String,
    pub user_not_found: String,

    pub warn_bot_attempt: String,
    pub warn_bot_self_attempt: String,
    pub warn_admin_attempt: String,
    pub unwarn_bot_attempt: String,
    pub unwarn_bot_self_attempt: String,
    pub unwarn_admin_attempt: String,

    pub warned_successfully: String,
    pub banned_successfully: String,
    pub ban_failed: String,
    pub unwarned_successfully: String,
    pub unwarn_user_no_warnings: String,

    pub allow_write_successfully: String,
    pub unallow_write_successfully: String,

    pub wcount_bot_attempt: String,
    pub wcount_bot_self_attempt: String,
    pub wcount_admin_attempt: String,
    pub wcount_no_warnings: String,
    pub wcount_message: String,

    pub illegal_trigger_warned: String,
    pub illegal_trigger_banned: String,
    pub only_one_free_message: String,

    /// Sent to the audit chat whenever a warning is counted.
    pub warn_notification: Option<String>,
}

impl Default for Captions {
    fn default() -> Self {
        Self {
            user_no_permissions: "You don't have permission to do that.".into(),
            bot_has_no_permissions: "I need admin rights in this chat to do that.".into(),
            invalid_operation: "Reply to a message or mention a user.".into(),
            user_not_found: "I don't know this user yet.".into(),

            warn_bot_attempt: "I don't warn other bots.".into(),
            warn_bot_self_attempt: "I'm not going to warn myself.".into(),
            warn_admin_attempt: "Admins can't be warned.".into(),
            unwarn_bot_attempt: "Bots don't have warnings.".into(),
            unwarn_bot_self_attempt: "I don't have any warnings.".into(),
            unwarn_admin_attempt: "Admins don't have warnings.".into(),

            warned_successfully:
                "{MentionedUser.Mention} has been warned ({MentionedUser.Warnings}/{Config.MaxWarnings})."
                    .into(),
            banned_successfully:
                "{MentionedUser.Mention} reached {Config.MaxWarnings} warnings and has been banned."
                    .into(),
            ban_failed: "{MentionedUser.Mention} reached the warning limit, but I couldn't ban them."
                .into(),
            unwarned_successfully:
                "Removed a warning from {MentionedUser.Mention} ({MentionedUser.Warnings}/{Config.MaxWarnings})."
                    .into(),
            unwarn_user_no_warnings: "{MentionedUser.Mention} has no warnings.".into(),

            allow_write_successfully: "{MentionedUser.Mention} may now post freely.".into(),
            unallow_write_successfully: "{MentionedUser.Mention} no longer posts freely.".into(),

            wcount_bot_attempt: "Bots don't have warnings.".into(),
            wcount_bot_self_attempt: "I don't have any warnings.".into(),
            wcount_admin_attempt: "Admins don't have warnings.".into(),
            wcount_no_warnings: "{MentionedUser.Mention} has no warnings.".into(),
            wcount_message:
                "{MentionedUser.Mention} has {MentionedUser.Warnings}/{Config.MaxWarnings} warnings."
                    .into(),

            illegal_trigger_warned:
                "{MentionedUser.Mention} posted forbidden content and was warned ({MentionedUser.Warnings}/{Config.MaxWarnings})."
                    .into(),
            illegal_trigger_banned:
                "{MentionedUser.Mention} posted forbidden content and has been banned.".into(),
            only_one_free_message:
                "{MentionedUser.Mention}, only one media message per window is allowed.".into(),

            warn_notification: None,
        }
    }
}
