//! Resolves who an administrative command is aimed at.

use super::context::{Entity, EventContext};
use super::records::UserRegistry;
use crate::database::UserRecord;

/// Why no target could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionFailure {
    NotMentioned,
    /// Mentioned by handle, but the bot has never seen that user.
    NotFound,
    TargetsThisBot,
    TargetsAnotherBot,
}

/// Find the target user of a command.
///
/// The command itself is the first entity, so an explicit mention is the
/// second one. Without entities beyond the command, the sender of the
/// replied-to message is the target.
pub fn resolve_mention(
    ctx: &EventContext,
    users: &UserRegistry,
) -> Result<UserRecord, MentionFailure> {
    let target = match ctx.entities.get(1) {
        Some(Entity::Mention { handle }) => {
            users.find_by_handle(handle).ok_or(MentionFailure::NotFound)?
        }
        Some(Entity::TextMention { user }) => {
            users.find(user.user_id).unwrap_or_else(|| user.clone())
        }
        Some(Entity::Other) => return Err(MentionFailure::NotMentioned),
        None => {
            let replied = ctx.reply_to.as_ref().ok_or(MentionFailure::NotMentioned)?;
            users.find(replied.user_id).unwrap_or_else(|| replied.clone())
        }
    };

    if target.user_id == ctx.bot.id {
        return Err(MentionFailure::TargetsThisBot);
    }
    if target.is_bot {
        return Err(MentionFailure::TargetsAnotherBot);
    }
    Ok(target)
}
