//! Capability gate - declarative preconditions of pipeline stages.

use super::context::EventContext;

/// A precondition a stage declares on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The chat is in the registered chat set.
    RegisteredChat,
    /// The event is a text, photo or video message.
    TextOrMedia,
    /// The bot is an admin of the chat.
    BotAdmin,
}

impl Requirement {
    pub fn is_met(self, ctx: &EventContext) -> bool {
        match self {
            Self::RegisteredChat => ctx.is_registered_chat,
            Self::TextOrMedia => ctx.is_message && (ctx.is_text || ctx.is_photo_or_video()),
            Self::BotAdmin => ctx.is_bot_admin,
        }
    }
}

/// All requirements hold. An empty set always allows.
pub fn allows(requirements: &[Requirement], ctx: &EventContext) -> bool {
    requirements.iter().all(|r| r.is_met(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::context::MessageKind;
    use crate::moderation::context::testing::{message, user};

    #[test]
    fn test_empty_set_allows() {
        let mut ctx = message(user(1, "alice"), "hi");
        ctx.is_registered_chat = false;
        ctx.is_bot_admin = false;
        assert!(allows(&[], &ctx));
    }

    #[test]
    fn test_conjunction() {
        let all = [
            Requirement::RegisteredChat,
            Requirement::TextOrMedia,
            Requirement::BotAdmin,
        ];
        let mut ctx = message(user(1, "alice"), "hi");
        assert!(allows(&all, &ctx));

        ctx.is_bot_admin = false;
        assert!(!allows(&all, &ctx));
        assert!(allows(&all[..2], &ctx));
    }

    #[test]
    fn test_text_or_media() {
        let mut ctx = message(user(1, "alice"), "");
        ctx.is_text = false;
        ctx.kind = MessageKind::Photo;
        assert!(Requirement::TextOrMedia.is_met(&ctx));

        ctx.kind = MessageKind::OtherMedia;
        assert!(!Requirement::TextOrMedia.is_met(&ctx));

        ctx.kind = MessageKind::None;
        ctx.is_message = false;
        assert!(!Requirement::TextOrMedia.is_met(&ctx));
    }
}
