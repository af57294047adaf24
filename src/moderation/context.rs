//! Event context - the immutable view of one incoming update.
//!
//! Built once per update by [`ContextResolver`] and then shared read-only by
//! every pipeline stage.

use std::sync::Arc;

use teloxide::types::{
    ChatMemberUpdated, Message, MessageEntityKind, Update, UpdateKind, User,
};
use tokio_util::sync::CancellationToken;

use super::records::ChatRegistry;
use crate::cache::{CacheConfig, TypedCache};
use crate::config::ConfigContext;
use crate::database::UserRecord;
use crate::transport::BotIdentity;
use crate::utils::split_command;

/// Coarse classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Photo,
    Video,
    OtherMedia,
    Service,
    /// Not a message update.
    None,
}

/// A message entity reduced to what moderation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// `@handle`, stored without the `@`.
    Mention { handle: String },
    /// Mention of a user without a handle; the platform embeds the user.
    TextMention { user: UserRecord },
    Other,
}

/// Members joining or leaving, as seen by this update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub joined: Vec<u64>,
    pub left: Option<u64>,
    /// The change arrived as a deletable service message.
    pub service_message: bool,
}

/// Everything a stage may look at for one update.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub chat_id: i64,
    pub chat_title: String,
    pub sender: UserRecord,
    pub bot: BotIdentity,
    /// Message text or media caption, empty otherwise.
    pub text: String,
    pub message_id: Option<i32>,
    pub kind: MessageKind,
    pub entities: Vec<Entity>,
    /// Sender of the message this one replies to.
    pub reply_to: Option<UserRecord>,
    pub membership: MembershipChange,

    pub is_message: bool,
    pub is_text: bool,
    pub is_membership_change: bool,
    pub is_admins_update: bool,
    pub is_command: bool,
    pub is_registered_chat: bool,
    pub is_bot_admin: bool,
    pub is_sender_admin: bool,
    /// First message of the sender in the current poster window.
    pub allow_post: bool,

    pub cancel: CancellationToken,
}

impl EventContext {
    pub fn is_photo_or_video(&self) -> bool {
        matches!(self.kind, MessageKind::Photo | MessageKind::Video)
    }
}

/// Users who already posted in the current window.
///
/// Cleared wholesale by the maintenance tick.
#[derive(Debug, Clone)]
pub struct RecentPosters {
    seen: TypedCache<u64, ()>,
}

impl RecentPosters {
    pub fn new() -> Self {
        Self {
            seen: TypedCache::new("recent_posters", CacheConfig::poster_window()),
        }
    }

    /// Record a post; `true` if it is the user's first in this window.
    pub fn first_post(&self, user_id: u64) -> bool {
        self.seen.insert_if_absent(user_id, ())
    }

    pub fn clear(&self) {
        self.seen.invalidate_all();
    }
}

impl Default for RecentPosters {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns raw updates into [`EventContext`]s.
pub struct ContextResolver {
    config: Arc<ConfigContext>,
    chats: Arc<ChatRegistry>,
    posters: RecentPosters,
}

impl ContextResolver {
    pub fn new(config: Arc<ConfigContext>, chats: Arc<ChatRegistry>, posters: RecentPosters) -> Self {
        Self {
            config,
            chats,
            posters,
        }
    }

    /// Build the context for `update`.
    ///
    /// Returns `None` for update kinds moderation ignores, for non-group
    /// chats and for updates without a sender.
    pub fn resolve(
        &self,
        update: &Update,
        bot: &BotIdentity,
        cancel: CancellationToken,
    ) -> Option<EventContext> {
        let mut ctx = match &update.kind {
            UpdateKind::Message(msg) => self.from_message(msg, bot, cancel)?,
            UpdateKind::ChatMember(change) | UpdateKind::MyChatMember(change) => {
                self.from_member_update(change, bot, cancel)?
            }
            _ => return None,
        };

        ctx.is_registered_chat = self.config.current().settings.is_registered(ctx.chat_id);
        ctx.is_bot_admin = self.chats.is_admin(ctx.chat_id, bot.id);
        ctx.is_sender_admin = self.chats.is_admin(ctx.chat_id, ctx.sender.user_id);
        Some(ctx)
    }

    fn from_message(
        &self,
        msg: &Message,
        bot: &BotIdentity,
        cancel: CancellationToken,
    ) -> Option<EventContext> {
        if !msg.chat.is_group() && !msg.chat.is_supergroup() {
            return None;
        }
        let from = msg.from.as_ref()?;

        let text = msg.text().or_else(|| msg.caption()).unwrap_or_default();
        let kind = classify(msg);

        let mut membership = MembershipChange::default();
        if let Some(members) = msg.new_chat_members() {
            membership.joined = members.iter().map(|u| u.id.0).collect();
        }
        membership.left = msg.left_chat_member().map(|u| u.id.0);
        let is_membership_change = !membership.joined.is_empty() || membership.left.is_some();
        membership.service_message = is_membership_change;

        let entities = msg
            .parse_entities()
            .or_else(|| msg.parse_caption_entities())
            .unwrap_or_default()
            .iter()
            .map(|e| match e.kind() {
                MessageEntityKind::Mention => Entity::Mention {
                    handle: e.text().trim_start_matches('@').to_string(),
                },
                MessageEntityKind::TextMention { user } => Entity::TextMention {
                    user: UserRecord::from_telegram(user),
                },
                _ => Entity::Other,
            })
            .collect();

        let reply_to = msg
            .reply_to_message()
            .and_then(|r| r.from.as_ref())
            .map(UserRecord::from_telegram);

        let is_text = msg.text().is_some();
        let is_command = is_text && split_command(text).is_some();

        Some(EventContext {
            chat_id: msg.chat.id.0,
            chat_title: msg.chat.title().unwrap_or_default().to_string(),
            sender: UserRecord::from_telegram(from),
            bot: bot.clone(),
            text: text.to_string(),
            message_id: Some(msg.id.0),
            kind,
            entities,
            reply_to,
            membership,
            is_message: true,
            is_text,
            is_membership_change,
            is_admins_update: false,
            is_command,
            is_registered_chat: false,
            is_bot_admin: false,
            is_sender_admin: false,
            allow_post: self.posters.first_post(from.id.0),
            cancel,
        })
    }

    fn from_member_update(
        &self,
        change: &ChatMemberUpdated,
        bot: &BotIdentity,
        cancel: CancellationToken,
    ) -> Option<EventContext> {
        if !change.chat.is_group() && !change.chat.is_supergroup() {
            return None;
        }

        let old = &change.old_chat_member.kind;
        let new = &change.new_chat_member.kind;
        let subject: &User = &change.new_chat_member.user;

        let mut membership = MembershipChange::default();
        if !old.is_present() && new.is_present() {
            membership.joined.push(subject.id.0);
        }
        if old.is_present() && !new.is_present() {
            membership.left = Some(subject.id.0);
        }
        let is_membership_change = !membership.joined.is_empty() || membership.left.is_some();

        Some(EventContext {
            chat_id: change.chat.id.0,
            chat_title: change.chat.title().unwrap_or_default().to_string(),
            sender: UserRecord::from_telegram(&change.from),
            bot: bot.clone(),
            text: String::new(),
            message_id: None,
            kind: MessageKind::None,
            entities: Vec::new(),
            reply_to: None,
            membership,
            is_message: false,
            is_text: false,
            is_membership_change,
            is_admins_update: old.is_privileged() != new.is_privileged(),
            is_command: false,
            is_registered_chat: false,
            is_bot_admin: false,
            is_sender_admin: false,
            allow_post: true,
            cancel,
        })
    }
}

fn classify(msg: &Message) -> MessageKind {
    if msg.text().is_some() {
        MessageKind::Text
    } else if msg.photo().is_some() {
        MessageKind::Photo
    } else if msg.video().is_some() {
        MessageKind::Video
    } else if matches!(msg.kind, teloxide::types::MessageKind::Common(_)) {
        MessageKind::OtherMedia
    } else {
        MessageKind::Service
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, Snapshot};
    use crate::transport::fake::BOT_ID;

    fn resolver() -> ContextResolver {
        let settings = Settings {
            registered_chats: vec![-100],
            ..Settings::default()
        };
        let config = Arc::new(ConfigContext::from_snapshot(Snapshot {
            settings,
            ..Snapshot::default()
        }));
        let chats = Arc::new(ChatRegistry::new());
        chats.set_admins(-100, vec![BOT_ID]);
        ContextResolver::new(config, chats, RecentPosters::new())
    }

    fn update(json: &str) -> Update {
        serde_json::from_str(json).unwrap()
    }

    const WARN_COMMAND: &str = r#"{
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1700000000,
            "chat": { "id": -100, "type": "supergroup", "title": "Group" },
            "from": { "id": 1, "is_bot": false, "first_name": "Alice", "username": "alice" },
            "text": "/warn @bob",
            "entities": [
                { "type": "bot_command", "offset": 0, "length": 5 },
                { "type": "mention", "offset": 6, "length": 4 }
            ]
        }
    }"#;

    #[test]
    fn test_resolve_command_message() {
        let resolver = resolver();
        let ctx = resolver
            .resolve(&update(WARN_COMMAND), &testing::bot_identity(), CancellationToken::new())
            .unwrap();

        assert_eq!(ctx.chat_id, -100);
        assert_eq!(ctx.sender.user_id, 1);
        assert_eq!(ctx.message_id, Some(10));
        assert_eq!(ctx.kind, MessageKind::Text);
        assert!(ctx.is_message && ctx.is_text && ctx.is_command);
        assert!(ctx.is_registered_chat);
        assert!(ctx.is_bot_admin);
        assert!(!ctx.is_sender_admin);
        assert_eq!(ctx.entities[0], Entity::Other);
        assert_eq!(
            ctx.entities[1],
            Entity::Mention {
                handle: "bob".into()
            }
        );
    }

    #[test]
    fn test_poster_window() {
        let resolver = resolver();
        let bot = testing::bot_identity();
        let first = resolver.resolve(&update(WARN_COMMAND), &bot, CancellationToken::new()).unwrap();
        let second = resolver.resolve(&update(WARN_COMMAND), &bot, CancellationToken::new()).unwrap();
        assert!(first.allow_post);
        assert!(!second.allow_post);

        resolver.posters.clear();
        let third = resolver.resolve(&update(WARN_COMMAND), &bot, CancellationToken::new()).unwrap();
        assert!(third.allow_post);
    }

    #[test]
    fn test_private_chat_is_ignored() {
        let json = r#"{
            "update_id": 2,
            "message": {
                "message_id": 3,
                "date": 1700000000,
                "chat": { "id": 1, "type": "private", "first_name": "Alice" },
                "from": { "id": 1, "is_bot": false, "first_name": "Alice" },
                "text": "hello"
            }
        }"#;
        assert!(resolver()
            .resolve(&update(json), &testing::bot_identity(), CancellationToken::new())
            .is_none());
    }

    #[test]
    fn test_join_service_message() {
        let json = r#"{
            "update_id": 3,
            "message": {
                "message_id": 4,
                "date": 1700000000,
                "chat": { "id": -100, "type": "supergroup", "title": "Group" },
                "from": { "id": 5, "is_bot": false, "first_name": "Eve" },
                "new_chat_members": [ { "id": 5, "is_bot": false, "first_name": "Eve" } ]
            }
        }"#;
        let ctx = resolver()
            .resolve(&update(json), &testing::bot_identity(), CancellationToken::new())
            .unwrap();
        assert!(ctx.is_membership_change);
        assert!(ctx.membership.service_message);
        assert_eq!(ctx.membership.joined, vec![5]);
        assert_eq!(ctx.kind, MessageKind::Service);
        assert!(!ctx.is_text);
    }
}
