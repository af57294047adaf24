//! Content-matching rules.

use serde::{Deserialize, Serialize};

use crate::utils::match_message;

/// Auto-reply rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Phrases that fire the trigger.
    pub messages: Vec<String>,

    #[serde(default)]
    pub match_whole_message: bool,

    #[serde(default)]
    pub match_case: bool,

    /// Restrict to one chat (None = all registered chats).
    #[serde(default)]
    pub chat: Option<i64>,

    /// Replies, one is picked at random.
    #[serde(default)]
    pub responses: Vec<String>,
}

impl Trigger {
    pub fn applies_to(&self, chat_id: i64) -> bool {
        self.chat.is_none_or(|c| c == chat_id)
    }

    pub fn matches(&self, text: &str) -> bool {
        match_message(&self.messages, self.match_whole_message, self.match_case, text)
    }
}

/// Forbidden-content rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IllegalTrigger {
    pub illegal_words: Vec<String>,

    #[serde(default)]
    pub chat: Option<i64>,

    #[serde(default = "default_true")]
    pub delete_message: bool,

    #[serde(default = "default_true")]
    pub warn_member: bool,

    #[serde(default)]
    pub ignore_admins: bool,
}

fn default_true() -> bool {
    true
}

impl IllegalTrigger {
    pub fn applies_to(&self, chat_id: i64) -> bool {
        self.chat.is_none_or(|c| c == chat_id)
    }

    /// Illegal words always match as case-insensitive substrings.
    pub fn matches(&self, text: &str) -> bool {
        match_message(&self.illegal_words, false, false, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_scope() {
        let trigger: Trigger =
            serde_json::from_str(r#"{ "messages": ["hello"], "chat": -100 }"#).unwrap();
        assert!(trigger.applies_to(-100));
        assert!(!trigger.applies_to(-200));
        assert!(trigger.matches("well HELLO there"));
    }

    #[test]
    fn test_illegal_trigger_defaults() {
        let trigger: IllegalTrigger =
            serde_json::from_str(r#"{ "illegal_words": ["spam.link"] }"#).unwrap();
        assert!(trigger.delete_message);
        assert!(trigger.warn_member);
        assert!(!trigger.ignore_admins);
        assert!(trigger.applies_to(42));
        assert!(trigger.matches("visit SPAM.LINK today"));
    }
}
