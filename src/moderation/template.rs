//! Caption rendering.
//!
//! Captions contain `{Scope.Field}` placeholders. Scopes are `SenderUser`,
//! `MentionedUser` and `Config`; both scope and field are matched
//! case-insensitively. Unknown placeholders render as an empty string.

use chrono::{DateTime, Utc};

use crate::config::{ReplyFormat, Settings};
use crate::database::UserRecord;
use crate::utils::html_escape;

/// A user referenced by a caption, with their warning state in the chat.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub user: &'a UserRecord,
    pub warnings: Option<u32>,
    pub unmute_at: Option<DateTime<Utc>>,
}

impl<'a> Subject<'a> {
    pub fn new(user: &'a UserRecord) -> Self {
        Self {
            user,
            warnings: None,
            unmute_at: None,
        }
    }

    #[must_use]
    pub fn with_warnings(mut self, warnings: u32) -> Self {
        self.warnings = Some(warnings);
        self
    }

    #[must_use]
    pub fn with_unmute_at(mut self, unmute_at: Option<DateTime<Utc>>) -> Self {
        self.unmute_at = unmute_at;
        self
    }
}

/// Values available to a caption.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub sender: Option<Subject<'a>>,
    pub mentioned: Option<Subject<'a>>,
    pub settings: &'a Settings,
}

/// Render `template`, escaping user-provided values for `format`.
pub fn render(template: &str, vars: &TemplateVars<'_>, format: ReplyFormat) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let key = &after[..close];
        match key.split_once('.') {
            Some((scope, field)) => {
                if let Some(value) = lookup(scope.trim(), field.trim(), vars, format) {
                    out.push_str(&value);
                }
            }
            // Not a placeholder, keep the braces.
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

fn lookup(scope: &str, field: &str, vars: &TemplateVars<'_>, format: ReplyFormat) -> Option<String> {
    let scope = scope.to_ascii_lowercase();
    let field = field.to_ascii_lowercase();

    match scope.as_str() {
        "senderuser" => user_field(vars.sender?, &field, format),
        "mentioneduser" => user_field(vars.mentioned?, &field, format),
        "config" => config_field(vars.settings, &field),
        _ => None,
    }
}

fn user_field(subject: Subject<'_>, field: &str, format: ReplyFormat) -> Option<String> {
    let user = subject.user;
    let escape = |s: &str| match format {
        ReplyFormat::Html => html_escape(s),
        ReplyFormat::Plain => s.to_string(),
    };

    let value = match field {
        "id" => user.user_id.to_string(),
        "firstname" => escape(&user.first_name),
        "lastname" => escape(user.last_name.as_deref().unwrap_or_default()),
        "username" => escape(user.username.as_deref().unwrap_or_default()),
        "name" => escape(&user.display_name()),
        "mention" => mention(user, format),
        "warnings" => subject.warnings.unwrap_or(0).to_string(),
        "unmuteat" => subject
            .unmute_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

fn mention(user: &UserRecord, format: ReplyFormat) -> String {
    match format {
        ReplyFormat::Html => format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            user.user_id,
            html_escape(&user.display_name())
        ),
        ReplyFormat::Plain => match &user.username {
            Some(username) => format!("@{}", username),
            None => user.display_name(),
        },
    }
}

fn config_field(settings: &Settings, field: &str) -> Option<String> {
    let value = match field {
        "maxwarnings" => settings.max_warnings.to_string(),
        "unmutedelaydays" => settings.unmute_delay_days.to_string(),
        "warncooldownseconds" => settings.warn_cooldown_seconds.to_string(),
        _ => return None,
    };
    Some(value)
}
