//! Utility functions.
//!
//! Collection of helper functions used across the bot.

/// Escape HTML special characters for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build a full display name from first and optional last name.
pub fn full_name(first_name: &str, last_name: Option<&str>) -> String {
    match last_name {
        Some(last) if !last.is_empty() => format!("{} {}", first_name, last),
        _ => first_name.to_string(),
    }
}

/// Truncate text to at most `max` characters, appending an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}

/// Check whether `text` matches any of `patterns`.
///
/// With `whole_message` the entire text must equal a pattern, otherwise a
/// substring match is enough. Comparison ignores case unless `match_case`.
/// Empty text never matches.
pub fn match_message<S: AsRef<str>>(
    patterns: &[S],
    whole_message: bool,
    match_case: bool,
    text: &str,
) -> bool {
    if text.is_empty() {
        return false;
    }

    let normalize = |s: &str| {
        if match_case {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };
    let text = normalize(text);

    patterns.iter().any(|p| {
        let p = normalize(p.as_ref());
        if p.is_empty() {
            return false;
        }
        if whole_message {
            text.trim() == p
        } else {
            text.contains(&p)
        }
    })
}

/// Split a command message into its command word and arguments.
///
/// The command word is the first whitespace-delimited token and must start
/// with `/`; it may carry an `@bot` suffix. Any whitespace, including a
/// newline, ends it.
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (word, args) = text.split_at(end);
    word.starts_with('/').then(|| (word, args.trim_start()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&</b>"), "&lt;b&gt;&amp;&lt;/b&gt;");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(full_name("Ada", Some("Lovelace")), "Ada Lovelace");
        assert_eq!(full_name("Ada", None), "Ada");
        assert_eq!(full_name("Ada", Some("")), "Ada");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello…");
    }

    #[test]
    fn test_match_message_substring_ignores_case() {
        assert!(match_message(&["casino"], false, false, "Visit our CASINO now"));
        assert!(!match_message(&["casino"], false, true, "Visit our CASINO now"));
    }

    #[test]
    fn test_match_message_whole() {
        assert!(match_message(&["hi"], true, false, "Hi"));
        assert!(!match_message(&["hi"], true, false, "hi there"));
    }

    #[test]
    fn test_match_message_empty_text() {
        assert!(!match_message(&["a"], false, false, ""));
        assert!(!match_message(&[""], false, false, "anything"));
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("/warn @bob"), Some(("/warn", "@bob")));
        assert_eq!(split_command("/random\na\nb"), Some(("/random", "a\nb")));
        assert_eq!(split_command("  /wcount@bot"), Some(("/wcount@bot", "")));
        assert_eq!(split_command("hello /warn"), None);
        assert_eq!(split_command(""), None);
    }
}
