const API_KEY_PREFIX: &str = "client-";
const API_KEY_MASK: &str = "*****";
const VISIBLE_KEY_CHARS: usize = 5;

pub const MAX_LOG_CHARS: usize = 400;
pub const TRUNCATED_SUFFIX: &str = "...[TRUNCATED]";

/// Masks API keys embedded in strings, keeping the first 5 chars after `client-`.
/// Use this for ANY log output that may include headers or messages containing API keys.
pub fn sanitize_api_key(input: &str) -> String {
    let mut parts = input.split(API_KEY_PREFIX);
    let mut sanitized = parts.next().unwrap_or_default().to_string();

    for part in parts {
        let key_end = part
            .char_indices()
            .find(|(_, c)| !c.is_alphanumeric())
            .map_or(part.len(), |(i, _)| i);
        let (key, rest) = part.split_at(key_end);

        sanitized.push_str(API_KEY_PREFIX);
        sanitized.extend(key.chars().take(VISIBLE_KEY_CHARS));
        sanitized.push_str(API_KEY_MASK);
        sanitized.push_str(rest);
    }

    sanitized
}

/// Caps a log line at [`MAX_LOG_CHARS`] characters, suffix included.
pub fn truncate_message(msg: String) -> String {
    if msg.chars().count() <= MAX_LOG_CHARS {
        return msg;
    }

    let visible_chars = MAX_LOG_CHARS.saturating_sub(TRUNCATED_SUFFIX.len());
    let mut truncated: String = msg.chars().take(visible_chars).collect();
    truncated.push_str(TRUNCATED_SUFFIX);
    truncated
}
