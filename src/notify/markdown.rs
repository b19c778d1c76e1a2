//! Telegram MarkdownV2 escaping.
//!
//! Free text and link targets use different reserved sets. A reserved
//! character that is already preceded by a backslash in the input is left
//! as is, so escaping pre-escaped text does not double the backslash.

/// Reserved in free text.
pub const TEXT_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Reserved inside the target of an inline link.
pub const URL_RESERVED: &[char] = &['\\', ')'];

/// Escape free text.
pub fn escape(text: &str) -> String {
    escape_chars(text, TEXT_RESERVED)
}

/// Escape an inline link target.
pub fn escape_url(url: &str) -> String {
    escape_chars(url, URL_RESERVED)
}

/// Inline link `[name](url)` with both parts escaped.
pub fn inline_link(name: &str, url: &str) -> String {
    format!("[{}]({})", escape(name), escape_url(url))
}

/// Prepend a backslash to every reserved character.
pub fn escape_chars(text: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            // Existing escape pair
            if let Some(&next) = chars.peek() {
                if reserved.contains(&next) {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        if reserved.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }

    out
}
