//! Telegram MarkdownV2 helpers.

/// Characters that must be backslash-escaped outside of code spans.
pub const RESERVED: &str = r"_*[]()~`>#+-=|{}.!\";

/// Escape literal text.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if RESERVED.contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn bold(text: &str) -> String {
    format!("*{}*", escape(text))
}

/// Inline code span; only `` ` `` and `\` need escaping inside.
pub fn code(text: &str) -> String {
    let mut out = String::from("`");
    for ch in text.chars() {
        if ch == '`' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('`');
    out
}

/// Drop markup and escapes, for printing rendered views to a terminal.
pub fn to_plain(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut chars = markdown.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '`' => {}
            other => out.push(other),
        }
    }
    out
}
