//! Keyword moderation for chat messages.
//!
//! Fatigue keywords get a supportive reply; profanity gets the message
//! deleted.  Profanity matching runs on a normalized copy of the text so that
//! common obfuscations (`0` for `о`, `@` for `а`, dots or spaces between
//! letters) are still caught, while a word boundary is required before each
//! keyword to avoid flagging unrelated longer words.

use std::sync::LazyLock;

use regex::Regex;

const PROFANITY: &[&str] = &[
    "бля", "сука", "хуй", "пизд", "ебан", "ёбан", "мудак", "идиот", "нах", "блять",
];

const FATIGUE: &[&str] = &["устала", "плохо", "грустно", "тяжело", "сложно", "не могу"];

/// Supportive replies as `(emoji, text)`; the text is rendered bold.
pub const SUPPORT_MESSAGES: &[(&str, &str)] = &[
    ("🌸", "Ты — супермама! Держись, всё будет отлично!"),
    ("💖", "Помни: ты не одна. Мы рядом!"),
    ("🌟", "Ты сильнее, чем думаешь!"),
];

const SUBSTITUTIONS: &[(char, &str)] = &[('0', "о"), ('@', "а"), ('3', "з"), ('.', "")];

static PROFANITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = PROFANITY
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternatives})")).expect("profanity pattern is valid")
});

/// What the moderator wants done with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Reply with a random supportive message.
    Support,
    /// Delete the message and reprimand the author.
    Profanity,
    Clean,
}

/// Fatigue wins over profanity.
pub fn assess(text: &str) -> Verdict {
    if contains_fatigue(text) {
        Verdict::Support
    } else if contains_profanity(text) {
        Verdict::Profanity
    } else {
        Verdict::Clean
    }
}

pub fn contains_fatigue(text: &str) -> bool {
    let lower = text.to_lowercase();
    FATIGUE.iter().any(|word| lower.contains(word))
}

pub fn contains_profanity(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    PROFANITY_PATTERN.is_match(&normalize(text))
}

/// Lowercase, undo character substitutions and glue spelled-out letters
/// (`с у к а`) back into words.
///
/// Spaces between ordinary words are kept: stripping them all would put every
/// keyword at a word start and flag innocent text such as `у корабля`.  The
/// cost is that a word split into multi-letter pieces (`су ка`) slips through.
pub fn normalize(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match SUBSTITUTIONS.iter().find(|(from, _)| *from == ch) {
            Some((_, to)) => mapped.push_str(to),
            None => mapped.push(ch),
        }
    }

    let mut out = String::with_capacity(mapped.len());
    let mut prev_single = false;
    for token in mapped.split_whitespace() {
        let single = token.chars().filter(|c| c.is_alphanumeric()).count() == 1;
        if !out.is_empty() && !(single && prev_single) {
            out.push(' ');
        }
        out.push_str(token);
        prev_single = single;
    }
    out
}

/// `@username` when the author has one, otherwise their first name.
pub fn mention(username: Option<&str>, first_name: &str) -> String {
    match username {
        Some(name) if !name.is_empty() => format!("@{name}"),
        _ => first_name.to_string(),
    }
}

/// Plain-text reprimand posted after a deletion.
pub fn reprimand(mention: &str) -> String {
    format!("{mention}, давайте уважительно 🙏")
}
