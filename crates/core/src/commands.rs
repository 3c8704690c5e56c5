use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::dates::{DateError, parse_user_date};
use crate::model::normalize_name;

/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Menu,
    Tip,
    Support,
    Help,
}

impl BotCommand {
    /// Parse `/name` or `/name@botname`, ignoring any arguments.
    ///
    /// A command addressed to a different bot (`/start@other_bot`) yields
    /// `None` when `own_username` is known; with `None` every suffix is
    /// accepted.
    pub fn parse(text: &str, own_username: Option<&str>) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?.strip_prefix('/')?;
        let (name, addressee) = match word.split_once('@') {
            Some((base, addressee)) => (base, Some(addressee)),
            None => (word, None),
        };
        if let (Some(addressee), Some(own)) = (addressee, own_username) {
            if !addressee.eq_ignore_ascii_case(own.trim_start_matches('@')) {
                return None;
            }
        }
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "menu" => Some(Self::Menu),
            "tip" => Some(Self::Tip),
            "ustala" => Some(Self::Support),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// `/start` and `/menu` also make the chat the daily greeting target.
    pub fn remembers_chat(self) -> bool {
        matches!(self, Self::Start | Self::Menu)
    }
}

/// One classified free-text chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    AddChild { name: String, birth: NaiveDate },
    RemoveChild { name: String },
    AddEvent { title: String, date: NaiveDate },
    /// A `+` or `!event` line whose trailing date is not a real date.
    BadDate(DateError),
    PlainText,
}

const EVENT_PREFIXES: [&str; 2] = ["!событие", "!event"];

static TRAILING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9]{2}\.[0-9]{2}\.[0-9]{4}$").expect("trailing date pattern is valid")
});

/// Split `text` into the part before a trailing `dd.mm.yyyy` token and the
/// token itself.
fn split_trailing_date(text: &str) -> Option<(&str, &str)> {
    let found = TRAILING_DATE.find(text)?;
    Some((&text[..found.start()], found.as_str()))
}

/// Classify a message:
///
/// | Shape                          | Result        |
/// |--------------------------------|---------------|
/// | `+Name dd.mm.yyyy`             | `AddChild`    |
/// | `-Name`                        | `RemoveChild` |
/// | `!событие Title dd.mm.yyyy`    | `AddEvent`    |
/// | `!event Title dd.mm.yyyy`      | `AddEvent`    |
///
/// Lines without a trailing date or with an empty name or title fall through
/// to `PlainText`.  Future birth dates are accepted (expected due dates).
pub fn classify(text: &str) -> Input {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('+') {
        let Some((head, raw_date)) = split_trailing_date(rest) else {
            return Input::PlainText;
        };
        let name = normalize_name(head);
        if name.is_empty() {
            return Input::PlainText;
        }
        return match parse_user_date(raw_date) {
            Ok(birth) => Input::AddChild { name, birth },
            Err(err) => Input::BadDate(err),
        };
    }

    if let Some(rest) = text.strip_prefix('-') {
        let name = normalize_name(rest);
        if name.is_empty() {
            return Input::PlainText;
        }
        return Input::RemoveChild { name };
    }

    if let Some(rest) = strip_event_prefix(text) {
        let Some((head, raw_date)) = split_trailing_date(rest) else {
            return Input::PlainText;
        };
        let title = head.trim();
        if title.is_empty() {
            return Input::PlainText;
        }
        return match parse_user_date(raw_date) {
            Ok(date) => Input::AddEvent {
                title: title.to_string(),
                date,
            },
            Err(err) => Input::BadDate(err),
        };
    }

    Input::PlainText
}

fn strip_event_prefix(text: &str) -> Option<&str> {
    EVENT_PREFIXES.iter().find_map(|prefix| {
        let rest = text.strip_prefix(prefix)?;
        rest.starts_with(char::is_whitespace).then(|| rest.trim())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_commands_with_bot_mentions() {
        assert_eq!(BotCommand::parse("/start", None), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/menu@nest_bot", None), Some(BotCommand::Menu));
        assert_eq!(BotCommand::parse(" /TIP extra words", None), Some(BotCommand::Tip));
        assert_eq!(BotCommand::parse("/ustala", None), Some(BotCommand::Support));
        assert_eq!(BotCommand::parse("/help", None), Some(BotCommand::Help));
        assert_eq!(BotCommand::parse("/unknown", None), None);
        assert_eq!(BotCommand::parse("start", None), None);
        assert!(BotCommand::Start.remembers_chat());
        assert!(!BotCommand::Tip.remembers_chat());
    }

    #[test]
    fn commands_for_other_bots_are_ignored() {
        assert_eq!(
            BotCommand::parse("/start@nest_bot", Some("nest_bot")),
            Some(BotCommand::Start)
        );
        assert_eq!(
            BotCommand::parse("/start@Nest_Bot", Some("@nest_bot")),
            Some(BotCommand::Start)
        );
        assert_eq!(BotCommand::parse("/start@other_bot", Some("nest_bot")), None);
        assert_eq!(BotCommand::parse("/start", Some("nest_bot")), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/start@other_bot", None), Some(BotCommand::Start));
    }

    #[test]
    fn classifies_add_child() {
        assert_eq!(
            classify("+маша 15.03.2024"),
            Input::AddChild {
                name: "Маша".to_string(),
                birth: d(2024, 3, 15)
            }
        );
        assert_eq!(
            classify("  +анна   мария 01.12.2023 "),
            Input::AddChild {
                name: "Анна Мария".to_string(),
                birth: d(2023, 12, 1)
            }
        );
    }

    #[test]
    fn add_child_requires_trailing_date_and_name() {
        assert_eq!(classify("+Маша"), Input::PlainText);
        assert_eq!(classify("+Маша 15.03.2024 привет"), Input::PlainText);
        assert_eq!(classify("+ 15.03.2024"), Input::PlainText);
        assert_eq!(classify("+Маша15.03.2024"), Input::PlainText);
    }

    #[test]
    fn impossible_dates_are_bad() {
        assert_eq!(
            classify("+Маша 31.02.2024"),
            Input::BadDate(DateError::Invalid("31.02.2024".to_string()))
        );
    }

    #[test]
    fn future_birth_dates_are_accepted() {
        assert_eq!(
            classify("+Маша 01.09.2099"),
            Input::AddChild {
                name: "Маша".to_string(),
                birth: d(2099, 9, 1)
            }
        );
    }

    #[test]
    fn classifies_remove_child() {
        assert_eq!(
            classify("-маша"),
            Input::RemoveChild {
                name: "Маша".to_string()
            }
        );
        assert_eq!(classify("-"), Input::PlainText);
        assert_eq!(classify("-   "), Input::PlainText);
    }

    #[test]
    fn classifies_events_in_both_languages() {
        let expected = Input::AddEvent {
            title: "Прививка".to_string(),
            date: d(2025, 3, 20),
        };
        assert_eq!(classify("!событие Прививка 20.03.2025"), expected);
        assert_eq!(classify("!event Прививка 20.03.2025"), expected);
        assert_eq!(
            classify("!event Поход к врачу  20.03.2025"),
            Input::AddEvent {
                title: "Поход к врачу".to_string(),
                date: d(2025, 3, 20)
            }
        );
    }

    #[test]
    fn malformed_events_fall_through() {
        assert_eq!(classify("!событие 20.03.2025"), Input::PlainText);
        assert_eq!(classify("!событиеПрививка 20.03.2025"), Input::PlainText);
        assert_eq!(classify("!event Прививка"), Input::PlainText);
        assert_eq!(
            classify("!event Прививка 32.03.2025"),
            Input::BadDate(DateError::Invalid("32.03.2025".to_string()))
        );
    }

    #[test]
    fn everything_else_is_plain_text() {
        assert_eq!(classify("всем привет!"), Input::PlainText);
        assert_eq!(classify(""), Input::PlainText);
    }
}
