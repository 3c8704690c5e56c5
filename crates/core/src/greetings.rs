//! Daily congratulations and their same-day deduplication.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::dates::{age_in_months, ticked_over, years_word};
use crate::markdown::{bold, escape};
use crate::model::ChildRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingKind {
    Birthday { years: i32 },
    Month { months: i32 },
    Year { years: i32 },
}

/// A congratulation due today, with its deduplication key and MarkdownV2 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub key: String,
    pub kind: GreetingKind,
    pub text: String,
}

/// Every congratulation due on `today`, in roster order.
///
/// For each child whose age in months ticks over today three independent
/// checks apply: a birthday (positive whole years), a month milestone
/// (one month or more) and a year milestone (two years or more).
pub fn due_greetings(children: &[ChildRecord], today: NaiveDate) -> Vec<Greeting> {
    let mut due = Vec::new();
    for child in children {
        if !ticked_over(child.birth, today) {
            continue;
        }
        let months = age_in_months(child.birth, today);
        let is_birthday = months >= 12 && months % 12 == 0;

        if is_birthday {
            let years = months / 12;
            due.push(greeting(&child.name, GreetingKind::Birthday { years }, today));
        }
        if months >= 1 {
            due.push(greeting(&child.name, GreetingKind::Month { months }, today));
        }
        if is_birthday && months / 12 >= 2 {
            let years = months / 12;
            due.push(greeting(&child.name, GreetingKind::Year { years }, today));
        }
    }
    due
}

fn greeting(name: &str, kind: GreetingKind, today: NaiveDate) -> Greeting {
    let (key, text) = match kind {
        GreetingKind::Birthday { years } => (
            format!("{name}_bday_{today}"),
            format!(
                "🎉 {} {} {} {} 🎂",
                escape("Ура! Сегодня"),
                bold(name),
                escape("празднует"),
                bold(&format!("{years} {}!", years_word(years))),
            ),
        ),
        GreetingKind::Month { months } => (
            format!("{name}_month_{months}_{today}"),
            format!(
                "👶 {} {} {} {} {}\n\n{}",
                escape("Поздравляем"),
                bold(name),
                escape("с"),
                bold(&months.to_string()),
                escape("месяцем жизни! 🎊"),
                escape(month_wish(months)),
            ),
        ),
        GreetingKind::Year { years } => (
            format!("{name}_year_{years}_{today}"),
            format!(
                "🎈 {} {} {} {}{} 💖",
                escape("Удивительно!"),
                bold(name),
                escape("уже"),
                bold(&format!("{years} {}", years_word(years))),
                escape("! Пусть каждый год будет счастливым!"),
            ),
        ),
    };
    Greeting { key, kind, text }
}

fn month_wish(months: i32) -> &'static str {
    match months {
        1 => "Первый месяц — огромный шаг! 🥳",
        6 => "Полгода — уже почти ходит! 🚶",
        12 => "Первый День Рождения! 🎉",
        _ => "Каждый месяц — новые победы! 🌟",
    }
}

/// Keys of congratulations already delivered today.
///
/// Lives for the process lifetime only; a restart forgets it.  After each
/// pass it holds exactly the keys that qualified in that pass, so entries
/// from earlier days drop out on the next day's run.
#[derive(Debug, Clone, Default)]
pub struct GreetedSet {
    keys: HashSet<String>,
}

impl GreetedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Replace the set with the keys that qualified in the latest pass.
    pub fn replace_with(&mut self, keys: HashSet<String>) {
        self.keys = keys;
    }
}
