use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked child.  `name` is always stored in [`normalize_name`] form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub name: String,
    pub birth: NaiveDate,
}

impl ChildRecord {
    pub fn new(name: impl Into<String>, birth: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birth,
        }
    }
}

/// A titled calendar entry, unrelated to birthdays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub date: NaiveDate,
}

impl EventRecord {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            date,
        }
    }
}

/// Strip leading `+`/`-` markers, collapse whitespace and capitalize every
/// word (first letter upper case, the rest lower case).
pub fn normalize_name(raw: &str) -> String {
    raw.trim_start_matches(['+', '-'])
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
