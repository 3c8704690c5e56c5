//! Calendar arithmetic for ages, birthdays and upcoming-event windows.
//!
//! Everything here is a pure function of its inputs; "now" is always passed
//! in as a local calendar date so callers decide the timezone.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Date format used in chat commands and replies (`15.03.2024`).
pub const USER_DATE_FORMAT: &str = "%d.%m.%Y";
/// Short day-month format used in the birthday list (`15.03`).
pub const DAY_MONTH_FORMAT: &str = "%d.%m";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("`{0}` is not a valid dd.mm.yyyy date")]
    Invalid(String),
}

/// Parse a `dd.mm.yyyy` date typed by a user.
pub fn parse_user_date(raw: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(raw.trim(), USER_DATE_FORMAT)
        .map_err(|_| DateError::Invalid(raw.trim().to_string()))
}

pub fn format_user_date(date: NaiveDate) -> String {
    date.format(USER_DATE_FORMAT).to_string()
}

/// Whole months between `birth` and `now`.
///
/// Counts calendar months and subtracts one when the day of month has not
/// been reached yet, so a child born on the 31st turns one month old on the
/// 1st of the month after next when the next month is shorter.
pub fn age_in_months(birth: NaiveDate, now: NaiveDate) -> i32 {
    let mut months = (now.year() - birth.year()) * 12 + (now.month() as i32 - birth.month() as i32);
    if now.day() < birth.day() {
        months -= 1;
    }
    months
}

/// True when the age in months on `today` is greater than on the day before.
pub fn ticked_over(birth: NaiveDate, today: NaiveDate) -> bool {
    match today.pred_opt() {
        Some(yesterday) => age_in_months(birth, today) > age_in_months(birth, yesterday),
        None => false,
    }
}

/// The birthday falling in `year`.  A 29 February birth date moves to
/// 1 March in non-leap years, the day its age in months ticks over.
pub fn anniversary(birth: NaiveDate, year: i32) -> Option<NaiveDate> {
    birth
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// The first birthday on or after `today`.
pub fn next_birthday(birth: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = anniversary(birth, today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        anniversary(birth, today.year() + 1)
    }
}

/// Signed whole days from `today` until `date`.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// An item falling inside an upcoming window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upcoming<'a, T> {
    pub item: &'a T,
    pub date: NaiveDate,
    pub days: i64,
}

/// Keep items whose date is between `today` and `today + window_days`
/// (inclusive), sorted by distance.  `date_of` may return `None` to skip an
/// item.
pub fn upcoming_within<'a, T>(
    items: &'a [T],
    today: NaiveDate,
    window_days: i64,
    date_of: impl Fn(&T) -> Option<NaiveDate>,
) -> Vec<Upcoming<'a, T>> {
    let mut upcoming: Vec<Upcoming<'a, T>> = items
        .iter()
        .filter_map(|item| {
            let date = date_of(item)?;
            let days = days_until(date, today);
            (0..=window_days).contains(&days).then_some(Upcoming { item, date, days })
        })
        .collect();
    upcoming.sort_by_key(|entry| entry.days);
    upcoming
}

/// Statistics bucket for an age in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBucket {
    UpTo3,
    From4To6,
    From7To9,
    From10To12,
    OneToTwoYears,
    OverTwoYears,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 6] = [
        Self::UpTo3,
        Self::From4To6,
        Self::From7To9,
        Self::From10To12,
        Self::OneToTwoYears,
        Self::OverTwoYears,
    ];

    pub fn from_months(months: i32) -> Self {
        match months {
            m if m < 4 => Self::UpTo3,
            m if m < 7 => Self::From4To6,
            m if m < 10 => Self::From7To9,
            m if m < 13 => Self::From10To12,
            m if m < 25 => Self::OneToTwoYears,
            _ => Self::OverTwoYears,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo3 => "0-3",
            Self::From4To6 => "4-6",
            Self::From7To9 => "7-9",
            Self::From10To12 => "10-12",
            Self::OneToTwoYears => "1-2 г",
            Self::OverTwoYears => "2+ г",
        }
    }
}

/// `5 мес.`, `1 г.`, `2 г. 3 мес.`
pub fn format_age(months: i32) -> String {
    if months < 12 {
        return format!("{months} мес.");
    }
    let (years, rest) = (months / 12, months % 12);
    if rest == 0 {
        format!("{years} г.")
    } else {
        format!("{years} г. {rest} мес.")
    }
}

/// `сегодня`, `завтра`, `через N дн.`
pub fn relative_day(days: i64) -> String {
    match days {
        0 => "сегодня".to_string(),
        1 => "завтра".to_string(),
        n => format!("через {n} дн."),
    }
}

/// Russian noun form for a number of years: `1 год`, `3 года`, `5 лет`.
pub fn years_word(years: i32) -> &'static str {
    let n = years.unsigned_abs();
    match (n % 10, n % 100) {
        (1, rem) if rem != 11 => "год",
        (2..=4, rem) if !(12..=14).contains(&rem) => "года",
        _ => "лет",
    }
}
