//! MarkdownV2 rendering of every message the bot sends.

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::dates::{
    AgeBucket, DAY_MONTH_FORMAT, USER_DATE_FORMAT, age_in_months, format_age, next_birthday,
    relative_day, upcoming_within,
};
use crate::markdown::{bold, code, escape};
use crate::model::{ChildRecord, EventRecord};
use crate::moderation::SUPPORT_MESSAGES;

pub const MENU_PROMPT: &str = "Выберите действие:";

/// Tips as `(emoji, text)`.
pub const TIPS: &[(&str, &str)] = &[
    ("🍼", "При грудном вскармливании пейте больше воды."),
    ("😴", "Ложитесь спать пораньше — это важно!"),
    ("🧸", "Уделяйте себе 15 минут в день."),
    ("📚", "Читайте с малышом каждый день."),
    ("🥦", "Ешьте больше овощей и фруктов."),
    ("💕", "Не сравнивайте себя с другими."),
    ("🧠", "Малыш учится на ваших эмоциях — улыбайтесь!"),
    ("🧼", "Мойте руки перед кормлением."),
    ("🌟", "Отмечайте каждую победу!"),
    ("📞", "Обращайтесь за помощью, если тяжело."),
];

/// Inline menu buttons, one per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ListChildren,
    Tip,
    Stats,
    Birthdays,
    Calendar,
    Help,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        Self::ListChildren,
        Self::Tip,
        Self::Stats,
        Self::Birthdays,
        Self::Calendar,
        Self::Help,
    ];

    pub fn callback_data(self) -> &'static str {
        match self {
            Self::ListChildren => "list_babies",
            Self::Tip => "tip",
            Self::Stats => "stats",
            Self::Birthdays => "birthdays",
            Self::Calendar => "calendar",
            Self::Help => "help",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ListChildren => "📄 Список детей",
            Self::Tip => "💡 Совет дня",
            Self::Stats => "📊 Статистика",
            Self::Birthdays => "🎂 Ближайшие ДР",
            Self::Calendar => "🗓 Календарь",
            Self::Help => "❓ Помощь",
        }
    }

    pub fn from_callback(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.callback_data() == data)
    }
}

pub fn children_list(children: &[ChildRecord], today: NaiveDate) -> String {
    if children.is_empty() {
        return escape("📝 Список пуст.");
    }
    let mut sorted: Vec<&ChildRecord> = children.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut text = format!("{}\n\n", bold("👶 Наши малыши:"));
    for child in sorted {
        let age = format_age(age_in_months(child.birth, today));
        text.push_str(&format!(
            "• {} — {}\n",
            bold(&child.name),
            escape(&format!("{} ({age})", child.birth.format(USER_DATE_FORMAT)))
        ));
    }
    text
}

pub fn statistics(children: &[ChildRecord], today: NaiveDate) -> String {
    if children.is_empty() {
        return escape("📊 Статистика: список пуст.");
    }
    let mut counts = [0usize; AgeBucket::ALL.len()];
    for child in children {
        let bucket = AgeBucket::from_months(age_in_months(child.birth, today));
        counts[bucket as usize] += 1;
    }
    let lines: Vec<String> = AgeBucket::ALL
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(bucket, count)| escape(&format!("• {}: {count}", bucket.label())))
        .collect();
    format!("{}\n\n{}", bold("📊 Статистика:"), lines.join("\n"))
}

pub fn birthdays(children: &[ChildRecord], today: NaiveDate, window_days: i64) -> String {
    let upcoming = upcoming_within(children, today, window_days, |child| {
        next_birthday(child.birth, today)
    });
    let header = bold(&format!("🎂 Ближайшие ДР ({window_days} дней):"));
    if upcoming.is_empty() {
        return format!("{header}\n\n{}", escape("Никто не празднует."));
    }
    let lines: Vec<String> = upcoming
        .iter()
        .map(|entry| {
            format!(
                "• {} — {}",
                bold(&entry.item.name),
                escape(&format!(
                    "{} ({})",
                    entry.date.format(DAY_MONTH_FORMAT),
                    relative_day(entry.days)
                ))
            )
        })
        .collect();
    format!("{header}\n\n{}", lines.join("\n"))
}

pub fn calendar(events: &[EventRecord], today: NaiveDate, window_days: i64) -> String {
    let upcoming = upcoming_within(events, today, window_days, |event| Some(event.date));
    let header = bold(&format!("🗓 Ближайшие события ({window_days} дней):"));
    if upcoming.is_empty() {
        return format!("{header}\n\n{}", escape("Нет событий."));
    }
    let lines: Vec<String> = upcoming
        .iter()
        .map(|entry| {
            format!(
                "• {} — {}",
                bold(&entry.item.title),
                escape(&format!(
                    "{} ({})",
                    entry.date.format(USER_DATE_FORMAT),
                    relative_day(entry.days)
                ))
            )
        })
        .collect();
    format!("{header}\n\n{}", lines.join("\n"))
}

pub fn help() -> String {
    [
        format!("🤖 {}", bold("Помощь:")),
        String::new(),
        escape("/menu — Меню"),
        escape("/tip — Совет дня"),
        escape("/ustala — Поддержка"),
        String::new(),
        format!("{} {}", bold("Добавить ребёнка:"), code("+Имя дд.мм.гггг")),
        format!("{} {}", escape("Пример:"), code("+Маша 15.03.2024")),
        String::new(),
        format!("{} {}", bold("Добавить событие:"), code("!событие Прививка 20.03.2025")),
        String::new(),
        format!("{} {} {}", bold("Удалить:"), code("-Имя"), escape("(только админы)")),
    ]
    .join("\n")
}

pub fn tip(tip: (&str, &str)) -> String {
    let (emoji, text) = tip;
    format!("{emoji} {} {}", bold("Совет дня:"), escape(text))
}

pub fn random_tip<R: Rng + ?Sized>(rng: &mut R) -> String {
    tip(*TIPS.choose(rng).unwrap_or(&TIPS[0]))
}

pub fn support(message: (&str, &str)) -> String {
    let (emoji, text) = message;
    format!("{emoji} {}", bold(text))
}

pub fn random_support<R: Rng + ?Sized>(rng: &mut R) -> String {
    support(*SUPPORT_MESSAGES.choose(rng).unwrap_or(&SUPPORT_MESSAGES[0]))
}

// ── Command replies ──────────────────────────────────────────────────────────

pub fn child_added(child: &ChildRecord) -> String {
    format!(
        "✅ {} {}",
        bold(&child.name),
        escape(&format!("добавлен! Дата: {}", child.birth.format(USER_DATE_FORMAT)))
    )
}

pub fn child_removed(name: &str) -> String {
    format!("✅ {} {}", bold(name), escape("удалён."))
}

pub fn child_not_found(name: &str) -> String {
    format!("❌ {} {}", bold(name), escape("не найден."))
}

pub fn event_added(event: &EventRecord) -> String {
    format!(
        "✅ {} {}",
        bold(&event.title),
        escape(&format!("на {} добавлено!", event.date.format(USER_DATE_FORMAT)))
    )
}

/// Plain text.
pub const DATE_ERROR: &str = "❌ Ошибка даты.";
/// Plain text.
pub const ADMINS_ONLY: &str = "❌ Только админы могут удалять.";

/// Plain-text welcome for a new chat member.
pub fn welcome(first_name: &str) -> String {
    format!("Здравствуй, {first_name}! 🌸\n\nДобро пожаловать в наш тёплый чат! 💖")
}
