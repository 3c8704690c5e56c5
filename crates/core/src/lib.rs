//! Chat-independent logic for the nursery chat bot: records, date arithmetic,
//! command classification, moderation, rendering and daily greetings.

pub mod commands;
pub mod dates;
pub mod greetings;
pub mod markdown;
pub mod model;
pub mod moderation;
pub mod render;

pub use commands::{BotCommand, Input, classify};
pub use dates::DateError;
pub use greetings::{Greeting, GreetingKind, GreetedSet, due_greetings};
pub use model::{ChildRecord, EventRecord, normalize_name};
pub use moderation::Verdict;
pub use render::MenuAction;
