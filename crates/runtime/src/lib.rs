pub mod bot;
pub mod chat;
pub mod schedule;

pub use bot::Bot;
pub use chat::{
    CallbackPress, ChatApi, ChatId, ChatUser, IncomingMessage, MessageId, Outgoing, TextFormat,
    Update, UserId,
};
pub use schedule::DailySchedule;
