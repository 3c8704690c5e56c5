//! The chat-platform seam: what the bot receives and what it can ask for.

use anyhow::Result;
use async_trait::async_trait;

use nestbot_core::MenuAction;

pub type ChatId = i64;
pub type MessageId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub from: Option<ChatUser>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub new_members: Vec<ChatUser>,
}

impl IncomingMessage {
    /// Text for moderation: the message text, else a media caption.
    pub fn moderated_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPress {
    pub id: String,
    pub data: Option<String>,
    pub chat_id: Option<ChatId>,
    pub message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Message(IncomingMessage),
    Callback(CallbackPress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    MarkdownV2,
}

/// A message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: ChatId,
    pub text: String,
    pub format: TextFormat,
    pub reply_to: Option<MessageId>,
    pub menu: Vec<MenuAction>,
}

impl Outgoing {
    pub fn markdown(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            format: TextFormat::MarkdownV2,
            reply_to: None,
            menu: Vec::new(),
        }
    }

    pub fn plain(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            format: TextFormat::Plain,
            ..Self::markdown(chat_id, text)
        }
    }

    pub fn replying_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn with_menu(mut self) -> Self {
        self.menu = MenuAction::ALL.to_vec();
        self
    }
}

/// Operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send(&self, message: &Outgoing) -> Result<()>;

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;

    /// Replace the text of a message the bot sent earlier.
    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        format: TextFormat,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str) -> Result<()>;

    /// Membership status of `user_id` in `chat_id` (`creator`, `member`, ...).
    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<String>;
}
