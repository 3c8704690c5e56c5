//! Bot API payloads and their mapping onto runtime types.

use serde::{Deserialize, Serialize};

use nestbot_core::MenuAction;
use nestbot_runtime::{CallbackPress, ChatUser, IncomingMessage, TextFormat, Update};

#[derive(Debug, Deserialize)]
pub(crate) struct TelegramResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

impl TelegramUpdate {
    /// `None` for update kinds the bot does not handle.
    pub fn into_update(self) -> Option<Update> {
        if let Some(message) = self.message {
            return Some(Update::Message(message.into()));
        }
        self.callback_query
            .map(|query| Update::Callback(query.into()))
    }
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub chat: TelegramChat,
    pub from: Option<TelegramUser>,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub new_chat_members: Vec<TelegramUser>,
}

impl From<TelegramMessage> for IncomingMessage {
    fn from(message: TelegramMessage) -> Self {
        IncomingMessage {
            chat_id: message.chat.id,
            message_id: message.message_id,
            from: message.from.map(Into::into),
            text: message.text,
            caption: message.caption,
            new_members: message.new_chat_members.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl From<TelegramUser> for ChatUser {
    fn from(user: TelegramUser) -> Self {
        ChatUser {
            id: user.id,
            is_bot: user.is_bot,
            first_name: user.first_name,
            username: user.username,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub data: Option<String>,
    /// Absent when the menu message is too old to be accessible.
    pub message: Option<TelegramMessage>,
}

impl From<TelegramCallbackQuery> for CallbackPress {
    fn from(query: TelegramCallbackQuery) -> Self {
        CallbackPress {
            id: query.id,
            data: query.data,
            chat_id: query.message.as_ref().map(|message| message.chat.id),
            message_id: query.message.as_ref().map(|message| message.message_id),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatMember {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplyParameters {
    pub message_id: i64,
    pub allow_sending_without_reply: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// One button per row.
    pub fn single_column(actions: &[MenuAction]) -> Self {
        Self {
            inline_keyboard: actions
                .iter()
                .map(|action| {
                    vec![InlineKeyboardButton {
                        text: action.label(),
                        callback_data: action.callback_data(),
                    }]
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct InlineKeyboardButton {
    pub text: &'static str,
    pub callback_data: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EditMessageTextRequest<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

pub(crate) fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::MarkdownV2 => Some("MarkdownV2"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_update_maps_to_incoming_message() {
        let raw = json!({
            "update_id": 10,
            "message": {
                "message_id": 55,
                "date": 1700000000,
                "chat": { "id": -1001, "type": "supergroup", "title": "Мамы" },
                "from": { "id": 7, "is_bot": false, "first_name": "Мария", "username": "masha_mom" },
                "text": "+Маша 15.03.2024"
            }
        });
        let update: TelegramUpdate = serde_json::from_value(raw).unwrap();
        assert_eq!(update.update_id, 10);
        let Some(Update::Message(message)) = update.into_update() else {
            panic!("expected a message");
        };
        assert_eq!(message.chat_id, -1001);
        assert_eq!(message.message_id, 55);
        assert_eq!(message.text.as_deref(), Some("+Маша 15.03.2024"));
        let from = message.from.unwrap();
        assert_eq!(from.username.as_deref(), Some("masha_mom"));
        assert!(message.new_members.is_empty());
    }

    #[test]
    fn join_update_carries_new_members() {
        let raw = json!({
            "update_id": 11,
            "message": {
                "message_id": 56,
                "chat": { "id": -1001 },
                "new_chat_members": [
                    { "id": 8, "is_bot": false, "first_name": "Оля" },
                    { "id": 9, "is_bot": true, "first_name": "HelperBot" }
                ]
            }
        });
        let update: TelegramUpdate = serde_json::from_value(raw).unwrap();
        let Some(Update::Message(message)) = update.into_update() else {
            panic!("expected a message");
        };
        assert_eq!(message.from, None);
        assert_eq!(message.new_members.len(), 2);
        assert!(message.new_members[1].is_bot);
    }

    #[test]
    fn callback_update_maps_to_press() {
        let raw = json!({
            "update_id": 12,
            "callback_query": {
                "id": "4382",
                "from": { "id": 7, "is_bot": false, "first_name": "Мария" },
                "chat_instance": "-99",
                "data": "stats",
                "message": { "message_id": 500, "chat": { "id": -1001 }, "text": "Выберите действие:" }
            }
        });
        let update: TelegramUpdate = serde_json::from_value(raw).unwrap();
        let Some(Update::Callback(press)) = update.into_update() else {
            panic!("expected a callback");
        };
        assert_eq!(press.id, "4382");
        assert_eq!(press.data.as_deref(), Some("stats"));
        assert_eq!(press.chat_id, Some(-1001));
        assert_eq!(press.message_id, Some(500));
    }

    #[test]
    fn unhandled_update_kinds_are_skipped() {
        let raw = json!({
            "update_id": 13,
            "edited_message": { "message_id": 1, "chat": { "id": 1 }, "text": "x" }
        });
        let update: TelegramUpdate = serde_json::from_value(raw).unwrap();
        assert!(update.into_update().is_none());
    }

    #[test]
    fn error_response_keeps_description() {
        let raw = json!({
            "ok": false,
            "error_code": 409,
            "description": "Conflict: terminated by other getUpdates request"
        });
        let response: TelegramResponse<Vec<TelegramUpdate>> = serde_json::from_value(raw).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert!(response.description.unwrap().starts_with("Conflict"));
    }

    #[test]
    fn get_me_response_carries_username() {
        let raw = json!({
            "ok": true,
            "result": { "id": 42, "is_bot": true, "first_name": "Nest", "username": "nest_bot", "can_join_groups": true }
        });
        let response: TelegramResponse<TelegramUser> = serde_json::from_value(raw).unwrap();
        assert_eq!(response.result.unwrap().username.as_deref(), Some("nest_bot"));
    }

    #[test]
    fn send_request_serializes_markup_and_reply() {
        let request = SendMessageRequest {
            chat_id: -1001,
            text: "Выберите действие:",
            parse_mode: parse_mode(TextFormat::Plain),
            reply_parameters: Some(ReplyParameters {
                message_id: 9,
                allow_sending_without_reply: true,
            }),
            reply_markup: Some(InlineKeyboardMarkup::single_column(&MenuAction::ALL)),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("parse_mode").is_none());
        assert_eq!(value["reply_parameters"]["message_id"], 9);
        let rows = value["reply_markup"]["inline_keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), MenuAction::ALL.len());
        assert_eq!(rows[0][0]["callback_data"], "list_babies");
        assert_eq!(rows[0].as_array().unwrap().len(), 1);
    }

    #[test]
    fn markdown_requests_set_parse_mode() {
        let request = EditMessageTextRequest {
            chat_id: 1,
            message_id: 2,
            text: r"*Помощь:*",
            parse_mode: parse_mode(TextFormat::MarkdownV2),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["parse_mode"], "MarkdownV2");
    }
}
