use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use nestbot_runtime::{ChatApi, ChatId, MessageId, Outgoing, TextFormat, UserId};

use crate::wire::{
    ChatMember, EditMessageTextRequest, InlineKeyboardMarkup, ReplyParameters, SendMessageRequest,
    TelegramResponse, TelegramUpdate, TelegramUser, parse_mode,
};

/// Long-poll timeout for `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: &str = "25";

/// Bot API client; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: format!("https://api.telegram.org/bot{token}"),
        }
    }

    pub async fn fetch_updates(&self, offset: i64) -> Result<Vec<TelegramUpdate>> {
        let url = format!("{}/getUpdates", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[
                ("timeout", POLL_TIMEOUT_SECS),
                ("offset", &offset.to_string()),
                ("allowed_updates", r#"["message","callback_query"]"#),
            ])
            .send()
            .await?;
        let updates: Option<Vec<TelegramUpdate>> = decode("getUpdates", response).await?;
        Ok(updates.unwrap_or_default())
    }

    /// The bot's own `@username` from `getMe`.
    pub async fn own_username(&self) -> Result<Option<String>> {
        let me: Option<TelegramUser> = self.call("getMe", &json!({})).await?;
        Ok(me.and_then(|me| me.username))
    }

    /// Remove any webhook and discard updates queued while the bot was down.
    pub async fn drop_pending_updates(&self) -> Result<()> {
        self.call::<bool>("deleteWebhook", &json!({ "drop_pending_updates": true }))
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &impl Serialize) -> Result<Option<T>> {
        let url = format!("{}/{method}", self.base_url);
        let response = self.http.post(url).json(body).send().await?;
        decode(method, response).await
    }
}

async fn decode<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<Option<T>> {
    let status = response.status();
    let payload: TelegramResponse<T> = response
        .json()
        .await
        .with_context(|| format!("{method}: unreadable response ({status})"))?;
    if !payload.ok {
        let description = payload
            .description
            .unwrap_or_else(|| format!("telegram {method} failed"));
        bail!("{method} failed ({status}): {description}");
    }
    Ok(payload.result)
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send(&self, message: &Outgoing) -> Result<()> {
        let body = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: parse_mode(message.format),
            reply_parameters: message.reply_to.map(|message_id| ReplyParameters {
                message_id,
                allow_sending_without_reply: true,
            }),
            reply_markup: (!message.menu.is_empty())
                .then(|| InlineKeyboardMarkup::single_column(&message.menu)),
        };
        self.call::<serde_json::Value>("sendMessage", &body).await?;
        Ok(())
    }

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.call::<bool>(
            "deleteMessage",
            &json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await?;
        Ok(())
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        format: TextFormat,
    ) -> Result<()> {
        let body = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
            parse_mode: parse_mode(format),
        };
        self.call::<serde_json::Value>("editMessageText", &body).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.call::<bool>(
            "answerCallbackQuery",
            &json!({ "callback_query_id": callback_id }),
        )
        .await?;
        Ok(())
    }

    async fn member_status(&self, chat_id: ChatId, user_id: UserId) -> Result<String> {
        let member: Option<ChatMember> = self
            .call(
                "getChatMember",
                &json!({ "chat_id": chat_id, "user_id": user_id }),
            )
            .await?;
        member
            .map(|member| member.status)
            .context("getChatMember returned no member")
    }
}
