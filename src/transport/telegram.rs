use crate::core::error::RelayError;
use crate::transport::{ChatTransport, InlineKeyboard};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Long-poll wait passed to getUpdates, in seconds.
const POLL_TIMEOUT_SECS: u32 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Telegram Bot API client over plain HTTPS.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("https://api.telegram.org/bot{token}"),
        }
    }

    async fn call<R>(&self, method: &str, payload: serde_json::Value) -> Result<R, RelayError>
    where
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.client.post(&url).json(&payload).send().await?;
        let parsed: ApiResponse<R> = response.json().await?;
        Self::unwrap_response(method, parsed)
    }

    fn unwrap_response<R>(method: &str, parsed: ApiResponse<R>) -> Result<R, RelayError> {
        if !parsed.ok {
            let description = parsed
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(RelayError::Transport(format!("{method}: {description}")));
        }
        parsed
            .result
            .ok_or_else(|| RelayError::Transport(format!("{method}: ok response without result")))
    }

    /// Fetch the next batch of updates, long-polling up to
    /// [`POLL_TIMEOUT_SECS`]. `offset` must be one past the last seen
    /// update id.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, RelayError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, RelayError> {
        let message: Message = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(message.message_id)
    }

    async fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<i64, RelayError> {
        let message: Message = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": keyboard,
                }),
            )
            .await?;
        Ok(message.message_id)
    }

    async fn send_photo(&self, chat_id: i64, image: Vec<u8>) -> Result<i64, RelayError> {
        let part = Part::bytes(image)
            .file_name("generated.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);

        let url = format!("{}/sendPhoto", self.base_url);
        let response = self.client.post(&url).multipart(form).send().await?;
        let parsed: ApiResponse<Message> = response.json().await?;
        let message = Self::unwrap_response("sendPhoto", parsed)?;
        Ok(message.message_id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError> {
        let _: bool = self
            .call(
                "deleteMessage",
                json!({ "chat_id": chat_id, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn clear_reply_markup(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError> {
        // Telegram returns the edited message here, but an empty keyboard edit
        // can also return plain `true`; accept anything well-formed.
        let _: serde_json::Value = self
            .call(
                "editMessageReplyMarkup",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "reply_markup": InlineKeyboard::empty(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), RelayError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id, "text": text }),
            )
            .await?;
        Ok(())
    }
}
