use crate::core::error::RelayError;
use async_trait::async_trait;
use serde::Serialize;

pub mod telegram;

/// Inline keyboard in Telegram's wire shape: rows of buttons. The model menu
/// uses one button per row so `rows(labels)` is the only constructor needed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    /// One button per row, button text doubles as the callback payload.
    pub fn rows<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inline_keyboard: labels
                .into_iter()
                .map(|label| {
                    let label = label.into();
                    vec![InlineButton {
                        text: label.clone(),
                        callback_data: label,
                    }]
                })
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            inline_keyboard: Vec::new(),
        }
    }
}

/// The chat platform seam. Implemented by [`telegram::TelegramApi`] in
/// production and by recording mocks in controller tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a text message, returning its message id.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, RelayError>;

    /// Send a text message with an inline keyboard attached.
    async fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<i64, RelayError>;

    /// Send an image as a photo upload.
    async fn send_photo(&self, chat_id: i64, image: Vec<u8>) -> Result<i64, RelayError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError>;

    /// Remove the inline keyboard from a previously sent message.
    async fn clear_reply_markup(&self, chat_id: i64, message_id: i64) -> Result<(), RelayError>;

    /// Acknowledge a button press (the toast shown to the user).
    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), RelayError>;
}
