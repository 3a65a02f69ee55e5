use crate::core::error::RelayError;
use crate::mediator::{InferenceMediator, TurnResult, WENT_WRONG};
use crate::models;
use crate::session::SessionStore;
use crate::transport::{ChatTransport, InlineKeyboard};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;
use tokio::sync::watch;

const THINKING: &str = "Thinking... 🤖";
const BACKEND_DOWN: &str = "⚠️ The model backend is unavailable. Please try again later.";

/// Orchestrates one bot interaction: commands, model-selection button
/// presses, and free-text turns. Owns no state of its own; sessions live in
/// the injected [`SessionStore`].
pub struct ConversationController {
    transport: Arc<dyn ChatTransport>,
    sessions: Arc<SessionStore>,
    mediator: InferenceMediator,
    stop_tx: watch::Sender<bool>,
}

impl ConversationController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        sessions: Arc<SessionStore>,
        mediator: InferenceMediator,
        stop_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            transport,
            sessions,
            mediator,
            stop_tx,
        }
    }

    fn model_menu() -> InlineKeyboard {
        InlineKeyboard::rows(models::catalog().iter().map(|entry| entry.label))
    }

    /// `/start`: greeting plus the model menu.
    pub async fn handle_start(&self, chat_id: i64, first_name: &str) -> Result<(), RelayError> {
        self.transport
            .send_menu(
                chat_id,
                &format!("Hello {first_name}! Select an AI model:"),
                Self::model_menu(),
            )
            .await?;
        Ok(())
    }

    /// `/set`: the model menu alone.
    pub async fn handle_set(&self, chat_id: i64) -> Result<(), RelayError> {
        self.transport
            .send_menu(chat_id, "Choose your AI model:", Self::model_menu())
            .await?;
        Ok(())
    }

    /// `/clear`: best-effort bulk delete. Sends a status message, then walks
    /// every message id from that status id down to 0 inclusive. Relies on
    /// Telegram's mostly-dense monotonic ids, so cost is O(status id); each
    /// failure is logged and the walk continues.
    pub async fn handle_clear(&self, chat_id: i64) -> Result<(), RelayError> {
        let status_id = self.transport.send_message(chat_id, "clearing...").await?;

        for message_id in (0..=status_id).rev() {
            if let Err(err) = self.transport.delete_message(chat_id, message_id).await {
                tracing::debug!(chat_id, message_id, %err, "delete failed, continuing");
            }
        }

        Ok(())
    }

    /// `/shutdown`: confirm first, then stop the polling loop. The stop
    /// signal is only sent once the confirmation send has completed.
    pub async fn handle_shutdown(&self, chat_id: i64) -> Result<(), RelayError> {
        self.transport
            .send_message(chat_id, "Shutting down the bot...")
            .await?;
        let _ = self.stop_tx.send(true);
        Ok(())
    }

    /// Button press on the model menu. For a catalog label this records the
    /// selection and issues three side effects concurrently: acknowledge the
    /// press, strip the menu's keyboard, and confirm textually. None of them
    /// depends on another and none rolls back when a sibling fails. Unknown
    /// labels get no mutation and no feedback.
    pub async fn handle_selection(
        &self,
        user_id: i64,
        chat_id: i64,
        menu_message_id: i64,
        callback_id: &str,
        label: &str,
    ) -> Result<(), RelayError> {
        if models::resolve(label).is_none() {
            return Ok(());
        }

        self.sessions.select(user_id, label);

        let ack_text = format!("Model set to {label}!");
        let confirm_text = format!("✅ You selected {label}. Now send a message!");
        let (answered, stripped, confirmed) = tokio::join!(
            self.transport.answer_callback(callback_id, &ack_text),
            self.transport.clear_reply_markup(chat_id, menu_message_id),
            self.transport.send_message(chat_id, &confirm_text),
        );

        for outcome in [answered, stripped, confirmed.map(|_| ())] {
            if let Err(err) = outcome {
                tracing::warn!(chat_id, %err, "selection side effect failed");
            }
        }

        Ok(())
    }

    /// One free-text turn: transient status, inference, delivery, status
    /// cleanup. Delivery and cleanup are independent side effects issued in
    /// sequence; neither is conditioned on the other succeeding.
    pub async fn handle_turn(
        &self,
        user_id: i64,
        chat_id: i64,
        text: &str,
    ) -> Result<(), RelayError> {
        let status_id = self.transport.send_message(chat_id, THINKING).await?;

        let result = self.mediator.converse(user_id, text).await;
        self.deliver(chat_id, result).await;

        if let Err(err) = self.transport.delete_message(chat_id, status_id).await {
            tracing::debug!(chat_id, status_id, %err, "status cleanup failed");
        }

        Ok(())
    }

    async fn deliver(&self, chat_id: i64, result: TurnResult) {
        let delivery = match result {
            TurnResult::Text(text) => self.transport.send_message(chat_id, &text).await,
            TurnResult::Error(message) => self.transport.send_message(chat_id, &message).await,
            TurnResult::Image(payload) => match BASE64.decode(&payload) {
                Ok(bytes) => self.transport.send_photo(chat_id, bytes).await,
                Err(err) => {
                    tracing::error!(chat_id, %err, "image payload is not valid base64");
                    self.transport.send_message(chat_id, WENT_WRONG).await
                }
            },
            TurnResult::BackendFault(reason) => {
                tracing::error!(chat_id, %reason, "inference backend call failed");
                self.transport.send_message(chat_id, BACKEND_DOWN).await
            }
        };

        if let Err(err) = delivery {
            tracing::error!(chat_id, %err, "result delivery failed");
        }
    }
}
