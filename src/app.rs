use crate::controller::ConversationController;
use crate::core::error::RelayError;
use crate::transport::telegram::{CallbackQuery, Message, TelegramApi, Update};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Backoff after a failed getUpdates poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Owns the update polling loop. Each update is dispatched to the controller
/// on its own task, so handlers for different chats run concurrently with no
/// mutual exclusion; the only shared mutable state is the session store.
pub struct Application {
    api: Arc<TelegramApi>,
    controller: Arc<ConversationController>,
    stop_rx: watch::Receiver<bool>,
}

impl Application {
    pub fn new(
        api: Arc<TelegramApi>,
        controller: Arc<ConversationController>,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            api,
            controller,
            stop_rx,
        }
    }

    pub async fn run(mut self) -> Result<(), RelayError> {
        tracing::info!("🤖 Bot is running...");
        let mut offset = 0i64;

        loop {
            let updates = tokio::select! {
                _ = self.stop_rx.changed() => break,
                result = self.api.get_updates(offset) => match result {
                    Ok(updates) => updates,
                    Err(err) => {
                        tracing::error!(%err, "getUpdates failed");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                        continue;
                    }
                },
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.dispatch(update);
            }

            if *self.stop_rx.borrow() {
                break;
            }
        }

        tracing::info!("Bot stopped");
        Ok(())
    }

    fn dispatch(&self, update: Update) {
        let controller = self.controller.clone();

        if let Some(message) = update.message {
            tokio::spawn(async move {
                if let Err(err) = handle_message(&controller, message).await {
                    tracing::error!(%err, "message handler failed");
                }
            });
        } else if let Some(callback) = update.callback_query {
            tokio::spawn(async move {
                if let Err(err) = handle_callback(&controller, callback).await {
                    tracing::error!(%err, "callback handler failed");
                }
            });
        }
    }
}

/// Strip a leading bot command from message text. Telegram may suffix
/// commands with the bot's username (`/start@relaybot`).
fn parse_command(text: &str) -> Option<&str> {
    let text = text.trim();
    let command = text.strip_prefix('/')?;
    let command = command.split_whitespace().next()?;
    Some(command.split('@').next().unwrap_or(command))
}

async fn handle_message(
    controller: &ConversationController,
    message: Message,
) -> Result<(), RelayError> {
    let chat_id = message.chat.id;
    let Some(from) = message.from else {
        return Ok(());
    };
    let text = message.text.unwrap_or_default();

    match parse_command(&text) {
        Some("start") => controller.handle_start(chat_id, &from.first_name).await,
        Some("set") => controller.handle_set(chat_id).await,
        Some("clear") => controller.handle_clear(chat_id).await,
        Some("shutdown") => controller.handle_shutdown(chat_id).await,
        // Unknown slash commands fall through to the free-text handler,
        // like any other message.
        _ => controller.handle_turn(from.id, chat_id, &text).await,
    }
}

async fn handle_callback(
    controller: &ConversationController,
    callback: CallbackQuery,
) -> Result<(), RelayError> {
    let (Some(message), Some(label)) = (callback.message, callback.data) else {
        return Ok(());
    };

    controller
        .handle_selection(
            callback.from.id,
            message.chat.id,
            message.message_id,
            &callback.id,
            &label,
        )
        .await
}
