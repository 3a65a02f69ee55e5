use crate::backend::{InferenceBackend, SamplingParams};
use crate::core::error::RelayError;
use crate::models::{self, ModelKind};
use crate::session::SessionStore;
use std::sync::Arc;

/// User-facing substitute for any empty or malformed backend response. The
/// chat surface never shows a raw backend fault to an end user.
pub const WENT_WRONG: &str = "✨Something Went Wrong! Please try again later.";

const TEMPERATURE: f32 = 0.9;
const MAX_TOKENS: u32 = 150;
const IMAGE_COUNT: u32 = 4;
const IMAGE_STEPS: u32 = 4;

/// Outcome of one turn, discriminated so the controller can route delivery.
/// Backend call failures surface as `BackendFault` instead of an `Err` so a
/// turn is never silently lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResult {
    Text(String),
    /// Base64-encoded image payload (first candidate of the batch).
    Image(String),
    /// Friendly message substituted for a malformed backend response.
    Error(String),
    /// The backend call itself failed (network/timeout/auth).
    BackendFault(String),
}

/// Mediates one turn between the chat transport and the inference backend:
/// resolves the user's model selection, picks the text or image path, and
/// normalizes the response to a displayable payload.
pub struct InferenceMediator {
    sessions: Arc<SessionStore>,
    backend: Arc<dyn InferenceBackend>,
}

impl InferenceMediator {
    pub fn new(sessions: Arc<SessionStore>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self { sessions, backend }
    }

    pub async fn converse(&self, user_id: i64, text: &str) -> TurnResult {
        let backend_id = self.sessions.selection(user_id);

        let outcome = match models::kind_of(&backend_id) {
            ModelKind::Image => self.generate_image(text, &backend_id).await,
            ModelKind::Text => self.complete_text(text, &backend_id).await,
        };

        match outcome {
            Ok(result) => result,
            Err(err) => TurnResult::BackendFault(err.to_string()),
        }
    }

    async fn complete_text(&self, text: &str, model: &str) -> Result<TurnResult, RelayError> {
        let params = SamplingParams {
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let completion = self.backend.chat_complete(text, model, params).await?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone());

        Ok(match content {
            Some(content) => TurnResult::Text(content),
            None => TurnResult::Error(WENT_WRONG.to_string()),
        })
    }

    async fn generate_image(&self, text: &str, model: &str) -> Result<TurnResult, RelayError> {
        let batch = self
            .backend
            .generate_images(text, model, IMAGE_COUNT, IMAGE_STEPS)
            .await?;

        let payload = batch
            .images
            .first()
            .and_then(|candidate| candidate.b64_json.clone());

        Ok(match payload {
            Some(payload) => TurnResult::Image(payload),
            None => TurnResult::Error(WENT_WRONG.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatChoice, ChatChoiceMessage, ChatCompletion, ImageBatch, ImageCandidate};
    use async_trait::async_trait;
    use std::sync::Mutex;

    enum MockReply {
        Chat(ChatCompletion),
        Images(ImageBatch),
        Fail(String),
    }

    struct MockBackend {
        reply: MockReply,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockBackend {
        fn new(reply: MockReply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn completion(content: &str) -> ChatCompletion {
            ChatCompletion {
                choices: vec![ChatChoice {
                    message: ChatChoiceMessage {
                        content: Some(content.to_string()),
                    },
                }],
            }
        }
    }

    #[async_trait]
    impl InferenceBackend for MockBackend {
        async fn chat_complete(
            &self,
            prompt: &str,
            model: &str,
            _params: SamplingParams,
        ) -> Result<ChatCompletion, RelayError> {
            self.calls
                .lock()
                .unwrap()
                .push(("chat".to_string(), format!("{model}: {prompt}")));
            match &self.reply {
                MockReply::Chat(completion) => Ok(completion.clone()),
                MockReply::Fail(reason) => Err(RelayError::Network(reason.clone())),
                MockReply::Images(_) => panic!("unexpected chat call"),
            }
        }

        async fn generate_images(
            &self,
            prompt: &str,
            model: &str,
            count: u32,
            steps: u32,
        ) -> Result<ImageBatch, RelayError> {
            self.calls
                .lock()
                .unwrap()
                .push(("image".to_string(), format!("{model}/{count}/{steps}: {prompt}")));
            match &self.reply {
                MockReply::Images(batch) => Ok(batch.clone()),
                MockReply::Fail(reason) => Err(RelayError::Network(reason.clone())),
                MockReply::Chat(_) => panic!("unexpected image call"),
            }
        }
    }

    fn mediator(backend: MockBackend) -> (InferenceMediator, Arc<SessionStore>, Arc<MockBackend>) {
        let sessions = Arc::new(SessionStore::new());
        let backend = Arc::new(backend);
        let mediator = InferenceMediator::new(sessions.clone(), backend.clone());
        (mediator, sessions, backend)
    }

    #[tokio::test]
    async fn text_turn_returns_first_choice_content() {
        let (mediator, _, _) =
            mediator(MockBackend::new(MockReply::Chat(MockBackend::completion("hello"))));

        let result = mediator.converse(7, "hi").await;
        assert_eq!(result, TurnResult::Text("hello".to_string()));
    }

    #[tokio::test]
    async fn empty_choices_become_friendly_error() {
        let (mediator, _, _) =
            mediator(MockBackend::new(MockReply::Chat(ChatCompletion::default())));

        let result = mediator.converse(7, "hi").await;
        assert_eq!(result, TurnResult::Error(WENT_WRONG.to_string()));
    }

    #[tokio::test]
    async fn missing_content_becomes_friendly_error() {
        let completion = ChatCompletion {
            choices: vec![ChatChoice {
                message: ChatChoiceMessage { content: None },
            }],
        };
        let (mediator, _, _) = mediator(MockBackend::new(MockReply::Chat(completion)));

        let result = mediator.converse(7, "hi").await;
        assert_eq!(result, TurnResult::Error(WENT_WRONG.to_string()));
    }

    #[tokio::test]
    async fn image_selection_takes_first_candidate() {
        let batch = ImageBatch {
            images: vec![
                ImageCandidate {
                    b64_json: Some("Zmlyc3Q=".to_string()),
                },
                ImageCandidate {
                    b64_json: Some("c2Vjb25k".to_string()),
                },
                ImageCandidate {
                    b64_json: Some("dGhpcmQ=".to_string()),
                },
                ImageCandidate {
                    b64_json: Some("Zm91cnRo".to_string()),
                },
            ],
        };
        let (mediator, sessions, backend) = mediator(MockBackend::new(MockReply::Images(batch)));
        sessions.select(7, "FLUX.1 Schnell Free");

        let result = mediator.converse(7, "a cat").await;
        assert_eq!(result, TurnResult::Image("Zmlyc3Q=".to_string()));

        // Fixed candidate count and step count on the image path.
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].1, format!("{}/4/4: a cat", models::IMAGE_MODEL));
    }

    #[tokio::test]
    async fn empty_image_batch_becomes_friendly_error() {
        let (mediator, sessions, _) =
            mediator(MockBackend::new(MockReply::Images(ImageBatch::default())));
        sessions.select(7, "FLUX.1 Schnell Free");

        let result = mediator.converse(7, "a cat").await;
        assert_eq!(result, TurnResult::Error(WENT_WRONG.to_string()));
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_fault() {
        let (mediator, _, _) =
            mediator(MockBackend::new(MockReply::Fail("connection refused".to_string())));

        match mediator.converse(7, "hi").await {
            TurnResult::BackendFault(reason) => assert!(reason.contains("connection refused")),
            other => panic!("expected BackendFault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn default_selection_uses_default_model() {
        let (mediator, _, backend) =
            mediator(MockBackend::new(MockReply::Chat(MockBackend::completion("ok"))));

        mediator.converse(99, "hi").await;

        let calls = backend.calls.lock().unwrap();
        assert!(calls[0].1.starts_with(models::default_entry().backend_id));
    }
}
