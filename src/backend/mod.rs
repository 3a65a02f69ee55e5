use crate::core::error::RelayError;
use async_trait::async_trait;
use serde::Deserialize;

pub mod base_client;
pub mod together;

#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat completion response, kept loose on purpose: the mediator decides what
/// a missing choice or missing content means, not the adapter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

/// Image generation response; each candidate carries a base64 payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageBatch {
    #[serde(default, rename = "data")]
    pub images: Vec<ImageCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageCandidate {
    pub b64_json: Option<String>,
}

/// The inference API seam. Implemented by [`together::TogetherBackend`] in
/// production and by recording mocks in tests.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn chat_complete(
        &self,
        prompt: &str,
        model: &str,
        params: SamplingParams,
    ) -> Result<ChatCompletion, RelayError>;

    async fn generate_images(
        &self,
        prompt: &str,
        model: &str,
        count: u32,
        steps: u32,
    ) -> Result<ImageBatch, RelayError>;
}
