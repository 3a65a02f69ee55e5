use crate::backend::base_client::HttpClient;
use crate::backend::{ChatCompletion, ImageBatch, InferenceBackend, SamplingParams};
use crate::core::error::RelayError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

pub const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";

/// Extra attempts after the first on network errors.
const MAX_RETRIES: u32 = 2;

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatCompletionMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ImageGenerationRequest {
    model: String,
    prompt: String,
    n: u32,
    steps: u32,
    response_format: String,
}

/// Together API client. Speaks the OpenAI-compatible chat completions
/// endpoint plus Together's image generation endpoint.
#[derive(Clone)]
pub struct TogetherBackend {
    client: HttpClient,
}

impl TogetherBackend {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: HttpClient::new(base_url, api_key),
        }
    }

    async fn post_with_retry<T, R>(&self, path: &str, payload: &T) -> Result<R, RelayError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        retry_network(|| self.client.post(path, payload)).await
    }
}

/// Run a request with up to [`MAX_RETRIES`] extra attempts on network
/// errors. API and serialization errors are returned as-is.
async fn retry_network<T, F, Fut>(mut request: F) -> Result<T, RelayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RelayError>>,
{
    let mut attempt = 0;
    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(RelayError::Network(reason)) if attempt < MAX_RETRIES => {
                attempt += 1;
                tracing::warn!(attempt, %reason, "inference request failed, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

#[async_trait]
impl InferenceBackend for TogetherBackend {
    async fn chat_complete(
        &self,
        prompt: &str,
        model: &str,
        params: SamplingParams,
    ) -> Result<ChatCompletion, RelayError> {
        let payload = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![ChatCompletionMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        self.post_with_retry("chat/completions", &payload).await
    }

    async fn generate_images(
        &self,
        prompt: &str,
        model: &str,
        count: u32,
        steps: u32,
    ) -> Result<ImageBatch, RelayError> {
        let payload = ImageGenerationRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            n: count,
            steps,
            response_format: "b64_json".to_string(),
        };

        self.post_with_retry("images/generations", &payload).await
    }
}
