use crate::core::error::RelayError;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Bearer-auth JSON POST client shared by the inference endpoints.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    pub async fn post<T, R>(&self, path: &str, payload: &T) -> Result<R, RelayError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::Api(format!(
                "API returned status {}: {}",
                status, body
            )));
        }

        let parsed = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}
