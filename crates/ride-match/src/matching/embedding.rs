use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{EmbeddingConfig, EmbeddingProvider};

const MAX_ERROR_BODY: usize = 256;

/// Text-to-vector capability backed by an external embedding service.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Failure talking to the embedding service. All variants trigger rule-only fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding client could not be built: {0}")]
    Client(String),
    #[error("embedding request failed: {0}")]
    Transport(String),
    #[error("embedding service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// JSON-over-HTTP embedding client speaking either the OpenAI or a minimal custom dialect.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| EmbeddingError::Client(err.to_string()))?;

        Ok(Self { client, config })
    }

    fn payload(&self, text: &str) -> Value {
        match self.config.provider {
            EmbeddingProvider::OpenAi => json!({ "input": text, "model": self.config.model }),
            EmbeddingProvider::Custom => json!({ "text": text }),
        }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self.client.post(&self.config.api_url).json(&self.payload(text));
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| EmbeddingError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|err| EmbeddingError::MalformedResponse(format!("invalid JSON: {err}")))?;

        parse_embedding(&value)
    }
}

/// Extracts the vector from `data[0].embedding`, `embedding`, or `embeddings[0]`.
pub(crate) fn parse_embedding(value: &Value) -> Result<Vec<f32>, EmbeddingError> {
    let raw = value
        .pointer("/data/0/embedding")
        .or_else(|| value.get("embedding"))
        .or_else(|| value.pointer("/embeddings/0"))
        .ok_or_else(|| {
            EmbeddingError::MalformedResponse("response did not contain an embedding".to_string())
        })?;

    let items = raw.as_array().ok_or_else(|| {
        EmbeddingError::MalformedResponse("embedding is not an array".to_string())
    })?;
    if items.is_empty() {
        return Err(EmbeddingError::MalformedResponse(
            "embedding vector is empty".to_string(),
        ));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let number = item.as_f64().ok_or_else(|| {
                EmbeddingError::MalformedResponse(format!("component {index} is not a number"))
            })?;
            // Values beyond f32 range become infinite after the narrowing cast.
            let component = number as f32;
            if component.is_finite() {
                Ok(component)
            } else {
                Err(EmbeddingError::MalformedResponse(format!(
                    "component {index} is out of range"
                )))
            }
        })
        .collect()
}
