use crate::domain::model::{ChatMessage, ChatRequest};
use crate::domain::ports::ModelGateway;
use crate::utils::error::{RelayError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Ollama `/api/chat` 非串流呼叫
pub struct OllamaGateway {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaGateway {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigValidationError {
                field: "model".to_string(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    async fn generate(&self, request: &ChatRequest) -> Result<String> {
        let body = ChatBody {
            model: &self.model,
            messages: &request.messages,
            stream: false,
        };

        tracing::debug!("Making generation request to: {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::transport("generation request failed", e))?;

        let status = response.status();
        tracing::debug!("Generation service response status: {}", status);

        if !status.is_success() {
            tracing::error!("❌ Generation service returned HTTP {}", status.as_u16());
            return Err(RelayError::upstream_status(status.as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| RelayError::transport("generation response unreadable", e))?;

        parsed
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| RelayError::Gateway {
                message: "response has no message.content field".to_string(),
                status: Some(status.as_u16()),
                source: None,
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
