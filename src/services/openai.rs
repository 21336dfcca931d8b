use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::services::ai_service::VisionModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageData },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageData {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiVisionClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiVisionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl VisionModel for OpenAiVisionClient {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, AnalysisError> {
        log::info!("🤖 Sending request to {} with model: {}", self.endpoint(), request.model);
        if log::log_enabled!(log::Level::Debug) {
            let size = serde_json::to_vec(request).map(|b| b.len()).unwrap_or(0);
            log::debug!("📤 Request payload size: {} bytes", size);
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log::error!("❌ Could not reach vision API: {}", e);
                AnalysisError::NetworkFailure(e.to_string())
            })?;

        let status = response.status();
        log::debug!("📥 Vision API response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Vision API error ({}): {}", status, error_text);
            return Err(map_upstream_failure(status.as_u16(), &error_text));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AnalysisError::NetworkFailure(e.to_string()))?;
        log::debug!("📄 Raw vision API response size: {} bytes", response_text.len());

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            log::error!("❌ Vision API envelope could not be decoded: {}", e);
            AnalysisError::Internal(format!("invalid chat completion envelope: {}", e))
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                log::error!("❌ Vision API returned no content");
                AnalysisError::EmptyResponse
            })?;

        log::debug!("💬 Vision API content length: {} chars", content.len());
        Ok(content)
    }
}

/// Turn a non-2xx upstream reply into the matching error.
pub fn map_upstream_failure(status: u16, body: &str) -> AnalysisError {
    match status {
        401 => AnalysisError::InvalidCredential,
        429 => AnalysisError::RateLimited,
        _ => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
                .unwrap_or_else(|| "Erro desconhecido".to_string());
            AnalysisError::UpstreamError { status, message }
        }
    }
}
