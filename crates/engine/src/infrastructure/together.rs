//! Together AI client (OpenAI-compatible API)
//!
//! One client type serves chat completions, image generation and embeddings.
//! Pointing `base_url` at Ollama or any other OpenAI-compatible server works
//! for chat; the API key is only sent when configured.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::infrastructure::asset_store::sniff_image_format;
use crate::infrastructure::ports::{
    EmbeddingError, EmbeddingPort, FinishReason, ImageGenError, ImageGenPort, ImageRequest,
    ImageResult, LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole, ResponseFormat,
    TokenUsage,
};
use crate::infrastructure::settings::{
    DEFAULT_CHARACTER_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_LLM_BASE_URL,
};

/// Client for Together's OpenAI-compatible API
#[derive(Clone)]
pub struct TogetherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    image_model: String,
    embedding_model: String,
}

impl TogetherClient {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: DEFAULT_CHARACTER_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_chat_model(mut self, model: &str) -> Self {
        self.chat_model = model.to_string();
        self
    }

    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = model.to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self.client.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageGenError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_image_transport)?;

        if !response.status().is_success() {
            return Err(ImageGenError::GenerationFailed(format!(
                "Image download returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl Default for TogetherClient {
    fn default() -> Self {
        Self::new(DEFAULT_LLM_BASE_URL, None, Duration::from_secs(120))
    }
}

#[async_trait]
impl LlmPort for TogetherClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_request = OpenAIChatRequest {
            model: self.chat_model.clone(),
            messages: build_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stop: (!request.stop.is_empty()).then(|| request.stop.clone()),
            response_format: match request.response_format {
                ResponseFormat::JsonObject => Some(OpenAIResponseFormat {
                    r#type: "json_object".to_string(),
                }),
                ResponseFormat::Text => None,
            },
        };

        let response = self
            .post("/v1/chat/completions")
            .json(&api_request)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(LlmError::from_transport)?;
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let api_response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        convert_response(api_response)
    }
}

#[async_trait]
impl ImageGenPort for TogetherClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        let api_request = OpenAIImageRequest {
            model: self.image_model.clone(),
            prompt: request.prompt,
            width: request.width,
            height: request.height,
            n: 1,
            output_format: "png".to_string(),
            reference_images: (!request.reference_images.is_empty())
                .then_some(request.reference_images),
        };

        let response = self
            .post("/v1/images/generations")
            .json(&api_request)
            .send()
            .await
            .map_err(map_image_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::GenerationFailed(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        let api_response: OpenAIImageResponse = response
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(format!("Invalid response: {}", e)))?;

        let datum = api_response.data.into_iter().next().ok_or_else(|| {
            ImageGenError::GenerationFailed("No images in provider response".to_string())
        })?;

        let image_data = match (datum.b64_json, datum.url) {
            (Some(encoded), _) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ImageGenError::GenerationFailed(format!("Invalid base64: {}", e)))?,
            (None, Some(url)) => self.download(&url).await?,
            (None, None) => {
                return Err(ImageGenError::GenerationFailed(
                    "Image entry has neither url nor b64_json".to_string(),
                ))
            }
        };

        let format = sniff_image_format(&image_data).ok_or_else(|| {
            ImageGenError::GenerationFailed("Provider returned an unrecognized image".to_string())
        })?;

        Ok(ImageResult {
            image_data,
            format: format.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingPort for TogetherClient {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();

        let response = self
            .post("/v1/embeddings")
            .json(&OpenAIEmbeddingRequest {
                model: self.embedding_model.clone(),
                input: texts,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RequestFailed(format!("{}: {}", status, body)));
        }

        let mut api_response: OpenAIEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if api_response.data.len() != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                expected,
                api_response.data.len()
            )));
        }
        api_response.data.sort_by_key(|d| d.index);
        Ok(api_response.data.into_iter().map(|d| d.embedding).collect())
    }
}

fn map_image_transport(e: reqwest::Error) -> ImageGenError {
    if e.is_timeout() {
        ImageGenError::Timeout
    } else if e.is_connect() {
        ImageGenError::Unavailable
    } else {
        ImageGenError::GenerationFailed(e.to_string())
    }
}

fn build_messages(request: &LlmRequest) -> Vec<OpenAIMessage> {
    let mut messages = Vec::new();

    if let Some(system) = &request.system_prompt {
        messages.push(OpenAIMessage {
            role: "system".to_string(),
            content: Some(system.clone()),
        });
    }

    for msg in &request.messages {
        messages.push(OpenAIMessage {
            role: match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            }
            .to_string(),
            content: Some(msg.content.clone()),
        });
    }

    messages
}

fn convert_response(response: OpenAIChatResponse) -> Result<LlmResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in LLM response".to_string()))?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("stop") | Some("eos") | None => FinishReason::Stop,
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(_) => FinishReason::Unknown,
    };

    Ok(LlmResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason,
        usage: response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
    })
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    r#type: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize, Default)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIImageRequest {
    model: String,
    prompt: String,
    width: u32,
    height: u32,
    n: u32,
    output_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIImageResponse {
    data: Vec<OpenAIImageDatum>,
}

#[derive(Debug, Deserialize)]
struct OpenAIImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
