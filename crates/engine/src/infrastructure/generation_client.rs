//! Generation Client: the single path to the text and image inference endpoints.
//!
//! Every outbound call runs on its own spawned task behind the shared
//! [`AdmissionGate`]. A caller that stops waiting does not cancel the call.
//! Each operation issues exactly one request; retries belong to callers.

use std::sync::Arc;
use std::time::Instant;

use npcgen_domain::{ConversationTurn, SpeakerRole};

use crate::infrastructure::admission::AdmissionGate;
use crate::infrastructure::ports::{
    ChatMessage, ImageGenError, ImageGenPort, ImageRequest, ImageResult, LlmError, LlmPort,
    LlmRequest, MeshConverterError, MeshConverterPort,
};
use crate::prompt_templates::system::{CHARACTER_DESIGNER, NAME_SUGGESTER};

const CHARACTER_TEMPERATURE: f32 = 0.9;
const NAMES_TEMPERATURE: f32 = 0.9;
const DIALOGUE_TEMPERATURE: f32 = 0.7;
const DIALOGUE_MAX_TOKENS: u32 = 2000;

/// Why an outbound call failed. Each upstream failure mode stays distinct.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream call timed out")]
    Timeout,
    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Upstream payload malformed: {0}")]
    MalformedPayload(String),
    #[error("Upstream request failed: {0}")]
    Transport(String),
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid upstream request: {0}")]
    InvalidRequest(String),
}

impl From<LlmError> for UpstreamError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Timeout => Self::Timeout,
            LlmError::Status { status, body } => Self::Status { status, body },
            LlmError::InvalidResponse(msg) => Self::MalformedPayload(msg),
            LlmError::RequestFailed(msg) => Self::Transport(msg),
        }
    }
}

impl From<ImageGenError> for UpstreamError {
    fn from(e: ImageGenError) -> Self {
        match e {
            ImageGenError::Timeout => Self::Timeout,
            ImageGenError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            ImageGenError::GenerationFailed(msg) => Self::Transport(msg),
            ImageGenError::Unavailable => Self::Unavailable("image generation".to_string()),
        }
    }
}

impl From<MeshConverterError> for UpstreamError {
    fn from(e: MeshConverterError) -> Self {
        match e {
            MeshConverterError::ConversionFailed(msg) => Self::Transport(msg),
            MeshConverterError::Unavailable => Self::Unavailable("mesh converter".to_string()),
        }
    }
}

/// The system prompt and stop sequences for one dialogue completion.
#[derive(Debug, Clone, PartialEq)]
pub struct DialoguePrompt {
    pub system: String,
    pub stop: Vec<String>,
}

#[derive(Clone)]
pub struct GenerationClient {
    character_llm: Arc<dyn LlmPort>,
    dialogue_llm: Arc<dyn LlmPort>,
    images: Arc<dyn ImageGenPort>,
    mesh: Option<Arc<dyn MeshConverterPort>>,
    gate: Arc<AdmissionGate>,
}

impl GenerationClient {
    pub fn new(
        character_llm: Arc<dyn LlmPort>,
        dialogue_llm: Arc<dyn LlmPort>,
        images: Arc<dyn ImageGenPort>,
        gate: Arc<AdmissionGate>,
    ) -> Self {
        Self {
            character_llm,
            dialogue_llm,
            images,
            mesh: None,
            gate,
        }
    }

    pub fn with_mesh_converter(mut self, mesh: Arc<dyn MeshConverterPort>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// Ask for one character profile as a JSON object. Returns the raw text.
    pub async fn generate_character(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request = LlmRequest::new(vec![ChatMessage::user(prompt)])
            .with_system_prompt(CHARACTER_DESIGNER)
            .with_temperature(CHARACTER_TEMPERATURE)
            .with_json_output();
        self.complete("character", Arc::clone(&self.character_llm), request)
            .await
    }

    /// Ask for a `{"names": [...]}` object. Returns the raw text.
    pub async fn generate_names(&self, prompt: &str) -> Result<String, UpstreamError> {
        let request = LlmRequest::new(vec![ChatMessage::user(prompt)])
            .with_system_prompt(NAME_SUGGESTER)
            .with_temperature(NAMES_TEMPERATURE)
            .with_json_output();
        self.complete("names", Arc::clone(&self.character_llm), request)
            .await
    }

    /// Continue a conversation in character. `history` ends with the player's
    /// current message. Returns the raw completion, reasoning and all.
    pub async fn generate_dialogue(
        &self,
        prompt: &DialoguePrompt,
        history: &[ConversationTurn],
    ) -> Result<String, UpstreamError> {
        let messages = history
            .iter()
            .map(|turn| match turn.speaker {
                SpeakerRole::Player => ChatMessage::user(turn.text.clone()),
                SpeakerRole::Npc => ChatMessage::assistant(turn.text.clone()),
            })
            .collect();
        let request = LlmRequest::new(messages)
            .with_system_prompt(prompt.system.clone())
            .with_temperature(DIALOGUE_TEMPERATURE)
            .with_max_tokens(Some(DIALOGUE_MAX_TOKENS))
            .with_stop(prompt.stop.clone());
        self.complete("dialogue", Arc::clone(&self.dialogue_llm), request)
            .await
    }

    /// Generate one image. Reference URLs are checked before a permit is taken.
    pub async fn generate_image(&self, request: ImageRequest) -> Result<ImageResult, UpstreamError> {
        validate_reference_images(&request.reference_images)?;
        let images = Arc::clone(&self.images);
        let (width, height) = (request.width, request.height);
        let started = Instant::now();
        let result = self
            .spawn_gated(async move { images.generate(request).await.map_err(UpstreamError::from) })
            .await;
        match &result {
            Ok(image) => tracing::info!(
                width,
                height,
                size = image.image_data.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Image generated"
            ),
            Err(e) => tracing::warn!(width, height, error = %e, "Image generation failed"),
        }
        result
    }

    /// Convert image bytes to a GLB mesh through the configured converter.
    pub async fn convert_to_mesh(&self, image: Vec<u8>) -> Result<Vec<u8>, UpstreamError> {
        let Some(mesh) = self.mesh.clone() else {
            return Err(MeshConverterError::Unavailable.into());
        };
        let started = Instant::now();
        let result = self
            .spawn_gated(async move { mesh.convert(image).await.map_err(UpstreamError::from) })
            .await;
        if let Ok(glb) = &result {
            tracing::info!(
                size = glb.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Mesh conversion finished"
            );
        }
        result
    }

    async fn complete(
        &self,
        operation: &'static str,
        llm: Arc<dyn LlmPort>,
        request: LlmRequest,
    ) -> Result<String, UpstreamError> {
        let started = Instant::now();
        let result = self
            .spawn_gated(async move {
                llm.generate(request)
                    .await
                    .map(|response| response.content)
                    .map_err(UpstreamError::from)
            })
            .await;
        match &result {
            Ok(text) => tracing::info!(
                operation,
                chars = text.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Completion received"
            ),
            Err(e) => tracing::warn!(operation, error = %e, "Completion failed"),
        }
        result
    }

    /// Run `call` on its own task behind the admission gate.
    async fn spawn_gated<F, T>(&self, call: F) -> Result<T, UpstreamError>
    where
        F: std::future::Future<Output = Result<T, UpstreamError>> + Send + 'static,
        T: Send + 'static,
    {
        let gate = Arc::clone(&self.gate);
        let handle = tokio::spawn(async move { gate.run(call).await });
        match handle.await {
            Ok(Ok(result)) => result,
            Ok(Err(closed)) => Err(UpstreamError::Unavailable(closed.to_string())),
            Err(join) => Err(UpstreamError::Transport(format!("generation task failed: {}", join))),
        }
    }
}

/// Reference images must be absolute public http(s) URLs the provider can fetch.
pub fn validate_reference_images(urls: &[String]) -> Result<(), UpstreamError> {
    for raw in urls {
        let parsed = url::Url::parse(raw).map_err(|_| {
            UpstreamError::InvalidRequest(format!(
                "reference image '{}' must be an absolute http(s) URL",
                raw
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UpstreamError::InvalidRequest(format!(
                "reference image '{}' must use http or https",
                raw
            )));
        }
        let local = match parsed.host() {
            Some(url::Host::Domain(d)) => d.eq_ignore_ascii_case("localhost"),
            Some(url::Host::Ipv4(ip)) => ip.is_loopback() || ip.is_unspecified(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback() || ip.is_unspecified(),
            None => true,
        };
        if local {
            return Err(UpstreamError::InvalidRequest(format!(
                "reference image '{}' is not publicly reachable",
                raw
            )));
        }
    }
    Ok(())
}
