//! Recording fakes for the generation ports.
//!
//! Use these where a test needs to inspect what was sent, in order. For
//! simple call expectations prefer the mockall mocks in `ports`.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::infrastructure::ports::{
    FinishReason, ImageGenError, ImageGenPort, ImageRequest, ImageResult, LlmError, LlmPort,
    LlmRequest, LlmResponse,
};

/// Smallest valid PNG (1x1 transparent pixel).
pub fn minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
        0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, // RGBA + CRC
        0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, // IDAT
        0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4,
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82, // IEND
    ]
}

/// Returns a placeholder PNG for every request and records the requests.
#[derive(Default)]
pub struct RecordingImageGen {
    requests: Mutex<Vec<ImageRequest>>,
}

impl RecordingImageGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ImageGenPort for RecordingImageGen {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        self.requests.lock().expect("requests lock").push(request);
        Ok(ImageResult {
            image_data: minimal_png(),
            format: "png".to_string(),
        })
    }
}

/// Replays queued completions in order and records every request.
///
/// Once the script runs out, every further call fails.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(script: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new([Ok(text.to_string())])
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmPort for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().expect("requests lock").push(request);
        let next = self.script.lock().expect("script lock").pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                finish_reason: FinishReason::Stop,
                usage: None,
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::RequestFailed("script exhausted".to_string())),
        }
    }
}
