//! NPC Generator Shared - wire DTOs for the HTTP surface
//!
//! This crate contains the request and response bodies exchanged between the
//! backend and its clients (web UI, scripts, tests):
//! - Chat and memory management
//! - Character generation (single, bulk, name suggestions)
//! - Active character/environment configuration
//! - Image generation, uploads, presets and 3D conversion
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, uuid and the domain vocabulary
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Raw ids on the wire** - use `uuid::Uuid`, not domain id newtypes

pub mod requests;
pub mod responses;

pub use requests::{
    ChatRequest, EnvironmentRef, GenerateCharactersRequest, ImageGenerateRequest, ImageSize,
    ImageTo3dRequest, LoadCharacterRequest, LoadEnvironmentRequest, SaveCharacterRequest,
    SaveEnvironmentRequest, SuggestNamesRequest, UpsertPresetRequest,
};
pub use responses::{
    CharacterResult, ChatResponse, ClearHistoryResponse, ConfigFilesResponse, DeletePresetResponse,
    ErrorBody, GenerateCharactersResponse, HealthResponse, ImageGenerateResponse,
    ImageTo3dResponse, ImageUploadResponse, LoadCharacterResponse, LoadEnvironmentResponse,
    PresetDto, PresetsResponse, SaveTemplateResponse, SuggestNamesResponse, UpsertPresetResponse,
};
