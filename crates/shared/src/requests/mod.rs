//! Request bodies accepted by the HTTP surface.

mod characters;
mod chat;
mod config;
mod images;

pub use characters::{EnvironmentRef, GenerateCharactersRequest, SuggestNamesRequest};
pub use chat::ChatRequest;
pub use config::{
    LoadCharacterRequest, LoadEnvironmentRequest, SaveCharacterRequest, SaveEnvironmentRequest,
};
pub use images::{ImageGenerateRequest, ImageSize, ImageTo3dRequest, UpsertPresetRequest};
