//! Domain entities

mod character_profile;
mod conversation;
mod prompt_preset;
mod world_template;

pub use character_profile::{Appearance, Background, CharacterProfile, CHARACTER_PROFILE_KEYS};
pub use conversation::{ConversationTurn, SpeakerRole};
pub use prompt_preset::{PresetKind, PromptPreset};
pub use world_template::{WorldTemplate, WORLD_TEMPLATE_KEYS};
