//! NPC Generator domain types.
//!
//! Pure data and invariants: no I/O, no randomness, no clocks.

pub mod entities;
pub mod error;
pub mod ids;

pub use entities::{
    Appearance, Background, CharacterProfile, ConversationTurn, PresetKind, PromptPreset,
    SpeakerRole, WorldTemplate, CHARACTER_PROFILE_KEYS, WORLD_TEMPLATE_KEYS,
};
pub use error::DomainError;
pub use ids::{AssetId, BatchId};
