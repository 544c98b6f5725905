//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area. Use cases combine
//! the pure components (prompt builder, response validator) with the
//! infrastructure (generation client, stores, memory).

pub mod assets;
pub mod character;
pub mod context;
pub mod conversation;
pub mod presets;
pub mod prompt_builder;
pub mod response_validator;

pub use assets::AssetUseCases;
pub use character::CharacterUseCases;
pub use context::ActiveContext;
pub use conversation::ConversationUseCases;
pub use presets::PresetUseCases;
