//! NPC Generator Engine library.
//!
//! This crate contains all server-side code for the NPC generator.
//!
//! ## Structure
//!
//! - `use_cases/` - Character generation, chat, active context, assets, presets
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition
//! - `prompt_templates` - Fixed prompt text sent to the models

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod prompt_templates;
pub mod use_cases;

/// Shared fixtures for unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
