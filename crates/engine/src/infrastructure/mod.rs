//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies plus the
//! file-backed stores and the gated generation client.

pub mod admission;
pub mod asset_store;
pub mod cache;
pub mod clock;
pub mod generation_client;
pub mod memory;
pub mod mesh_converter;
pub mod ports;
pub mod preset_store;
pub mod settings;
pub mod template_store;
pub mod together;
