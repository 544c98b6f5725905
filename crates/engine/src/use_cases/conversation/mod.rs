//! Conversation use cases.
//!
//! A session is identified by the `X-Session-Id` header when present,
//! otherwise by the active character's name with spaces replaced by `_`.

use std::sync::Arc;

use npcgen_domain::CharacterProfile;

use crate::infrastructure::generation_client::UpstreamError;
use crate::infrastructure::ports::VectorStoreError;
use crate::use_cases::context::ContextError;

mod chat;
mod clear;

pub use chat::{Chat, ChatInput, ChatReply};
pub use clear::ClearHistory;

/// Container for conversation use cases.
pub struct ConversationUseCases {
    pub chat: Arc<Chat>,
    pub clear_history: Arc<ClearHistory>,
}

impl ConversationUseCases {
    pub fn new(chat: Arc<Chat>, clear_history: Arc<ClearHistory>) -> Self {
        Self {
            chat,
            clear_history,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("The model returned no dialogue")]
    EmptyReply,
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Memory error: {0}")]
    Memory(#[from] VectorStoreError),
}

pub(crate) fn resolve_session(explicit: Option<&str>, character: &CharacterProfile) -> String {
    explicit
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| character.collection_name())
}
