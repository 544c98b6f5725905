use std::sync::Arc;

use crate::infrastructure::memory::MemoryStore;
use crate::use_cases::context::ActiveContext;

use super::{resolve_session, ConversationError};

/// Forget a session: its turn log and its vector collection.
pub struct ClearHistory {
    context: Arc<ActiveContext>,
    memory: Arc<MemoryStore>,
}

impl ClearHistory {
    pub fn new(context: Arc<ActiveContext>, memory: Arc<MemoryStore>) -> Self {
        Self { context, memory }
    }

    /// Returns the cleared session id and how many logged turns were dropped.
    pub async fn execute(
        &self,
        session_id: Option<String>,
    ) -> Result<(String, usize), ConversationError> {
        let session_id = match session_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => {
                let character = self.context.character().await?;
                resolve_session(None, &character)
            }
        };
        let removed = self.memory.clear(&session_id).await?;
        Ok((session_id, removed))
    }
}
