//! Chat with the active character.
//!
//! Memory is best-effort: recall and storage failures are logged and the
//! reply is still returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use npcgen_domain::ConversationTurn;

use crate::infrastructure::generation_client::GenerationClient;
use crate::infrastructure::memory::MemoryStore;
use crate::infrastructure::ports::ClockPort;
use crate::use_cases::context::ActiveContext;
use crate::use_cases::prompt_builder;
use crate::use_cases::response_validator::extract_dialogue;

use super::{resolve_session, ConversationError};

/// Excerpts fetched from memory before filtering.
const RECALL_CANDIDATES: usize = 5;
/// Excerpts placed in the prompt.
const RECALL_USED: usize = 2;
/// Most recent `[player, npc]` exchanges sent to the model.
const HISTORY_EXCHANGES: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub session_id: Option<String>,
    pub message: String,
    /// `[player, npc]` pairs the client has shown, oldest first.
    pub history: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub time_taken: Duration,
}

pub struct Chat {
    context: Arc<ActiveContext>,
    memory: Arc<MemoryStore>,
    client: GenerationClient,
    clock: Arc<dyn ClockPort>,
}

impl Chat {
    pub fn new(
        context: Arc<ActiveContext>,
        memory: Arc<MemoryStore>,
        client: GenerationClient,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            context,
            memory,
            client,
            clock,
        }
    }

    pub async fn execute(&self, input: ChatInput) -> Result<ChatReply, ConversationError> {
        let started = Instant::now();
        let message = input.message.trim();
        if message.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let character = self.context.character().await?;
        let world = self.context.environment().await?;
        let session_id = resolve_session(input.session_id.as_deref(), &character);

        let recalled = match self
            .memory
            .query(&session_id, message, RECALL_CANDIDATES)
            .await
        {
            Ok(mut excerpts) => {
                excerpts.truncate(RECALL_USED);
                excerpts
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Memory recall failed");
                Vec::new()
            }
        };

        let prompt = prompt_builder::build_dialogue_system_prompt(&character, &world, &recalled);

        let now = self.clock.now();
        let skip = input.history.len().saturating_sub(HISTORY_EXCHANGES);
        let mut turns: Vec<ConversationTurn> = input
            .history
            .iter()
            .skip(skip)
            .flat_map(|(player, npc)| {
                [
                    ConversationTurn::player(player.clone(), now),
                    ConversationTurn::npc(npc.clone(), now),
                ]
            })
            .collect();
        turns.push(ConversationTurn::player(message, now));

        let raw = self.client.generate_dialogue(&prompt, &turns).await?;
        let response = extract_dialogue(&raw);
        if response.is_empty() {
            tracing::warn!(session_id = %session_id, chars = raw.len(), "No dialogue in completion");
            return Err(ConversationError::EmptyReply);
        }

        let replied_at = self.clock.now();
        for turn in [
            ConversationTurn::player(message, now),
            ConversationTurn::npc(response.clone(), replied_at),
        ] {
            if let Err(e) = self.memory.append(&session_id, turn).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to store turn");
            }
        }

        let time_taken = started.elapsed();
        tracing::info!(
            session_id = %session_id,
            character = %character.name,
            elapsed_ms = time_taken.as_millis() as u64,
            "Chat reply generated"
        );
        Ok(ChatReply {
            response,
            session_id,
            time_taken,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::admission::AdmissionGate;
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::{HashingEmbedder, InMemoryVectorStore};
    use crate::infrastructure::ports::{
        LlmError, MessageRole, MockImageGenPort, MockVectorStorePort, VectorStoreError,
        VectorStorePort,
    };
    use crate::test_fixtures::image_mocks::ScriptedLlm;
    use crate::test_fixtures::{write_character, write_environment};
    use crate::use_cases::context::ActiveContext;

    struct Harness {
        chat: Chat,
        llm: Arc<ScriptedLlm>,
        memory: Arc<MemoryStore>,
        _dir: tempfile::TempDir,
    }

    async fn harness(llm: ScriptedLlm, vectors: Arc<dyn VectorStorePort>) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        write_character(dir.path(), "kaiya.json");
        write_environment(dir.path(), "rome.json");
        let context = Arc::new(ActiveContext::new(dir.path(), 4));
        context.activate_defaults("kaiya.json", "rome.json").await;

        let llm = Arc::new(llm);
        let client = GenerationClient::new(
            llm.clone(),
            llm.clone(),
            Arc::new(MockImageGenPort::new()),
            Arc::new(AdmissionGate::new(2)),
        );
        let memory = Arc::new(MemoryStore::new(vectors, Arc::new(HashingEmbedder::default())));
        let clock = Arc::new(FixedClock(chrono::Utc::now()));
        Harness {
            chat: Chat::new(context, memory.clone(), client, clock),
            llm,
            memory,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn when_player_speaks_then_reply_is_extracted_and_stored() {
        let h = harness(
            ScriptedLlm::replying("Let me think about this.\n<response>Ave! The forum is loud today.</response>"),
            Arc::new(InMemoryVectorStore::new()),
        )
        .await;

        let reply = h
            .chat
            .execute(ChatInput {
                message: "Hello there".to_string(),
                ..Default::default()
            })
            .await
            .expect("reply");

        assert_eq!(reply.response, "Ave! The forum is loud today.");
        assert_eq!(reply.session_id, "Kaiya_Starling");
        let history = h.memory.history("Kaiya_Starling");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text, "Hello there");
        assert_eq!(history[1].text, "Ave! The forum is loud today.");
    }

    #[tokio::test]
    async fn when_history_is_long_then_only_last_ten_exchanges_are_sent() {
        let h = harness(
            ScriptedLlm::replying("<response>Yes?</response>"),
            Arc::new(InMemoryVectorStore::new()),
        )
        .await;
        let history: Vec<(String, String)> = (0..15)
            .map(|i| (format!("question {}", i), format!("answer {}", i)))
            .collect();

        h.chat
            .execute(ChatInput {
                session_id: Some("table-7".to_string()),
                message: "And now?".to_string(),
                history,
            })
            .await
            .expect("reply");

        let request = &h.llm.requests()[0];
        assert_eq!(request.messages.len(), 21);
        assert_eq!(request.messages[0].content, "question 5");
        assert_eq!(request.messages[20].content, "And now?");
        assert_eq!(request.messages[20].role, MessageRole::User);
        assert_eq!(request.messages[1].role, MessageRole::Assistant);
        assert!(request.stop.contains(&"\n\nKaiya Starling:".to_string()));
        assert!(h.memory.history("table-7").len() == 2);
    }

    #[tokio::test]
    async fn when_memory_fails_then_chat_still_replies() {
        let mut vectors = MockVectorStorePort::new();
        vectors
            .expect_query()
            .returning(|_, _, _| Err(VectorStoreError::RequestFailed("down".to_string())));
        vectors
            .expect_upsert()
            .returning(|_, _| Err(VectorStoreError::RequestFailed("down".to_string())));
        let h = harness(
            ScriptedLlm::replying("<response>Still here, friend.</response>"),
            Arc::new(vectors),
        )
        .await;

        let reply = h
            .chat
            .execute(ChatInput {
                message: "Are you there?".to_string(),
                ..Default::default()
            })
            .await
            .expect("reply despite memory failure");

        assert_eq!(reply.response, "Still here, friend.");
    }

    #[tokio::test]
    async fn when_model_fails_then_upstream_error() {
        let h = harness(
            ScriptedLlm::new([Err(LlmError::Timeout)]),
            Arc::new(InMemoryVectorStore::new()),
        )
        .await;
        let err = h
            .chat
            .execute(ChatInput {
                message: "Hello".to_string(),
                ..Default::default()
            })
            .await
            .expect_err("timeout");
        assert!(matches!(err, ConversationError::Upstream(_)));
        assert!(h.memory.history("Kaiya_Starling").is_empty());
    }

    #[tokio::test]
    async fn when_message_is_blank_then_rejected_without_call() {
        let h = harness(ScriptedLlm::new([]), Arc::new(InMemoryVectorStore::new())).await;
        let err = h
            .chat
            .execute(ChatInput {
                message: "   ".to_string(),
                ..Default::default()
            })
            .await
            .expect_err("blank");
        assert!(matches!(err, ConversationError::EmptyMessage));
        assert!(h.llm.requests().is_empty());
    }
}
