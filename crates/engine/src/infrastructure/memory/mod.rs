//! Memory Store Adapter: per-session turn logs plus vector recall.
//!
//! The log is the source of truth for `history`; the vector store only holds
//! the policy-admitted subset used for recall. A turn reaches the log only
//! after its vector write (if any) succeeded.
//!
//! Logs are bounded: each keeps its most recent turns, and once the session
//! limit is reached the least recently written session is evicted together
//! with its vector collection.

pub mod chroma;
pub mod hashing_embedder;
pub mod in_memory;
pub mod policy;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use npcgen_domain::ConversationTurn;
use sha2::{Digest, Sha256};

use crate::infrastructure::ports::{EmbeddingPort, VectorRecord, VectorStoreError, VectorStorePort};

pub use chroma::ChromaVectorStore;
pub use hashing_embedder::HashingEmbedder;
pub use in_memory::InMemoryVectorStore;

/// Result of an append. Duplicates are accepted silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { embedded: bool },
    Duplicate,
}

pub const DEFAULT_MAX_SESSIONS: usize = 1024;
pub const DEFAULT_MAX_TURNS_PER_SESSION: usize = 200;

#[derive(Debug, Default)]
struct SessionLog {
    turns: Vec<ConversationTurn>,
    /// Write sequence of the latest append, for eviction order.
    last_write: u64,
}

pub struct MemoryStore {
    sessions: DashMap<String, SessionLog>,
    writes: AtomicU64,
    max_sessions: usize,
    max_turns: usize,
    vectors: Arc<dyn VectorStorePort>,
    embedder: Arc<dyn EmbeddingPort>,
}

impl MemoryStore {
    pub fn new(vectors: Arc<dyn VectorStorePort>, embedder: Arc<dyn EmbeddingPort>) -> Self {
        Self {
            sessions: DashMap::new(),
            writes: AtomicU64::new(0),
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_turns: DEFAULT_MAX_TURNS_PER_SESSION,
            vectors,
            embedder,
        }
    }

    /// Override the session and per-session turn limits (both at least 1).
    pub fn with_limits(mut self, max_sessions: usize, max_turns: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self.max_turns = max_turns.max(1);
        self
    }

    /// Record a turn. Appending a turn identical to a logged one is a no-op.
    pub async fn append(
        &self,
        session_id: &str,
        turn: ConversationTurn,
    ) -> Result<AppendOutcome, VectorStoreError> {
        if self.is_logged(session_id, &turn) {
            return Ok(AppendOutcome::Duplicate);
        }

        let embedded = policy::admits_turn(&turn);
        if embedded {
            let embedding = self.embed_single(&turn.text).await?;
            let mut metadata = HashMap::new();
            metadata.insert("speaker".to_string(), serde_json::json!(turn.speaker.as_str()));
            metadata.insert("time".to_string(), serde_json::json!(turn.timestamp.to_rfc3339()));
            let record = VectorRecord {
                id: turn_id(session_id, &turn),
                document: turn.text.clone(),
                embedding,
                metadata,
            };
            self.vectors
                .upsert(&collection_name(session_id), vec![record])
                .await?;
        }

        if !self.sessions.contains_key(session_id) {
            self.evict_until_below_limit().await;
        }

        let write = self.writes.fetch_add(1, Ordering::Relaxed);
        let mut log = self.sessions.entry(session_id.to_string()).or_default();
        // Re-check under the entry lock: a concurrent append may have won.
        if log.turns.contains(&turn) {
            return Ok(AppendOutcome::Duplicate);
        }
        log.turns.push(turn);
        if log.turns.len() > self.max_turns {
            let excess = log.turns.len() - self.max_turns;
            log.turns.drain(..excess);
        }
        log.last_write = write;
        Ok(AppendOutcome::Appended { embedded })
    }

    /// Up to `k` recalled excerpts relevant to `text`, closest first.
    pub async fn query(
        &self,
        session_id: &str,
        text: &str,
        k: usize,
    ) -> Result<Vec<String>, VectorStoreError> {
        if k == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embed_single(text).await?;
        let matches = self
            .vectors
            .query(&collection_name(session_id), embedding, k)
            .await?;
        Ok(matches
            .into_iter()
            .map(|m| m.document)
            .filter(|doc| policy::admits_excerpt(doc))
            .collect())
    }

    /// The session's turns in the order they were appended.
    pub fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.sessions
            .get(session_id)
            .map(|log| log.turns.clone())
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop the log and the vector collection. Returns how many turns were logged.
    pub async fn clear(&self, session_id: &str) -> Result<usize, VectorStoreError> {
        self.vectors
            .delete_collection(&collection_name(session_id))
            .await?;
        let removed = self
            .sessions
            .remove(session_id)
            .map(|(_, log)| log.turns.len())
            .unwrap_or(0);
        tracing::info!(session_id, removed, "Cleared conversation memory");
        Ok(removed)
    }

    fn is_logged(&self, session_id: &str, turn: &ConversationTurn) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|log| log.turns.contains(turn))
    }

    async fn evict_until_below_limit(&self) {
        while self.sessions.len() >= self.max_sessions {
            // Collect first; removing while iterating would deadlock the shard.
            let oldest = self
                .sessions
                .iter()
                .min_by_key(|entry| entry.value().last_write)
                .map(|entry| entry.key().clone());
            let Some(session_id) = oldest else {
                return;
            };
            self.sessions.remove(&session_id);
            if let Err(e) = self
                .vectors
                .delete_collection(&collection_name(&session_id))
                .await
            {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to drop evicted session collection");
            }
            tracing::debug!(session_id = %session_id, "Evicted least recently used conversation session");
        }
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, VectorStoreError> {
        let mut vectors = self.embedder.embed(vec![text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            VectorStoreError::InvalidResponse("embedder returned no vectors".to_string())
        })
    }
}

/// Stable id so re-appending the same turn overwrites instead of duplicating.
pub fn turn_id(session_id: &str, turn: &ConversationTurn) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(turn.speaker.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(turn.timestamp.to_rfc3339().as_bytes());
    hasher.update([0u8]);
    hasher.update(turn.text.as_bytes());
    hex::encode(hasher.finalize())
}

const COLLECTION_PREFIX_LEN: usize = 48;

/// Vector collection name for a session.
///
/// Collection names allow a restricted charset, so the readable prefix maps
/// anything else to `_`; a hash of the raw id keeps distinct ids apart.
pub fn collection_name(session_id: &str) -> String {
    let prefix: String = session_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .skip_while(|c| !c.is_ascii_alphanumeric())
        .take(COLLECTION_PREFIX_LEN)
        .collect();
    let prefix = if prefix.is_empty() { "session" } else { &prefix };
    let digest = hex::encode(Sha256::digest(session_id.as_bytes()));
    format!("{}-{}", prefix, &digest[..12])
}
