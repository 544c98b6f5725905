//! Generate several characters concurrently.
//!
//! One spawned task per character, each passing the admission gate on its
//! own. Results come back in request order; a failed item never cancels
//! the others.

use std::sync::Arc;

use npcgen_domain::{BatchId, CharacterProfile, WorldTemplate};

use crate::infrastructure::ports::RandomPort;
use crate::use_cases::prompt_builder::{
    sample_personalities, PromptOverrides, DEFAULT_OPPOSITES, DEFAULT_TRAITS,
};

use super::{GenerateCharacter, GenerationError, RetryPolicy};

pub const MAX_BATCH_SIZE: usize = 50;
const SAMPLED_TRAITS: usize = 5;

/// What the caller asked for.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// One character per name. When empty, `count` unnamed characters.
    pub names: Vec<String>,
    pub count: Option<usize>,
    /// Shared traits; sampled per character when empty.
    pub personalities: Vec<String>,
    pub instruction: Option<String>,
    pub policy: RetryPolicy,
}

/// Outcome of one requested character.
#[derive(Debug)]
pub struct BatchItem {
    pub index: usize,
    pub name: Option<String>,
    pub result: Result<CharacterProfile, GenerationError>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_id: BatchId,
    pub items: Vec<BatchItem>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }
}

pub struct GenerateCharacterBatch {
    single: Arc<GenerateCharacter>,
    random: Arc<dyn RandomPort>,
}

impl GenerateCharacterBatch {
    pub fn new(single: Arc<GenerateCharacter>, random: Arc<dyn RandomPort>) -> Self {
        Self { single, random }
    }

    pub async fn execute(
        &self,
        world: Arc<WorldTemplate>,
        request: BatchRequest,
    ) -> Result<BatchOutcome, GenerationError> {
        let requested = if request.names.is_empty() {
            request.count.unwrap_or(1)
        } else {
            request.names.len()
        };
        if requested == 0 {
            return Err(GenerationError::InvalidRequest(
                "at least one character must be requested".to_string(),
            ));
        }
        if requested > MAX_BATCH_SIZE {
            return Err(GenerationError::InvalidRequest(format!(
                "at most {} characters per request",
                MAX_BATCH_SIZE
            )));
        }
        let names: Vec<Option<String>> = if request.names.is_empty() {
            vec![None; requested]
        } else {
            request
                .names
                .iter()
                .map(|n| Some(n.trim().to_string()).filter(|n| !n.is_empty()))
                .collect()
        };

        let batch_id = BatchId::new();
        tracing::info!(%batch_id, count = names.len(), era = %world.era, "Starting character batch");

        let policy = Arc::new(request.policy.clone());
        let handles: Vec<_> = names
            .iter()
            .map(|name| {
                let personalities = if request.personalities.is_empty() {
                    sample_personalities(
                        DEFAULT_TRAITS,
                        DEFAULT_OPPOSITES,
                        SAMPLED_TRAITS,
                        self.random.as_ref(),
                    )
                } else {
                    request.personalities.clone()
                };
                let overrides = PromptOverrides {
                    name: name.clone(),
                    instruction: request.instruction.clone(),
                    ..Default::default()
                }
                .with_personalities(personalities);

                let single = Arc::clone(&self.single);
                let world = Arc::clone(&world);
                let policy = Arc::clone(&policy);
                tokio::spawn(async move { single.execute(&world, &overrides, &policy).await })
            })
            .collect();

        let joined = futures_util::future::join_all(handles).await;
        let mut items = Vec::with_capacity(joined.len());
        for (index, (joined, name)) in joined.into_iter().zip(names).enumerate() {
            let result =
                joined.unwrap_or_else(|join| Err(GenerationError::Task(join.to_string())));
            if let Err(e) = &result {
                tracing::warn!(%batch_id, index, name = ?name, error = %e, "Batch item failed");
            }
            items.push(BatchItem {
                index,
                name,
                result,
            });
        }

        let outcome = BatchOutcome { batch_id, items };
        tracing::info!(
            %batch_id,
            succeeded = outcome.succeeded(),
            failed = outcome.items.len() - outcome.succeeded(),
            "Character batch finished"
        );
        Ok(outcome)
    }
}
