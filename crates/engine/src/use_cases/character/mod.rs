//! Character generation use cases.

use std::sync::Arc;

use crate::infrastructure::generation_client::UpstreamError;
use crate::use_cases::response_validator::ValidationError;

mod batch;
mod generate;
mod names;
mod retry;

pub use batch::{BatchItem, BatchOutcome, BatchRequest, GenerateCharacterBatch, MAX_BATCH_SIZE};
pub use generate::GenerateCharacter;
pub use names::{SuggestNames, MAX_NAMES};
pub use retry::RetryPolicy;

/// Container for character use cases.
pub struct CharacterUseCases {
    pub generate: Arc<GenerateCharacter>,
    pub generate_batch: Arc<GenerateCharacterBatch>,
    pub suggest_names: Arc<SuggestNames>,
}

impl CharacterUseCases {
    pub fn new(
        generate: Arc<GenerateCharacter>,
        generate_batch: Arc<GenerateCharacterBatch>,
        suggest_names: Arc<SuggestNames>,
    ) -> Self {
        Self {
            generate,
            generate_batch,
            suggest_names,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Generation task failed: {0}")]
    Task(String),
}
