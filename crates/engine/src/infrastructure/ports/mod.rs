//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - LLM calls (could swap Together -> Ollama/OpenAI)
//! - Image generation (could swap FLUX -> other)
//! - Embeddings and vector storage (could swap Chroma -> other)
//! - Image-to-3D conversion
//! - Clock/Random (for testing)

mod error;
mod external;
mod testing;
mod vector;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, EmbeddingPort, FinishReason, ImageGenPort, ImageRequest, ImageResult, LlmPort,
    LlmRequest, LlmResponse, MeshConverterPort, MessageRole, ResponseFormat, TokenUsage,
};
pub use vector::{VectorMatch, VectorRecord, VectorStorePort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockEmbeddingPort, MockImageGenPort, MockLlmPort, MockMeshConverterPort};
#[cfg(test)]
pub use testing::MockClockPort;
#[cfg(test)]
pub use vector::MockVectorStorePort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{
    EmbeddingError, ImageGenError, LlmError, MeshConverterError, RepoError, VectorStoreError,
};
