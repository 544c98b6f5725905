//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    admission::AdmissionGate,
    asset_store::AssetStore,
    generation_client::GenerationClient,
    memory::MemoryStore,
    ports::{
        ClockPort, EmbeddingPort, ImageGenPort, LlmPort, MeshConverterPort, RandomPort,
        VectorStorePort,
    },
    preset_store::{PresetStore, PRESETS_FILENAME},
    settings::EngineConfig,
};
use crate::use_cases::{
    self,
    assets::{AssetUrls, ConvertToMesh, FetchAsset, GenerateImages, UploadReference},
    character::{GenerateCharacter, GenerateCharacterBatch, SuggestNames},
    context::ActiveContext,
    conversation::{Chat, ClearHistory},
};

/// External services the engine talks to, constructed once in `main`.
pub struct Providers {
    pub character_llm: Arc<dyn LlmPort>,
    pub dialogue_llm: Arc<dyn LlmPort>,
    pub images: Arc<dyn ImageGenPort>,
    pub mesh: Option<Arc<dyn MeshConverterPort>>,
    pub vectors: Arc<dyn VectorStorePort>,
    pub embedder: Arc<dyn EmbeddingPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub service: String,
    pub use_cases: UseCases,
    pub context: Arc<ActiveContext>,
    pub gate: Arc<AdmissionGate>,
}

/// Container for all use cases.
pub struct UseCases {
    pub characters: use_cases::CharacterUseCases,
    pub conversation: use_cases::ConversationUseCases,
    pub assets: use_cases::AssetUseCases,
    pub presets: use_cases::PresetUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// The active character and environment start empty; call
    /// [`ActiveContext::activate_defaults`] on `context` to load them.
    pub fn new(config: &EngineConfig, providers: Providers) -> Self {
        let gate = Arc::new(AdmissionGate::new(config.max_concurrent_generations));
        let mut client = GenerationClient::new(
            providers.character_llm,
            providers.dialogue_llm,
            providers.images,
            gate.clone(),
        );
        if let Some(mesh) = providers.mesh {
            client = client.with_mesh_converter(mesh);
        }

        let context = Arc::new(ActiveContext::new(
            config.data_dir.clone(),
            config.template_cache_capacity,
        ));
        let memory = Arc::new(MemoryStore::new(providers.vectors, providers.embedder));
        let asset_store = Arc::new(AssetStore::new(
            config.assets_dir.clone(),
            providers.clock.clone(),
        ));
        let preset_store = Arc::new(PresetStore::new(config.assets_dir.join(PRESETS_FILENAME)));
        let urls = AssetUrls::new(config.public_base_url.clone());

        let generate = Arc::new(GenerateCharacter::new(
            client.clone(),
            providers.random.clone(),
        ));
        let characters = use_cases::CharacterUseCases::new(
            generate.clone(),
            Arc::new(GenerateCharacterBatch::new(generate, providers.random.clone())),
            Arc::new(SuggestNames::new(client.clone())),
        );

        let conversation = use_cases::ConversationUseCases::new(
            Arc::new(Chat::new(
                context.clone(),
                memory.clone(),
                client.clone(),
                providers.clock.clone(),
            )),
            Arc::new(ClearHistory::new(context.clone(), memory)),
        );

        let assets = use_cases::AssetUseCases::new(
            Arc::new(GenerateImages::new(
                client.clone(),
                asset_store.clone(),
                urls.clone(),
            )),
            Arc::new(UploadReference::new(
                asset_store.clone(),
                urls.clone(),
                config.temp_upload_ttl,
            )),
            Arc::new(ConvertToMesh::new(client, asset_store.clone(), urls)),
            Arc::new(FetchAsset::new(asset_store)),
        );

        let presets = use_cases::PresetUseCases::new(preset_store, providers.random);

        Self {
            service: "NPC Dialogue Generation API".to_string(),
            use_cases: UseCases {
                characters,
                conversation,
                assets,
                presets,
            },
            context,
            gate,
        }
    }
}
