//! NPC Generator Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use npcgen_engine::api;
use npcgen_engine::app::{App, Providers};
use npcgen_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    memory::{ChromaVectorStore, HashingEmbedder, InMemoryVectorStore},
    mesh_converter::HttpMeshConverter,
    ports::{EmbeddingPort, MeshConverterPort, VectorStorePort},
    settings::EngineConfig,
    together::TogetherClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "npcgen_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NPC Generator Engine");

    let config = EngineConfig::from_env();

    let together = |model: &str| {
        TogetherClient::new(
            &config.llm_base_url,
            config.api_key.clone(),
            config.llm_timeout,
        )
        .with_chat_model(model)
        .with_image_model(&config.image_model)
        .with_embedding_model(&config.embedding_model)
    };
    let character_llm = Arc::new(together(&config.character_model));
    let dialogue_llm = Arc::new(together(&config.dialogue_model));
    if !character_llm.has_api_key() {
        tracing::warn!("TOGETHER_API_KEY is not set; generation requests will fail");
    }

    let embedder: Arc<dyn EmbeddingPort> = if character_llm.has_api_key() {
        character_llm.clone()
    } else {
        tracing::info!("Using offline hashing embedder for conversation memory");
        Arc::new(HashingEmbedder::default())
    };

    let vectors: Arc<dyn VectorStorePort> = match &config.chroma {
        Some(chroma) => {
            tracing::info!(url = %chroma.url, tenant = %chroma.tenant, "Using Chroma vector store");
            Arc::new(ChromaVectorStore::new(chroma, config.llm_timeout))
        }
        None => {
            tracing::info!("CHROMA_URL not set, conversation memory is in-process only");
            Arc::new(InMemoryVectorStore::new())
        }
    };

    let mesh: Option<Arc<dyn MeshConverterPort>> = match &config.mesh_converter_url {
        Some(url) => {
            tracing::info!(url = %url, "Mesh converter configured");
            Some(Arc::new(HttpMeshConverter::new(url, config.llm_timeout)))
        }
        None => None,
    };

    let app = Arc::new(App::new(
        &config,
        Providers {
            character_llm: character_llm.clone(),
            dialogue_llm,
            images: character_llm,
            mesh,
            vectors,
            embedder,
            clock: Arc::new(SystemClock::new()),
            random: Arc::new(SystemRandom::new()),
        },
    ));
    app.context
        .activate_defaults(&config.default_character, &config.default_environment)
        .await;

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer_from_env() {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer_from_env() -> Option<CorsLayer> {
    let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // Browser clients send the session header with JSON bodies.
        .allow_headers([
            HeaderName::from_static("x-session-id"),
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
