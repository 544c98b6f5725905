//! Engine configuration read from the process environment.
//!
//! `main` loads `.env.local` / `.env` via dotenvy before calling
//! [`EngineConfig::from_env`], so both sources feed the same lookup.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.together.xyz";
pub const DEFAULT_CHARACTER_MODEL: &str = "meta-llama/Llama-3.3-70B-Instruct-Turbo";
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.2-pro";
pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-base-en-v1.5";
pub const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 5;
pub const DEFAULT_TEMPLATE_CACHE_CAPACITY: usize = 32;
pub const DEFAULT_TEMP_UPLOAD_TTL_SECS: u64 = 300;

/// Chroma connection settings. Present only when `CHROMA_URL` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromaSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub tenant: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub llm_base_url: String,
    pub character_model: String,
    pub dialogue_model: String,
    pub image_model: String,
    pub embedding_model: String,
    pub llm_timeout: Duration,
    pub max_concurrent_generations: usize,
    pub template_cache_capacity: usize,
    pub data_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub default_character: String,
    pub default_environment: String,
    pub public_base_url: Option<String>,
    pub temp_upload_ttl: Duration,
    pub chroma: Option<ChromaSettings>,
    pub mesh_converter_url: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse_or = |key: &str, default: u64| -> u64 {
            match get(key) {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    tracing::warn!(key, value = %raw, default, "Invalid numeric setting, using default");
                    default
                }),
                None => default,
            }
        };

        let character_model =
            get("CHARACTER_MODEL").unwrap_or_else(|| DEFAULT_CHARACTER_MODEL.to_string());
        let dialogue_model = get("DIALOGUE_MODEL").unwrap_or_else(|| character_model.clone());

        let chroma = get("CHROMA_URL").map(|url| ChromaSettings {
            url,
            api_key: get("CHROMA_API_KEY"),
            tenant: get("CHROMA_TENANT").unwrap_or_else(|| "default_tenant".to_string()),
            database: get("CHROMA_DATABASE").unwrap_or_else(|| "default_database".to_string()),
        });

        Self {
            host: get("NPC_BACKEND_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("NPC_BACKEND_PORT", 8000).min(u16::MAX as u64) as u16,
            api_key: get("TOGETHER_API_KEY"),
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            character_model,
            dialogue_model,
            image_model: get("IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            embedding_model: get("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            llm_timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", 120)),
            max_concurrent_generations: (parse_or(
                "NPC_MAX_CONCURRENT_GENERATIONS",
                DEFAULT_MAX_CONCURRENT_GENERATIONS as u64,
            ) as usize)
                .max(1),
            template_cache_capacity: (parse_or(
                "NPC_TEMPLATE_CACHE_CAPACITY",
                DEFAULT_TEMPLATE_CACHE_CAPACITY as u64,
            ) as usize)
                .max(1),
            data_dir: PathBuf::from(get("NPC_DATA_DIR").unwrap_or_else(|| "JSONData".to_string())),
            assets_dir: PathBuf::from(get("NPC_ASSETS_DIR").unwrap_or_else(|| "assets".to_string())),
            default_character: get("NPC_DEFAULT_CHARACTER")
                .unwrap_or_else(|| "KaiyaStarling.json".to_string()),
            default_environment: get("NPC_DEFAULT_ENVIRONMENT")
                .unwrap_or_else(|| "environment.json".to_string()),
            public_base_url: get("NPC_PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string()),
            temp_upload_ttl: Duration::from_secs(parse_or(
                "NPC_TEMP_UPLOAD_TTL_SECONDS",
                DEFAULT_TEMP_UPLOAD_TTL_SECS,
            )),
            chroma,
            mesh_converter_url: get("MESH_CONVERTER_URL"),
        }
    }
}
