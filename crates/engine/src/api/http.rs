//! HTTP routes.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use npcgen_domain::{AssetId, PresetKind, PromptPreset};
use npcgen_shared::{
    CharacterResult, ChatRequest, ChatResponse, ClearHistoryResponse, ConfigFilesResponse,
    DeletePresetResponse, ErrorBody, GenerateCharactersRequest, GenerateCharactersResponse,
    HealthResponse, ImageGenerateRequest, ImageGenerateResponse, ImageTo3dRequest,
    ImageTo3dResponse, ImageUploadResponse, LoadCharacterRequest, LoadCharacterResponse,
    LoadEnvironmentRequest, LoadEnvironmentResponse, PresetDto, PresetsResponse,
    SaveCharacterRequest, SaveEnvironmentRequest, SaveTemplateResponse, SuggestNamesRequest,
    SuggestNamesResponse, UpsertPresetRequest, UpsertPresetResponse,
};

use crate::app::App;
use crate::infrastructure::generation_client::UpstreamError;
use crate::infrastructure::ports::RepoError;
use crate::infrastructure::template_store::TemplateError;
use crate::use_cases::assets::{AssetError, ImageJob, MAX_UPLOAD_BYTES};
use crate::use_cases::character::{BatchRequest, GenerationError, RetryPolicy};
use crate::use_cases::context::{ConfigFiles, ContextError};
use crate::use_cases::conversation::{ChatInput, ConversationError};
use crate::use_cases::presets::PresetError;

const SESSION_HEADER: &str = "x-session-id";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat))
        .route("/clear-history", post(clear_history))
        .route("/characters/generate", post(generate_characters))
        .route("/characters/names", post(suggest_names))
        .route("/config/characters", get(list_characters))
        .route("/config/environments", get(list_environments))
        .route("/config/character/load", post(load_character))
        .route("/config/character/save", post(save_character))
        .route("/config/environment/load", post(load_environment))
        .route("/config/environment/save", post(save_environment))
        .route("/image/generate", post(generate_images))
        .route(
            "/image/upload",
            // Multipart framing on top of the largest accepted image.
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/image/presets", get(list_presets).put(upsert_preset))
        .route("/image/presets/random", get(random_preset))
        .route("/image/presets/{name}", delete(delete_preset))
        .route("/image/to-3d", post(image_to_3d))
        .route("/assets/{id}", get(get_asset))
        .route("/assets/{id}/download", get(download_asset))
}

async fn health(State(app): State<Arc<App>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: app.service.clone(),
    })
}

fn session_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// =============================================================================
// Conversation
// =============================================================================

async fn chat(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = app
        .use_cases
        .conversation
        .chat
        .execute(ChatInput {
            session_id: session_header(&headers),
            message: req.message,
            history: req.history,
        })
        .await?;
    Ok(Json(ChatResponse {
        response: reply.response,
        time_taken: reply.time_taken.as_secs_f64(),
    }))
}

async fn clear_history(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<ClearHistoryResponse>, ApiError> {
    let (session, removed) = app
        .use_cases
        .conversation
        .clear_history
        .execute(session_header(&headers))
        .await?;
    let message = if removed == 0 {
        format!("No conversation history to clear for {}.", session)
    } else {
        format!("Cleared conversation history for {}.", session)
    };
    Ok(Json(ClearHistoryResponse {
        message,
        success: true,
    }))
}

// =============================================================================
// Characters
// =============================================================================

async fn generate_characters(
    State(app): State<Arc<App>>,
    Json(req): Json<GenerateCharactersRequest>,
) -> Result<Json<GenerateCharactersResponse>, ApiError> {
    let world = app.context.resolve_environment(req.environment).await?;
    let policy = match req.max_attempts {
        Some(n) => RetryPolicy::default().with_max_attempts(n),
        None => RetryPolicy::default(),
    };
    let outcome = app
        .use_cases
        .characters
        .generate_batch
        .execute(
            world,
            BatchRequest {
                names: req.names,
                count: req.count,
                personalities: req.personalities,
                instruction: req.instruction,
                policy,
            },
        )
        .await?;

    let results = outcome
        .items
        .into_iter()
        .map(|item| match item.result {
            Ok(profile) => CharacterResult {
                index: item.index,
                name: item.name,
                character: Some(profile),
                error: None,
            },
            Err(e) => CharacterResult {
                index: item.index,
                name: item.name,
                character: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(Json(GenerateCharactersResponse {
        batch_id: outcome.batch_id.into(),
        results,
    }))
}

async fn suggest_names(
    State(app): State<Arc<App>>,
    Json(req): Json<SuggestNamesRequest>,
) -> Result<Json<SuggestNamesResponse>, ApiError> {
    let world = app.context.resolve_environment(req.environment).await?;
    let names = app
        .use_cases
        .characters
        .suggest_names
        .execute(&world, req.amount)
        .await?;
    Ok(Json(SuggestNamesResponse { names }))
}

// =============================================================================
// Active character / environment
// =============================================================================

fn files_response(files: ConfigFiles) -> Json<ConfigFilesResponse> {
    Json(ConfigFilesResponse {
        files: files.files,
        current: files.current,
    })
}

async fn list_characters(
    State(app): State<Arc<App>>,
) -> Result<Json<ConfigFilesResponse>, ApiError> {
    Ok(files_response(app.context.list_characters().await?))
}

async fn list_environments(
    State(app): State<Arc<App>>,
) -> Result<Json<ConfigFilesResponse>, ApiError> {
    Ok(files_response(app.context.list_environments().await?))
}

async fn load_character(
    State(app): State<Arc<App>>,
    Json(req): Json<LoadCharacterRequest>,
) -> Result<Json<LoadCharacterResponse>, ApiError> {
    let character = app
        .context
        .load_character(req.filename.as_deref(), req.character)
        .await?;
    Ok(Json(LoadCharacterResponse {
        ok: true,
        current: app.context.current_character_file().await,
        character: (*character).clone(),
    }))
}

async fn save_character(
    State(app): State<Arc<App>>,
    Json(req): Json<SaveCharacterRequest>,
) -> Result<Json<SaveTemplateResponse>, ApiError> {
    let filename = app
        .context
        .save_character(&req.filename, req.character)
        .await?;
    Ok(Json(SaveTemplateResponse { ok: true, filename }))
}

async fn load_environment(
    State(app): State<Arc<App>>,
    Json(req): Json<LoadEnvironmentRequest>,
) -> Result<Json<LoadEnvironmentResponse>, ApiError> {
    let environment = app
        .context
        .load_environment(req.filename.as_deref(), req.environment)
        .await?;
    Ok(Json(LoadEnvironmentResponse {
        ok: true,
        current: app.context.current_environment_file().await,
        environment: (*environment).clone(),
    }))
}

async fn save_environment(
    State(app): State<Arc<App>>,
    Json(req): Json<SaveEnvironmentRequest>,
) -> Result<Json<SaveTemplateResponse>, ApiError> {
    let filename = app
        .context
        .save_environment(&req.filename, req.environment)
        .await?;
    Ok(Json(SaveTemplateResponse { ok: true, filename }))
}

// =============================================================================
// Images and assets
// =============================================================================

async fn generate_images(
    State(app): State<Arc<App>>,
    Json(req): Json<ImageGenerateRequest>,
) -> Result<Json<ImageGenerateResponse>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt is required".to_string()));
    }
    let images = app
        .use_cases
        .assets
        .generate_images
        .execute(ImageJob {
            prompt: req.prompt,
            profile_prompt: req.profile_prompt,
            full_body_prompt: req.full_body_prompt,
            reference_images: req.reference_images,
            profile: req.profile,
            full_body: req.full_body,
        })
        .await?;
    Ok(Json(ImageGenerateResponse {
        profile_asset_id: images.profile_asset_id.into(),
        full_body_asset_id: images.full_body_asset_id.into(),
        profile_image_url: images.profile_image_url,
        full_body_image_url: images.full_body_image_url,
    }))
}

async fn upload_image(
    State(app): State<Arc<App>>,
    mut multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
            file = Some(bytes);
            break;
        }
    }
    let file = file.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;

    let uploaded = app.use_cases.assets.upload.execute(&file).await?;
    Ok(Json(ImageUploadResponse {
        asset_id: uploaded.asset_id.into(),
        image_url: uploaded.image_url,
    }))
}

async fn image_to_3d(
    State(app): State<Arc<App>>,
    Json(req): Json<ImageTo3dRequest>,
) -> Result<Json<ImageTo3dResponse>, ApiError> {
    let converted = app
        .use_cases
        .assets
        .to_mesh
        .execute(AssetId::from_uuid(req.asset_id))
        .await?;
    Ok(Json(ImageTo3dResponse {
        glb_asset_id: converted.glb_asset_id.into(),
        glb_url: converted.glb_url,
        glb_download_url: converted.glb_download_url,
    }))
}

async fn get_asset(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (asset, bytes) = app
        .use_cases
        .assets
        .fetch
        .execute(AssetId::from_uuid(id))
        .await?;
    Ok((
        [(header::CONTENT_TYPE, asset.kind.media_type().to_string())],
        bytes,
    )
        .into_response())
}

async fn download_asset(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (asset, bytes) = app
        .use_cases
        .assets
        .fetch
        .execute(AssetId::from_uuid(id))
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, asset.kind.media_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", asset.file_name()),
            ),
        ],
        bytes,
    )
        .into_response())
}

// =============================================================================
// Prompt presets
// =============================================================================

fn preset_dto(preset: &PromptPreset) -> PresetDto {
    PresetDto {
        name: preset.name().to_string(),
        kind: preset.kind(),
        prompt: preset.prompt().to_string(),
    }
}

async fn list_presets(State(app): State<Arc<App>>) -> Result<Json<PresetsResponse>, ApiError> {
    let presets = app.use_cases.presets.list().await?;
    Ok(Json(PresetsResponse {
        presets: presets.iter().map(preset_dto).collect(),
    }))
}

async fn upsert_preset(
    State(app): State<Arc<App>>,
    Json(req): Json<UpsertPresetRequest>,
) -> Result<Json<UpsertPresetResponse>, ApiError> {
    let preset = app
        .use_cases
        .presets
        .upsert(&req.name, &req.kind, &req.prompt)
        .await?;
    Ok(Json(UpsertPresetResponse {
        ok: true,
        name: preset.name().to_string(),
        kind: preset.kind(),
    }))
}

async fn delete_preset(
    State(app): State<Arc<App>>,
    Path(name): Path<String>,
) -> Result<Json<DeletePresetResponse>, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    app.use_cases.presets.delete(&name).await?;
    Ok(Json(DeletePresetResponse {
        ok: true,
        deleted: name,
    }))
}

#[derive(Debug, Deserialize)]
struct RandomPresetQuery {
    kind: String,
}

async fn random_preset(
    State(app): State<Arc<App>>,
    Query(query): Query<RandomPresetQuery>,
) -> Result<Json<PresetDto>, ApiError> {
    let kind: PresetKind = query
        .kind
        .parse()
        .map_err(|e: npcgen_domain::DomainError| ApiError::BadRequest(e.to_string()))?;
    let preset = app.use_cases.presets.pick(kind).await?;
    Ok(Json(preset_dto(&preset)))
}

// =============================================================================
// Errors
// =============================================================================

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// A template file exists but cannot be used.
    MalformedTemplate(String),
    Upstream(String),
    Unavailable(String),
    /// Details are logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MalformedTemplate(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Upstream(msg) => {
                tracing::warn!(error = %msg, "Upstream failure");
                (StatusCode::BAD_GATEWAY, msg)
            }
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Unavailable(_) => ApiError::Unavailable(e.to_string()),
            UpstreamError::InvalidRequest(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::NotFound(_) => ApiError::NotFound(e.to_string()),
            TemplateError::Malformed { .. } => ApiError::MalformedTemplate(e.to_string()),
            TemplateError::InvalidFilename(_) => ApiError::BadRequest(e.to_string()),
            TemplateError::Io { .. } => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ContextError> for ApiError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::Template(inner) => inner.into(),
            ContextError::NoActive(_) => ApiError::Unavailable(e.to_string()),
            ContextError::Invalid { .. } | ContextError::MissingSource(_) => {
                ApiError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Upstream(inner) => inner.into(),
            // The model answered, but not with a usable profile.
            GenerationError::Validation(_) => ApiError::Upstream(e.to_string()),
            GenerationError::InvalidRequest(_) => ApiError::BadRequest(e.to_string()),
            GenerationError::Task(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ConversationError> for ApiError {
    fn from(e: ConversationError) -> Self {
        match e {
            ConversationError::EmptyMessage => ApiError::BadRequest(e.to_string()),
            ConversationError::EmptyReply => ApiError::Upstream(e.to_string()),
            ConversationError::Context(inner) => inner.into(),
            ConversationError::Upstream(inner) => inner.into(),
            ConversationError::Memory(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AssetError> for ApiError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::NotFound(_) => ApiError::NotFound(e.to_string()),
            AssetError::InvalidImage(_) | AssetError::NotAnImage(_) => {
                ApiError::BadRequest(e.to_string())
            }
            AssetError::Upstream(inner) => inner.into(),
            AssetError::Storage(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PresetError> for ApiError {
    fn from(e: PresetError) -> Self {
        match e {
            PresetError::Invalid(_) => ApiError::BadRequest(e.to_string()),
            PresetError::NoneOfKind(_) => ApiError::NotFound(e.to_string()),
            PresetError::Storage(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::app::Providers;
    use crate::infrastructure::asset_store::AssetKind;
    use crate::infrastructure::clock::{FixedRandom, SystemClock};
    use crate::infrastructure::memory::{HashingEmbedder, InMemoryVectorStore};
    use crate::infrastructure::ports::MockImageGenPort;
    use crate::infrastructure::settings::EngineConfig;
    use crate::test_fixtures::image_mocks::{minimal_png, ScriptedLlm};
    use crate::test_fixtures::{write_character, write_environment};

    struct TestApp {
        router: Router,
        app: Arc<App>,
        _dir: tempfile::TempDir,
    }

    async fn test_app(llm: ScriptedLlm) -> TestApp {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = dir.path().join("JSONData");
        std::fs::create_dir_all(&data_dir).expect("data dir");
        write_character(&data_dir, "KaiyaStarling.json");
        write_environment(&data_dir, "environment.json");

        let mut config = EngineConfig::from_lookup(|_| None);
        config.data_dir = data_dir;
        config.assets_dir = dir.path().join("assets");

        let llm = Arc::new(llm);
        let app = Arc::new(App::new(
            &config,
            Providers {
                character_llm: llm.clone(),
                dialogue_llm: llm,
                images: Arc::new(MockImageGenPort::new()),
                mesh: None,
                vectors: Arc::new(InMemoryVectorStore::new()),
                embedder: Arc::new(HashingEmbedder::default()),
                clock: Arc::new(SystemClock::new()),
                random: Arc::new(FixedRandom(0)),
            },
        ));
        app.context
            .activate_defaults(&config.default_character, &config.default_environment)
            .await;

        TestApp {
            router: routes().with_state(app.clone()),
            app,
            _dir: dir,
        }
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let t = test_app(ScriptedLlm::new([])).await;

        let response = t
            .router
            .oneshot(empty_request("GET", "/health"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "NPC Dialogue Generation API");
    }

    #[tokio::test]
    async fn presets_can_be_saved_listed_and_deleted() {
        let t = test_app(ScriptedLlm::new([])).await;

        let saved = t
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                "/image/presets",
                serde_json::json!({"name": "MyCharPreset", "kind": "character", "prompt": "anime style"}),
            ))
            .await
            .expect("response");
        assert_eq!(saved.status(), StatusCode::OK);
        assert_eq!(body_json(saved).await["ok"], true);

        let listed = t
            .router
            .clone()
            .oneshot(empty_request("GET", "/image/presets"))
            .await
            .expect("response");
        let body = body_json(listed).await;
        assert_eq!(body["presets"][0]["name"], "MyCharPreset");
        assert_eq!(body["presets"][0]["kind"], "character");

        let deleted = t
            .router
            .clone()
            .oneshot(empty_request("DELETE", "/image/presets/MyCharPreset"))
            .await
            .expect("response");
        assert_eq!(deleted.status(), StatusCode::OK);
        assert_eq!(body_json(deleted).await["deleted"], "MyCharPreset");

        let listed = t
            .router
            .oneshot(empty_request("GET", "/image/presets"))
            .await
            .expect("response");
        assert_eq!(body_json(listed).await["presets"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn preset_with_unknown_kind_is_bad_request() {
        let t = test_app(ScriptedLlm::new([])).await;

        let response = t
            .router
            .oneshot(json_request(
                "PUT",
                "/image/presets",
                serde_json::json!({"name": "x", "kind": "vehicle", "prompt": "red car"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn chat_returns_extracted_dialogue() {
        let t = test_app(ScriptedLlm::replying(
            "<response>Ave, stranger. Mind the cobbles.</response>",
        ))
        .await;

        let response = t
            .router
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({"message": "Hello", "history": [["Hi", "Well met."]]}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Ave, stranger. Mind the cobbles.");
        assert!(body["time_taken"].as_f64().expect("seconds") >= 0.0);
    }

    #[tokio::test]
    async fn chat_upstream_failure_is_bad_gateway() {
        let t = test_app(ScriptedLlm::new([Err(
            crate::infrastructure::ports::LlmError::Timeout,
        )]))
        .await;

        let response = t
            .router
            .oneshot(json_request(
                "POST",
                "/chat",
                serde_json::json!({"message": "Hello"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn config_listing_marks_the_active_file() {
        let t = test_app(ScriptedLlm::new([])).await;

        let response = t
            .router
            .oneshot(empty_request("GET", "/config/characters"))
            .await
            .expect("response");

        let body = body_json(response).await;
        assert_eq!(body["current"], "KaiyaStarling.json");
        assert_eq!(body["files"], serde_json::json!(["KaiyaStarling.json"]));
    }

    #[tokio::test]
    async fn loading_a_missing_environment_is_not_found() {
        let t = test_app(ScriptedLlm::new([])).await;

        let response = t
            .router
            .oneshot(json_request(
                "POST",
                "/config/environment/load",
                serde_json::json!({"filename": "atlantis.json"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mesh_conversion_without_converter_is_unavailable() {
        let t = test_app(ScriptedLlm::new([])).await;
        let (asset_id, _) = upload_png(&t).await;

        let response = t
            .router
            .oneshot(json_request(
                "POST",
                "/image/to-3d",
                serde_json::json!({ "asset_id": asset_id }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn asset_download_is_an_attachment() {
        let t = test_app(ScriptedLlm::new([])).await;
        let (asset_id, _) = upload_png(&t).await;

        let response = t
            .router
            .oneshot(empty_request(
                "GET",
                &format!("/assets/{}/download", asset_id),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            AssetKind::Png.media_type()
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .expect("ascii header");
        assert!(disposition.starts_with("attachment;"));
        assert!(disposition.contains(&format!("{}.png", asset_id)));
    }

    #[tokio::test]
    async fn unknown_asset_is_not_found() {
        let t = test_app(ScriptedLlm::new([])).await;

        let response = t
            .router
            .oneshot(empty_request("GET", &format!("/assets/{}", Uuid::new_v4())))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_without_image_bytes_is_bad_request() {
        let t = test_app(ScriptedLlm::new([])).await;

        let response = t
            .router
            .oneshot(multipart_request(b"definitely not an image"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(t.app.gate.in_flight(), 0);
    }

    fn multipart_request(file: &[u8]) -> Request<Body> {
        const BOUNDARY: &str = "npcgen-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"ref.png\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/image/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn upload_png(t: &TestApp) -> (String, String) {
        let response = t
            .router
            .clone()
            .oneshot(multipart_request(&minimal_png()))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        (
            body["asset_id"].as_str().expect("asset id").to_string(),
            body["image_url"].as_str().expect("image url").to_string(),
        )
    }
}
