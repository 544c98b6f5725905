//! Response bodies returned by the HTTP surface.

use npcgen_domain::{CharacterProfile, PresetKind, WorldTemplate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error payload for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Seconds spent handling the request.
    pub time_taken: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    pub message: String,
    pub success: bool,
}

// =============================================================================
// Character generation
// =============================================================================

/// Outcome for one requested character, tagged with its request position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterResult {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCharactersResponse {
    pub batch_id: Uuid,
    pub results: Vec<CharacterResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestNamesResponse {
    pub names: Vec<String>,
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFilesResponse {
    pub files: Vec<String>,
    pub current: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCharacterResponse {
    pub ok: bool,
    pub current: Option<String>,
    pub character: CharacterProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadEnvironmentResponse {
    pub ok: bool,
    pub current: Option<String>,
    pub environment: WorldTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveTemplateResponse {
    pub ok: bool,
    pub filename: String,
}

// =============================================================================
// Images and assets
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerateResponse {
    pub profile_asset_id: Uuid,
    pub full_body_asset_id: Uuid,
    pub profile_image_url: String,
    pub full_body_image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub asset_id: Uuid,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTo3dResponse {
    pub glb_asset_id: Uuid,
    pub glb_url: String,
    pub glb_download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetDto {
    pub name: String,
    pub kind: PresetKind,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsResponse {
    pub presets: Vec<PresetDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPresetResponse {
    pub ok: bool,
    pub name: String,
    pub kind: PresetKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePresetResponse {
    pub ok: bool,
    pub deleted: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_result_omits_absent_fields() {
        let result = CharacterResult {
            index: 2,
            name: Some("Aulus".to_string()),
            character: None,
            error: Some("upstream timed out".to_string()),
        };
        let json = serde_json::to_value(&result).expect("serializable");
        assert!(json.get("character").is_none());
        assert_eq!(json["error"], "upstream timed out");
        assert_eq!(json["index"], 2);
    }
}
