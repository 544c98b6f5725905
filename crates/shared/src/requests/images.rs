use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const PROFILE: ImageSize = ImageSize {
        width: 768,
        height: 768,
    };
    pub const FULL_BODY: ImageSize = ImageSize {
        width: 832,
        height: 1216,
    };
}

fn default_profile_size() -> ImageSize {
    ImageSize::PROFILE
}

fn default_full_body_size() -> ImageSize {
    ImageSize::FULL_BODY
}

/// Generate a profile portrait and a full-body image for one character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub profile_prompt: Option<String>,
    #[serde(default)]
    pub full_body_prompt: Option<String>,
    /// Public URLs the provider fetches to guide generation.
    #[serde(default)]
    pub reference_images: Vec<String>,
    #[serde(default = "default_profile_size")]
    pub profile: ImageSize,
    #[serde(default = "default_full_body_size")]
    pub full_body: ImageSize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageTo3dRequest {
    pub asset_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPresetRequest {
    pub name: String,
    /// `character` or `environment`; validated by the backend.
    pub kind: String,
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_sizes_default_when_omitted() {
        let req: ImageGenerateRequest =
            serde_json::from_str(r#"{"prompt":"a lighthouse keeper"}"#).expect("valid");
        assert_eq!(req.profile, ImageSize::PROFILE);
        assert_eq!(req.full_body, ImageSize::FULL_BODY);
        assert!(req.reference_images.is_empty());
    }
}
