//! Image and mesh asset use cases.

use std::sync::Arc;

use npcgen_domain::AssetId;

use crate::infrastructure::generation_client::UpstreamError;
use crate::infrastructure::ports::RepoError;

mod fetch;
mod images;
mod mesh;
mod upload;

pub use fetch::FetchAsset;
pub use images::{GenerateImages, GeneratedImages, ImageJob};
pub use mesh::{ConvertedMesh, ConvertToMesh};
pub use upload::{UploadReference, UploadedImage, MAX_UPLOAD_BYTES};

/// Container for asset use cases.
pub struct AssetUseCases {
    pub generate_images: Arc<GenerateImages>,
    pub upload: Arc<UploadReference>,
    pub to_mesh: Arc<ConvertToMesh>,
    pub fetch: Arc<FetchAsset>,
}

impl AssetUseCases {
    pub fn new(
        generate_images: Arc<GenerateImages>,
        upload: Arc<UploadReference>,
        to_mesh: Arc<ConvertToMesh>,
        fetch: Arc<FetchAsset>,
    ) -> Self {
        Self {
            generate_images,
            upload,
            to_mesh,
            fetch,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Asset {0} is not an image")]
    NotAnImage(AssetId),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("Asset storage failed: {0}")]
    Storage(RepoError),
}

impl From<RepoError> for AssetError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Builds the URLs clients use to fetch assets.
#[derive(Debug, Clone, Default)]
pub struct AssetUrls {
    public_base_url: Option<String>,
}

impl AssetUrls {
    pub fn new(public_base_url: Option<String>) -> Self {
        Self {
            public_base_url: public_base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    /// Absolute when a public base URL is configured, otherwise `/assets/{id}`.
    pub fn asset_url(&self, id: AssetId) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/assets/{}", base, id),
            None => format!("/assets/{}", id),
        }
    }

    pub fn download_url(&self, id: AssetId) -> String {
        format!("{}/download", self.asset_url(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn urls_are_relative_without_public_base() {
        let id = AssetId::from_uuid(Uuid::nil());
        let urls = AssetUrls::new(None);
        assert_eq!(
            urls.asset_url(id),
            "/assets/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            urls.download_url(id),
            "/assets/00000000-0000-0000-0000-000000000000/download"
        );
    }

    #[test]
    fn urls_are_absolute_with_public_base() {
        let id = AssetId::from_uuid(Uuid::nil());
        let urls = AssetUrls::new(Some("https://npc.example.com/".to_string()));
        assert_eq!(
            urls.asset_url(id),
            "https://npc.example.com/assets/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn missing_asset_maps_to_not_found() {
        let err: AssetError = RepoError::not_found("Asset", "abc").into();
        assert!(matches!(err, AssetError::NotFound(ref id) if id == "abc"));
    }
}
