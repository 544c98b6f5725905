//! Convert a stored image asset into a GLB mesh asset.

use std::sync::Arc;

use npcgen_domain::AssetId;

use crate::infrastructure::asset_store::{AssetKind, AssetStore};
use crate::infrastructure::generation_client::GenerationClient;

use super::{AssetError, AssetUrls};

#[derive(Debug, Clone)]
pub struct ConvertedMesh {
    pub glb_asset_id: AssetId,
    pub glb_url: String,
    pub glb_download_url: String,
}

pub struct ConvertToMesh {
    client: GenerationClient,
    store: Arc<AssetStore>,
    urls: AssetUrls,
}

impl ConvertToMesh {
    pub fn new(client: GenerationClient, store: Arc<AssetStore>, urls: AssetUrls) -> Self {
        Self { client, store, urls }
    }

    pub async fn execute(&self, source: AssetId) -> Result<ConvertedMesh, AssetError> {
        let (asset, bytes) = self.store.read(source).await?;
        if !asset.kind.is_image() {
            return Err(AssetError::NotAnImage(source));
        }

        let glb = self.client.convert_to_mesh(bytes).await?;
        let glb_asset_id = self.store.save(&glb, AssetKind::Glb).await?;
        tracing::info!(source = %source, %glb_asset_id, size = glb.len(), "Stored mesh asset");

        Ok(ConvertedMesh {
            glb_asset_id,
            glb_url: self.urls.asset_url(glb_asset_id),
            glb_download_url: self.urls.download_url(glb_asset_id),
        })
    }
}
