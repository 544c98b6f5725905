use std::sync::Arc;

use npcgen_domain::AssetId;

use crate::infrastructure::asset_store::{AssetStore, StoredAsset};

use super::AssetError;

/// Read an asset's bytes and metadata. Expired uploads read as missing.
pub struct FetchAsset {
    store: Arc<AssetStore>,
}

impl FetchAsset {
    pub fn new(store: Arc<AssetStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, id: AssetId) -> Result<(StoredAsset, Vec<u8>), AssetError> {
        Ok(self.store.read(id).await?)
    }
}
