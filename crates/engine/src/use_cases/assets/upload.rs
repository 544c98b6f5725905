//! Accept a reference image upload as a temporary asset.

use std::sync::Arc;
use std::time::Duration;

use npcgen_domain::AssetId;

use crate::infrastructure::asset_store::{sniff_image_format, AssetKind, AssetStore};

use super::{AssetError, AssetUrls};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub asset_id: AssetId,
    pub image_url: String,
}

pub struct UploadReference {
    store: Arc<AssetStore>,
    urls: AssetUrls,
    ttl: Duration,
}

impl UploadReference {
    pub fn new(store: Arc<AssetStore>, urls: AssetUrls, ttl: Duration) -> Self {
        Self { store, urls, ttl }
    }

    /// Only PNG, JPEG and WebP are accepted, judged by content, not filename.
    pub async fn execute(&self, bytes: &[u8]) -> Result<UploadedImage, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::InvalidImage("upload is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AssetError::InvalidImage(format!(
                "upload exceeds {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }
        let kind = sniff_image_format(bytes)
            .and_then(AssetKind::from_format)
            .ok_or_else(|| {
                AssetError::InvalidImage("expected a PNG, JPEG or WebP image".to_string())
            })?;

        let asset_id = self.store.save_temporary(bytes, kind, self.ttl).await?;
        tracing::info!(%asset_id, size = bytes.len(), ttl_secs = self.ttl.as_secs(), "Stored reference upload");
        Ok(UploadedImage {
            asset_id,
            image_url: self.urls.asset_url(asset_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::test_fixtures::image_mocks::minimal_png;

    fn upload(dir: &std::path::Path, ttl: Duration) -> (UploadReference, Arc<AssetStore>) {
        let clock = Arc::new(FixedClock(chrono::Utc::now()));
        let store = Arc::new(AssetStore::new(dir, clock));
        (
            UploadReference::new(store.clone(), AssetUrls::new(None), ttl),
            store,
        )
    }

    #[tokio::test]
    async fn when_png_uploaded_then_temporary_asset_is_readable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (use_case, store) = upload(dir.path(), Duration::from_secs(300));

        let uploaded = use_case.execute(&minimal_png()).await.expect("uploaded");

        let (asset, bytes) = store.read(uploaded.asset_id).await.expect("readable");
        assert_eq!(asset.kind, AssetKind::Png);
        assert_eq!(bytes, minimal_png());
        assert!(uploaded.image_url.ends_with(&uploaded.asset_id.to_string()));
    }

    #[tokio::test]
    async fn when_ttl_is_zero_then_upload_expires_immediately() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (use_case, store) = upload(dir.path(), Duration::ZERO);

        let uploaded = use_case.execute(&minimal_png()).await.expect("uploaded");

        assert!(store.find(uploaded.asset_id).await.is_err());
    }

    #[tokio::test]
    async fn when_bytes_are_not_an_image_then_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (use_case, _) = upload(dir.path(), Duration::from_secs(300));

        let err = use_case
            .execute(b"GIF89a not supported")
            .await
            .expect_err("gif");
        assert!(matches!(err, AssetError::InvalidImage(_)));
        let err = use_case.execute(&[]).await.expect_err("empty");
        assert!(matches!(err, AssetError::InvalidImage(_)));
    }
}
