//! Filesystem store for generated and uploaded binary assets.
//!
//! Assets live flat in one directory as `<uuid>.<ext>`. Temporary uploads
//! carry a `<uuid>.tmp.json` sidecar with their expiry; an expired asset is
//! deleted the first time it is looked up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use npcgen_domain::AssetId;
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{ClockPort, RepoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Png,
    Jpeg,
    Webp,
    Glb,
}

impl AssetKind {
    /// Lookup order when resolving an id to a file.
    const ALL: [AssetKind; 4] = [Self::Png, Self::Jpeg, Self::Webp, Self::Glb];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Glb => "glb",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Glb => "model/gltf-binary",
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Glb)
    }

    /// Map a provider format name or file extension to a kind.
    pub fn from_format(format: &str) -> Option<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "glb" => Some(Self::Glb),
            _ => None,
        }
    }
}

/// Identify an image by its magic bytes.
pub fn sniff_image_format(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// A resolved asset on disk.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub id: AssetId,
    pub kind: AssetKind,
    pub path: PathBuf,
}

impl StoredAsset {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.kind.extension())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TemporaryMeta {
    asset_id: String,
    kind: String,
    created_at: f64,
    expires_at: f64,
}

pub struct AssetStore {
    dir: PathBuf,
    clock: Arc<dyn ClockPort>,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            dir: dir.into(),
            clock,
        }
    }

    /// Persist bytes under a fresh id.
    pub async fn save(&self, bytes: &[u8], kind: AssetKind) -> Result<AssetId, RepoError> {
        let id = AssetId::new();
        self.write_file(&self.asset_path(id, kind), bytes).await?;
        tracing::debug!(asset_id = %id, kind = kind.extension(), size = bytes.len(), "Saved asset");
        Ok(id)
    }

    /// Persist bytes that expire after `ttl`.
    pub async fn save_temporary(
        &self,
        bytes: &[u8],
        kind: AssetKind,
        ttl: Duration,
    ) -> Result<AssetId, RepoError> {
        let id = self.save(bytes, kind).await?;
        let now = self.clock.now();
        let expires = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        let meta = TemporaryMeta {
            asset_id: id.to_string(),
            kind: "temporary_upload".to_string(),
            created_at: unix_seconds(now),
            expires_at: unix_seconds(expires),
        };
        let json = serde_json::to_vec_pretty(&meta).map_err(RepoError::serialization)?;
        self.write_file(&self.meta_path(id), &json).await?;
        Ok(id)
    }

    /// Resolve an id to its file, enforcing temporary-upload expiry.
    pub async fn find(&self, id: AssetId) -> Result<StoredAsset, RepoError> {
        if self.is_expired(id).await {
            tracing::info!(asset_id = %id, "Temporary asset expired, deleting");
            self.delete(id).await;
            return Err(RepoError::not_found("Asset", id));
        }

        for kind in AssetKind::ALL {
            let path = self.asset_path(id, kind);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Ok(StoredAsset { id, kind, path });
            }
        }
        Err(RepoError::not_found("Asset", id))
    }

    pub async fn read(&self, id: AssetId) -> Result<(StoredAsset, Vec<u8>), RepoError> {
        let asset = self.find(id).await?;
        let bytes = tokio::fs::read(&asset.path)
            .await
            .map_err(|e| RepoError::storage("read_asset", e))?;
        Ok((asset, bytes))
    }

    /// Best-effort removal of every file belonging to `id`.
    pub async fn delete(&self, id: AssetId) {
        for kind in AssetKind::ALL {
            let _ = tokio::fs::remove_file(self.asset_path(id, kind)).await;
        }
        let _ = tokio::fs::remove_file(self.meta_path(id)).await;
    }

    async fn is_expired(&self, id: AssetId) -> bool {
        let Ok(raw) = tokio::fs::read(self.meta_path(id)).await else {
            return false;
        };
        // Unreadable metadata counts as expired.
        let expires_at = serde_json::from_slice::<TemporaryMeta>(&raw)
            .map(|m| m.expires_at)
            .unwrap_or(0.0);
        unix_seconds(self.clock.now()) >= expires_at
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), RepoError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RepoError::storage("create_assets_dir", e))?;
        let partial = path.with_extension("part");
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(|e| RepoError::storage("write_asset", e))?;
        tokio::fs::rename(&partial, path)
            .await
            .map_err(|e| RepoError::storage("write_asset", e))
    }

    fn asset_path(&self, id: AssetId, kind: AssetKind) -> PathBuf {
        self.dir.join(format!("{}.{}", id, kind.extension()))
    }

    fn meta_path(&self, id: AssetId) -> PathBuf {
        self.dir.join(format!("{}.tmp.json", id))
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
