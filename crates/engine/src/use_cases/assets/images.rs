//! Generate a profile portrait and a full-body image for one character.

use std::sync::Arc;

use npcgen_domain::AssetId;
use npcgen_shared::ImageSize;

use crate::infrastructure::asset_store::{sniff_image_format, AssetKind, AssetStore};
use crate::infrastructure::generation_client::{GenerationClient, UpstreamError};
use crate::infrastructure::ports::{ImageRequest, ImageResult};
use crate::use_cases::prompt_builder;

use super::{AssetError, AssetUrls};

#[derive(Debug, Clone)]
pub struct ImageJob {
    pub prompt: String,
    pub profile_prompt: Option<String>,
    pub full_body_prompt: Option<String>,
    pub reference_images: Vec<String>,
    pub profile: ImageSize,
    pub full_body: ImageSize,
}

#[derive(Debug, Clone)]
pub struct GeneratedImages {
    pub profile_asset_id: AssetId,
    pub full_body_asset_id: AssetId,
    pub profile_image_url: String,
    pub full_body_image_url: String,
}

pub struct GenerateImages {
    client: GenerationClient,
    store: Arc<AssetStore>,
    urls: AssetUrls,
}

impl GenerateImages {
    pub fn new(client: GenerationClient, store: Arc<AssetStore>, urls: AssetUrls) -> Self {
        Self { client, store, urls }
    }

    /// Both images are requested concurrently; nothing is stored unless both succeed.
    pub async fn execute(&self, job: ImageJob) -> Result<GeneratedImages, AssetError> {
        let base = job.prompt.trim();
        if base.is_empty() {
            return Err(AssetError::InvalidImage("prompt cannot be empty".to_string()));
        }

        let profile = ImageRequest {
            prompt: prompt_builder::profile_image_prompt(base, job.profile_prompt.as_deref()),
            width: job.profile.width,
            height: job.profile.height,
            reference_images: job.reference_images.clone(),
        };
        let full_body = ImageRequest {
            prompt: prompt_builder::full_body_image_prompt(base, job.full_body_prompt.as_deref()),
            width: job.full_body.width,
            height: job.full_body.height,
            reference_images: job.reference_images,
        };

        let (profile, full_body) = tokio::join!(
            self.client.generate_image(profile),
            self.client.generate_image(full_body)
        );
        let (profile, full_body) = (profile?, full_body?);

        let profile_asset_id = self.store_image(profile).await?;
        let full_body_asset_id = match self.store_image(full_body).await {
            Ok(id) => id,
            Err(e) => {
                self.store.delete(profile_asset_id).await;
                return Err(e);
            }
        };
        tracing::info!(%profile_asset_id, %full_body_asset_id, "Stored generated images");

        Ok(GeneratedImages {
            profile_asset_id,
            full_body_asset_id,
            profile_image_url: self.urls.asset_url(profile_asset_id),
            full_body_image_url: self.urls.asset_url(full_body_asset_id),
        })
    }

    async fn store_image(&self, image: ImageResult) -> Result<AssetId, AssetError> {
        // Trust the bytes over the provider's label.
        let kind = sniff_image_format(&image.image_data)
            .and_then(AssetKind::from_format)
            .or_else(|| AssetKind::from_format(&image.format).filter(AssetKind::is_image))
            .ok_or_else(|| {
                UpstreamError::MalformedPayload(format!(
                    "provider returned an unrecognised image ({})",
                    image.format
                ))
            })?;
        Ok(self.store.save(&image.image_data, kind).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::admission::AdmissionGate;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ports::{ImageGenError, MockImageGenPort, MockLlmPort};
    use crate::test_fixtures::image_mocks::RecordingImageGen;

    fn job(prompt: &str) -> ImageJob {
        ImageJob {
            prompt: prompt.to_string(),
            profile_prompt: None,
            full_body_prompt: None,
            reference_images: Vec::new(),
            profile: ImageSize::PROFILE,
            full_body: ImageSize::FULL_BODY,
        }
    }

    fn use_case(
        images: Arc<dyn crate::infrastructure::ports::ImageGenPort>,
        dir: &std::path::Path,
    ) -> (GenerateImages, Arc<AssetStore>) {
        let llm = Arc::new(MockLlmPort::new());
        let client = GenerationClient::new(llm.clone(), llm, images, Arc::new(AdmissionGate::new(2)));
        let store = Arc::new(AssetStore::new(dir, Arc::new(SystemClock::new())));
        (
            GenerateImages::new(client, store.clone(), AssetUrls::new(None)),
            store,
        )
    }

    #[tokio::test]
    async fn when_both_images_succeed_then_two_assets_are_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = Arc::new(RecordingImageGen::new());
        let (generate, store) = use_case(images.clone(), dir.path());

        let result = generate.execute(job("a hooded ranger")).await.expect("images");

        let requests = images.requests();
        assert_eq!(requests.len(), 2);
        let sizes: Vec<(u32, u32)> = requests.iter().map(|r| (r.width, r.height)).collect();
        assert!(sizes.contains(&(768, 768)));
        assert!(sizes.contains(&(832, 1216)));
        assert!(requests
            .iter()
            .any(|r| r.prompt == "a hooded ranger, portrait profile picture, centered face, clean background"));

        let profile = store.find(result.profile_asset_id).await.expect("profile stored");
        assert_eq!(profile.kind, AssetKind::Png);
        assert_eq!(
            result.profile_image_url,
            format!("/assets/{}", result.profile_asset_id)
        );
    }

    #[tokio::test]
    async fn when_one_image_fails_then_nothing_is_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut images = MockImageGenPort::new();
        images
            .expect_generate()
            .returning(|_| Err(ImageGenError::GenerationFailed("nsfw filter".to_string())));
        let (generate, _) = use_case(Arc::new(images), dir.path());

        let err = generate.execute(job("a hooded ranger")).await.expect_err("failed");

        assert!(matches!(err, AssetError::Upstream(_)));
        let stored = std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0);
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn when_full_body_cannot_be_stored_then_profile_is_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut images = MockImageGenPort::new();
        images.expect_generate().returning(|request| {
            let image_data = if request.width == ImageSize::PROFILE.width {
                crate::test_fixtures::image_mocks::minimal_png()
            } else {
                b"not an image".to_vec()
            };
            Ok(ImageResult {
                image_data,
                format: "txt".to_string(),
            })
        });
        let (generate, _) = use_case(Arc::new(images), dir.path());

        let err = generate.execute(job("a hooded ranger")).await.expect_err("failed");

        assert!(matches!(
            err,
            AssetError::Upstream(UpstreamError::MalformedPayload(_))
        ));
        let stored = std::fs::read_dir(dir.path()).map(|d| d.count()).unwrap_or(0);
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn when_reference_is_localhost_then_rejected_before_any_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = Arc::new(RecordingImageGen::new());
        let (generate, _) = use_case(images.clone(), dir.path());
        let mut job = job("a hooded ranger");
        job.reference_images = vec!["http://localhost:8000/assets/x".to_string()];

        let err = generate.execute(job).await.expect_err("local reference");

        assert!(matches!(
            err,
            AssetError::Upstream(UpstreamError::InvalidRequest(_))
        ));
        assert!(images.requests().is_empty());
    }
}
