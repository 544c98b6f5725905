//! HTTP client for an external image-to-3D service.
//!
//! The service takes raw image bytes and answers with a binary glTF body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::infrastructure::ports::{MeshConverterError, MeshConverterPort};

const GLB_MAGIC: &[u8] = b"glTF";

pub struct HttpMeshConverter {
    client: Client,
    url: String,
}

impl HttpMeshConverter {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl MeshConverterPort for HttpMeshConverter {
    async fn convert(&self, image: Vec<u8>) -> Result<Vec<u8>, MeshConverterError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| MeshConverterError::ConversionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MeshConverterError::ConversionFailed(format!(
                "converter returned {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MeshConverterError::ConversionFailed(e.to_string()))?;
        if !bytes.starts_with(GLB_MAGIC) {
            return Err(MeshConverterError::ConversionFailed(
                "converter response is not a GLB file".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}
