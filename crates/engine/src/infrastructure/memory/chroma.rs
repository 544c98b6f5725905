//! Chroma vector store over its v2 REST API.
//!
//! Collections are addressed by name on our side; Chroma wants ids for record
//! operations, so resolved ids are cached per name.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{VectorMatch, VectorRecord, VectorStoreError, VectorStorePort};
use crate::infrastructure::settings::ChromaSettings;

pub struct ChromaVectorStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    tenant: String,
    database: String,
    collection_ids: DashMap<String, String>,
}

impl ChromaVectorStore {
    pub fn new(settings: &ChromaSettings, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            tenant: settings.tenant.clone(),
            database: settings.database.clone(),
            collection_ids: DashMap::new(),
        }
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-chroma-token", key),
            None => builder,
        }
    }

    async fn get_or_create(&self, name: &str) -> Result<String, VectorStoreError> {
        if let Some(id) = self.collection_ids.get(name) {
            return Ok(id.clone());
        }
        let response = self
            .authed(self.client.post(self.collections_url()))
            .json(&CreateCollection {
                name,
                get_or_create: true,
            })
            .send()
            .await
            .map_err(transport)?;
        let collection: CollectionInfo = read_json(response).await?;
        self.collection_ids
            .insert(name.to_string(), collection.id.clone());
        Ok(collection.id)
    }

    async fn find(&self, name: &str) -> Result<Option<String>, VectorStoreError> {
        if let Some(id) = self.collection_ids.get(name) {
            return Ok(Some(id.clone()));
        }
        let response = self
            .authed(
                self.client
                    .get(format!("{}/{}", self.collections_url(), name)),
            )
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let collection: CollectionInfo = read_json(response).await?;
        self.collection_ids
            .insert(name.to_string(), collection.id.clone());
        Ok(Some(collection.id))
    }
}

#[async_trait]
impl VectorStorePort for ChromaVectorStore {
    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let id = self.get_or_create(collection).await?;
        let mut body = UpsertBody::default();
        for record in records {
            body.ids.push(record.id);
            body.documents.push(record.document);
            body.embeddings.push(record.embedding);
            body.metadatas.push(record.metadata);
        }
        let response = self
            .authed(
                self.client
                    .post(format!("{}/{}/upsert", self.collections_url(), id)),
            )
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(response).await
    }

    async fn query(
        &self,
        collection: &str,
        embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        let Some(id) = self.find(collection).await? else {
            return Ok(Vec::new());
        };
        let response = self
            .authed(
                self.client
                    .post(format!("{}/{}/query", self.collections_url(), id)),
            )
            .json(&QueryBody {
                query_embeddings: vec![embedding],
                n_results: limit,
                include: vec!["documents", "distances"],
            })
            .send()
            .await
            .map_err(transport)?;
        let result: QueryResult = read_json(response).await?;

        let ids = result.ids.into_iter().next().unwrap_or_default();
        let documents = result
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let distances = result
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        Ok(ids
            .into_iter()
            .zip(documents)
            .zip(distances)
            .filter_map(|((id, document), distance)| {
                Some(VectorMatch {
                    id,
                    document: document?,
                    distance: distance.unwrap_or(f32::MAX),
                })
            })
            .collect())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorStoreError> {
        self.collection_ids.remove(collection);
        let response = self
            .authed(
                self.client
                    .delete(format!("{}/{}", self.collections_url(), collection)),
            )
            .send()
            .await
            .map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response).await
    }
}

fn transport(e: reqwest::Error) -> VectorStoreError {
    VectorStoreError::RequestFailed(e.to_string())
}

async fn ensure_success(response: reqwest::Response) -> Result<(), VectorStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(VectorStoreError::RequestFailed(format!(
        "Chroma returned {}: {}",
        status, body
    )))
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, VectorStoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VectorStoreError::RequestFailed(format!(
            "Chroma returned {}: {}",
            status, body
        )));
    }
    response
        .json()
        .await
        .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
}

// =============================================================================
// Chroma wire types
// =============================================================================

#[derive(Serialize)]
struct CreateCollection<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize, Default)]
struct UpsertBody {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    documents: Vec<String>,
    metadatas: Vec<std::collections::HashMap<String, serde_json::Value>>,
}

#[derive(Serialize)]
struct QueryBody {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: Vec<&'static str>,
}

#[derive(Deserialize)]
struct QueryResult {
    ids: Vec<Vec<String>>,
    documents: Option<Vec<Vec<Option<String>>>>,
    distances: Option<Vec<Vec<Option<f32>>>>,
}
