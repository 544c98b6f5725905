//! Vector store port used by the memory adapter.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::VectorStoreError;

/// A document with its embedding, addressed by a caller-chosen id.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A query hit. Lower distance means more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    pub document: String,
    pub distance: f32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStorePort: Send + Sync {
    /// Insert or replace records by id, creating the collection on demand.
    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorStoreError>;

    /// Up to `limit` nearest records, closest first. A missing collection
    /// yields an empty result.
    async fn query(
        &self,
        collection: &str,
        embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<VectorMatch>, VectorStoreError>;

    /// Drop the collection and everything in it. Missing collections are fine.
    async fn delete_collection(&self, collection: &str) -> Result<(), VectorStoreError>;
}
