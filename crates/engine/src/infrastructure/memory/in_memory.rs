//! In-process vector store used when no Chroma server is configured.
//!
//! Records live in a concurrent map of collections and are ranked by cosine
//! distance (`1 - cosine similarity`), so 0.0 means identical direction.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::infrastructure::ports::{VectorMatch, VectorRecord, VectorStoreError, VectorStorePort};

#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: DashMap<String, HashMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStorePort for InMemoryVectorStore {
    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), VectorStoreError> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        for record in records {
            entry.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        let Some(records) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut matches: Vec<VectorMatch> = records
            .values()
            .map(|r| VectorMatch {
                id: r.id.clone(),
                document: r.document.clone(),
                distance: cosine_distance(&embedding, &r.embedding),
            })
            .collect();
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorStoreError> {
        self.collections.remove(collection);
        Ok(())
    }
}
