//! JSON file store for prompt presets.
//!
//! On-disk format: `{ "<name>": { "kind": "character|environment", "prompt": "..." } }`.
//! Entries that fail validation are skipped on read. Writes go to a sibling
//! temp file and are renamed into place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use npcgen_domain::{PresetKind, PromptPreset};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::infrastructure::ports::RepoError;

pub const PRESETS_FILENAME: &str = "image_prompt_presets.json";

#[derive(Debug, Serialize, Deserialize)]
struct PresetRecord {
    kind: String,
    prompt: String,
}

pub struct PresetStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl PresetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// All valid presets, sorted by name case-insensitively.
    pub async fn list(&self) -> Result<Vec<PromptPreset>, RepoError> {
        let records = self.read_records().await?;
        let mut presets: Vec<PromptPreset> = records
            .into_iter()
            .filter_map(|(name, record)| {
                let kind: PresetKind = record.kind.parse().ok()?;
                PromptPreset::new(name, kind, record.prompt).ok()
            })
            .collect();
        presets.sort_by_key(|p| p.name().to_lowercase());
        Ok(presets)
    }

    pub async fn upsert(&self, preset: &PromptPreset) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await?;
        records.insert(
            preset.name().to_string(),
            PresetRecord {
                kind: preset.kind().as_str().to_string(),
                prompt: preset.prompt().to_string(),
            },
        );
        self.write_records(&records).await
    }

    /// Remove a preset. Returns whether it existed; removing a missing name is not an error.
    pub async fn delete(&self, name: &str) -> Result<bool, RepoError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records().await?;
        if records.remove(name).is_none() {
            return Ok(false);
        }
        self.write_records(&records).await?;
        Ok(true)
    }

    async fn read_records(&self) -> Result<BTreeMap<String, PresetRecord>, RepoError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(RepoError::storage("read_presets", e)),
        };

        let value: serde_json::Value = match serde_json::from_slice(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Preset file is not valid JSON, ignoring");
                return Ok(BTreeMap::new());
            }
        };

        let Some(object) = value.as_object() else {
            return Ok(BTreeMap::new());
        };

        Ok(object
            .iter()
            .filter_map(|(name, v)| {
                serde_json::from_value::<PresetRecord>(v.clone())
                    .ok()
                    .map(|record| (name.clone(), record))
            })
            .collect())
    }

    async fn write_records(&self, records: &BTreeMap<String, PresetRecord>) -> Result<(), RepoError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepoError::storage("write_presets", e))?;
        }
        let mut json = serde_json::to_string_pretty(records).map_err(RepoError::serialization)?;
        json.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RepoError::storage("write_presets", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RepoError::storage("write_presets", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(name: &str, kind: PresetKind, prompt: &str) -> PromptPreset {
        PromptPreset::new(name, kind, prompt).expect("valid preset")
    }

    #[tokio::test]
    async fn missing_file_lists_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PresetStore::new(dir.path().join(PRESETS_FILENAME));
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_and_list_sorts_case_insensitively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PresetStore::new(dir.path().join(PRESETS_FILENAME));

        store.upsert(&preset("noir", PresetKind::Character, "rain")).await.expect("upsert");
        store.upsert(&preset("Alley", PresetKind::Environment, "bricks")).await.expect("upsert");
        store.upsert(&preset("noir", PresetKind::Character, "neon rain")).await.expect("upsert");

        let presets = store.list().await.expect("list");
        let names: Vec<&str> = presets.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Alley", "noir"]);
        assert_eq!(presets[1].prompt(), "neon rain");
        assert!(!dir.path().join("image_prompt_presets.json.tmp").exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PresetStore::new(dir.path().join(PRESETS_FILENAME));
        store.upsert(&preset("noir", PresetKind::Character, "rain")).await.expect("upsert");

        assert!(store.delete("noir").await.expect("delete"));
        assert!(!store.delete("noir").await.expect("delete again"));
        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn invalid_entries_on_disk_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(PRESETS_FILENAME);
        std::fs::write(
            &path,
            r#"{"good":{"kind":"character","prompt":"ok"},"bad-kind":{"kind":"vehicle","prompt":"x"},"blank":{"kind":"environment","prompt":"  "},"junk":3}"#,
        )
        .expect("seed file");

        let presets = PresetStore::new(path).list().await.expect("list");
        assert_eq!(presets.len(), 1);
        assert_eq!(presets[0].name(), "good");
    }
}
