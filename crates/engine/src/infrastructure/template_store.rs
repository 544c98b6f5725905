//! Template Store: JSON templates on disk behind an mtime-checked LRU cache.
//!
//! `load` hands out `Arc<T>`; two loads of an unmodified file return the
//! same allocation. A modified file is reparsed and replaces the entry. A
//! failed parse leaves no entry behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use npcgen_domain::{CharacterProfile, WorldTemplate, CHARACTER_PROFILE_KEYS, WORLD_TEMPLATE_KEYS};
use serde::de::DeserializeOwned;

use crate::infrastructure::cache::MtimeCache;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Malformed template {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("Failed to read template {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("Invalid template filename: {0}")]
    InvalidFilename(String),
}

/// A JSON document type the store can load.
pub trait TemplateDocument: DeserializeOwned + Send + Sync + 'static {
    /// Human-readable kind for logs and errors.
    const KIND: &'static str;
    /// Top-level keys that must be present.
    const REQUIRED_KEYS: &'static [&'static str];

    /// Invariants beyond shape. Runs after deserialization.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl TemplateDocument for WorldTemplate {
    const KIND: &'static str = "environment";
    const REQUIRED_KEYS: &'static [&'static str] = WORLD_TEMPLATE_KEYS;
}

impl TemplateDocument for CharacterProfile {
    const KIND: &'static str = "character";
    const REQUIRED_KEYS: &'static [&'static str] = CHARACTER_PROFILE_KEYS;

    fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())
    }
}

/// Whether a JSON value carries every required top-level key of `T`.
pub fn has_required_keys<T: TemplateDocument>(value: &serde_json::Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| T::REQUIRED_KEYS.iter().all(|k| obj.contains_key(*k)))
}

/// Parse and validate a template document from JSON bytes.
pub fn parse_template<T: TemplateDocument>(raw: &[u8]) -> Result<T, String> {
    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| format!("invalid JSON: {}", e))?;
    parse_template_value(value)
}

/// Validate an already-parsed JSON value as a template document.
pub fn parse_template_value<T: TemplateDocument>(value: serde_json::Value) -> Result<T, String> {
    let Some(obj) = value.as_object() else {
        return Err(format!("{} template must be a JSON object", T::KIND));
    };
    if let Some(missing) = T::REQUIRED_KEYS.iter().find(|k| !obj.contains_key(**k)) {
        return Err(format!("missing required key '{}'", missing));
    }
    let doc: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
    doc.check()?;
    Ok(doc)
}

/// Reject names with path separators and append `.json` when missing.
pub fn sanitize_filename(filename: &str) -> Result<String, TemplateError> {
    let name = filename.trim();
    if name.is_empty() {
        return Err(TemplateError::InvalidFilename("filename is required".to_string()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(TemplateError::InvalidFilename(format!(
            "'{}' must not contain path separators",
            name
        )));
    }
    if name.to_ascii_lowercase().ends_with(".json") {
        Ok(name.to_string())
    } else {
        Ok(format!("{}.json", name))
    }
}

pub struct TemplateStore<T> {
    cache: MtimeCache<T>,
}

impl<T: TemplateDocument> TemplateStore<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: MtimeCache::new(capacity),
        }
    }

    pub async fn load(&self, path: &Path) -> Result<Arc<T>, TemplateError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.cache.remove(path).await;
                return Err(TemplateError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(io_error(path, e)),
        };
        if !metadata.is_file() {
            return Err(TemplateError::NotFound(path.to_path_buf()));
        }
        let modified = metadata.modified().map_err(|e| io_error(path, e))?;

        if let Some(hit) = self.cache.get_fresh(path, modified).await {
            return Ok(hit);
        }

        let raw = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        match parse_template::<T>(&raw) {
            Ok(doc) => {
                let doc = Arc::new(doc);
                self.cache
                    .insert(path.to_path_buf(), modified, Arc::clone(&doc))
                    .await;
                tracing::debug!(path = %path.display(), kind = T::KIND, "Loaded template");
                Ok(doc)
            }
            Err(reason) => {
                self.cache.remove(path).await;
                tracing::warn!(path = %path.display(), kind = T::KIND, %reason, "Malformed template");
                Err(TemplateError::Malformed {
                    path: path.to_path_buf(),
                    reason,
                })
            }
        }
    }

    /// Filenames in `dir` whose JSON looks like a `T`, sorted case-insensitively.
    pub async fn list_files(&self, dir: &Path) -> Result<Vec<String>, TemplateError> {
        let mut reader = tokio::fs::read_dir(dir).await.map_err(|e| io_error(dir, e))?;
        let mut files = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(dir, e))? {
            let path = entry.path();
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if !is_json {
                continue;
            }
            let Ok(raw) = tokio::fs::read(&path).await else {
                continue;
            };
            let matches = serde_json::from_slice::<serde_json::Value>(&raw)
                .map(|v| has_required_keys::<T>(&v))
                .unwrap_or(false);
            if matches {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort_by_key(|f| f.to_lowercase());
        Ok(files)
    }

    /// Write `value` as pretty JSON into `dir/filename`. Returns the sanitized filename.
    pub async fn save(
        &self,
        dir: &Path,
        filename: &str,
        value: &serde_json::Value,
    ) -> Result<String, TemplateError> {
        let filename = sanitize_filename(filename)?;
        let path = dir.join(&filename);
        let mut json = serde_json::to_string_pretty(value).map_err(|e| TemplateError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        json.push('\n');

        tokio::fs::create_dir_all(dir).await.map_err(|e| io_error(dir, e))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| io_error(&path, e))?;
        Ok(filename)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> TemplateError {
    TemplateError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
