//! Active character and environment.
//!
//! The active documents are either a file in the data directory (re-read
//! through the Template Store on every access, so edits on disk are picked
//! up) or an inline object supplied by a client.

use std::path::PathBuf;
use std::sync::Arc;

use npcgen_domain::{CharacterProfile, WorldTemplate};
use npcgen_shared::EnvironmentRef;
use tokio::sync::RwLock;

use crate::infrastructure::template_store::{
    parse_template_value, sanitize_filename, TemplateDocument, TemplateError, TemplateStore,
};

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("No active {0} is loaded")]
    NoActive(&'static str),
    #[error("Invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
    #[error("Provide either a filename or an inline {0}")]
    MissingSource(&'static str),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Files available in the data directory plus the active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFiles {
    pub files: Vec<String>,
    pub current: Option<String>,
}

enum ActiveSource<T> {
    File(String),
    Inline(Arc<T>),
}

impl<T> Clone for ActiveSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::File(name) => Self::File(name.clone()),
            Self::Inline(doc) => Self::Inline(Arc::clone(doc)),
        }
    }
}

struct ActiveSlot<T> {
    store: TemplateStore<T>,
    dir: PathBuf,
    current: RwLock<Option<ActiveSource<T>>>,
}

impl<T: TemplateDocument> ActiveSlot<T> {
    fn new(dir: PathBuf, cache_capacity: usize) -> Self {
        Self {
            store: TemplateStore::new(cache_capacity),
            dir,
            current: RwLock::new(None),
        }
    }

    async fn get(&self) -> Result<Arc<T>, ContextError> {
        let source = self.current.read().await.clone();
        match source {
            None => Err(ContextError::NoActive(T::KIND)),
            Some(ActiveSource::Inline(doc)) => Ok(doc),
            Some(ActiveSource::File(name)) => Ok(self.store.load(&self.dir.join(name)).await?),
        }
    }

    async fn current_file(&self) -> Option<String> {
        match &*self.current.read().await {
            Some(ActiveSource::File(name)) => Some(name.clone()),
            _ => None,
        }
    }

    async fn load_file(&self, filename: &str) -> Result<(String, Arc<T>), ContextError> {
        let name = sanitize_filename(filename)?;
        let doc = self.store.load(&self.dir.join(&name)).await?;
        Ok((name, doc))
    }

    async fn activate_file(&self, filename: &str) -> Result<Arc<T>, ContextError> {
        let (name, doc) = self.load_file(filename).await?;
        *self.current.write().await = Some(ActiveSource::File(name.clone()));
        tracing::info!(kind = T::KIND, file = %name, "Activated template file");
        Ok(doc)
    }

    async fn activate_inline(&self, value: serde_json::Value) -> Result<Arc<T>, ContextError> {
        let doc = Arc::new(parse(value)?);
        *self.current.write().await = Some(ActiveSource::Inline(Arc::clone(&doc)));
        tracing::info!(kind = T::KIND, "Activated inline template");
        Ok(doc)
    }

    async fn activate(
        &self,
        filename: Option<&str>,
        inline: Option<serde_json::Value>,
    ) -> Result<Arc<T>, ContextError> {
        match (inline, filename.map(str::trim).filter(|f| !f.is_empty())) {
            (Some(value), _) => self.activate_inline(value).await,
            (None, Some(name)) => self.activate_file(name).await,
            (None, None) => Err(ContextError::MissingSource(T::KIND)),
        }
    }

    async fn save(&self, filename: &str, value: serde_json::Value) -> Result<String, ContextError> {
        parse::<T>(value.clone())?;
        let saved = self.store.save(&self.dir, filename, &value).await?;
        tracing::info!(kind = T::KIND, file = %saved, "Saved template");
        Ok(saved)
    }

    async fn list(&self) -> Result<ConfigFiles, ContextError> {
        let files = if tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            self.store.list_files(&self.dir).await?
        } else {
            Vec::new()
        };
        Ok(ConfigFiles {
            files,
            current: self.current_file().await,
        })
    }
}

fn parse<T: TemplateDocument>(value: serde_json::Value) -> Result<T, ContextError> {
    parse_template_value::<T>(value).map_err(|reason| ContextError::Invalid {
        kind: T::KIND,
        reason,
    })
}

/// Holds the active character and environment.
pub struct ActiveContext {
    characters: ActiveSlot<CharacterProfile>,
    environments: ActiveSlot<WorldTemplate>,
}

impl ActiveContext {
    pub fn new(data_dir: impl Into<PathBuf>, cache_capacity: usize) -> Self {
        let data_dir = data_dir.into();
        Self {
            characters: ActiveSlot::new(data_dir.clone(), cache_capacity),
            environments: ActiveSlot::new(data_dir, cache_capacity),
        }
    }

    /// Activate the startup defaults. Missing or broken files are logged and skipped.
    pub async fn activate_defaults(&self, character_file: &str, environment_file: &str) {
        if let Err(e) = self.characters.activate_file(character_file).await {
            tracing::warn!(file = character_file, error = %e, "Default character not loaded");
        }
        if let Err(e) = self.environments.activate_file(environment_file).await {
            tracing::warn!(file = environment_file, error = %e, "Default environment not loaded");
        }
    }

    pub async fn character(&self) -> Result<Arc<CharacterProfile>, ContextError> {
        self.characters.get().await
    }

    pub async fn environment(&self) -> Result<Arc<WorldTemplate>, ContextError> {
        self.environments.get().await
    }

    /// The environment a request names, or the active one when it names none.
    pub async fn resolve_environment(
        &self,
        reference: Option<EnvironmentRef>,
    ) -> Result<Arc<WorldTemplate>, ContextError> {
        match reference {
            None => self.environment().await,
            Some(EnvironmentRef::Inline(world)) => Ok(Arc::new(world)),
            Some(EnvironmentRef::Filename(name)) => {
                Ok(self.environments.load_file(&name).await?.1)
            }
        }
    }

    pub async fn list_characters(&self) -> Result<ConfigFiles, ContextError> {
        self.characters.list().await
    }

    pub async fn list_environments(&self) -> Result<ConfigFiles, ContextError> {
        self.environments.list().await
    }

    pub async fn load_character(
        &self,
        filename: Option<&str>,
        inline: Option<serde_json::Value>,
    ) -> Result<Arc<CharacterProfile>, ContextError> {
        self.characters.activate(filename, inline).await
    }

    pub async fn load_environment(
        &self,
        filename: Option<&str>,
        inline: Option<serde_json::Value>,
    ) -> Result<Arc<WorldTemplate>, ContextError> {
        self.environments.activate(filename, inline).await
    }

    pub async fn save_character(
        &self,
        filename: &str,
        value: serde_json::Value,
    ) -> Result<String, ContextError> {
        self.characters.save(filename, value).await
    }

    pub async fn save_environment(
        &self,
        filename: &str,
        value: serde_json::Value,
    ) -> Result<String, ContextError> {
        self.environments.save(filename, value).await
    }

    pub async fn current_character_file(&self) -> Option<String> {
        self.characters.current_file().await
    }

    pub async fn current_environment_file(&self) -> Option<String> {
        self.environments.current_file().await
    }
}
