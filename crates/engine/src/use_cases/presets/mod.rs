//! Image prompt preset use cases.

use std::sync::Arc;

use npcgen_domain::{DomainError, PresetKind, PromptPreset};

use crate::infrastructure::ports::{RandomPort, RepoError};
use crate::infrastructure::preset_store::PresetStore;
use crate::use_cases::prompt_builder;

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("No {0} presets are saved")]
    NoneOfKind(PresetKind),
    #[error("Preset storage failed: {0}")]
    Storage(#[from] RepoError),
}

/// List, save, delete and pick presets. All writes go through one store.
pub struct PresetUseCases {
    store: Arc<PresetStore>,
    random: Arc<dyn RandomPort>,
}

impl PresetUseCases {
    pub fn new(store: Arc<PresetStore>, random: Arc<dyn RandomPort>) -> Self {
        Self { store, random }
    }

    pub async fn list(&self) -> Result<Vec<PromptPreset>, PresetError> {
        Ok(self.store.list().await?)
    }

    /// Create or replace the preset with this name.
    pub async fn upsert(
        &self,
        name: &str,
        kind: &str,
        prompt: &str,
    ) -> Result<PromptPreset, PresetError> {
        let kind: PresetKind = kind.parse()?;
        let preset = PromptPreset::new(name, kind, prompt)?;
        self.store.upsert(&preset).await?;
        tracing::info!(name = preset.name(), kind = %kind, "Saved prompt preset");
        Ok(preset)
    }

    /// Returns whether a preset was removed. Missing names are not an error.
    pub async fn delete(&self, name: &str) -> Result<bool, PresetError> {
        let removed = self.store.delete(name.trim()).await?;
        if removed {
            tracing::info!(name, "Deleted prompt preset");
        }
        Ok(removed)
    }

    /// One saved preset of `kind`, chosen at random.
    pub async fn pick(&self, kind: PresetKind) -> Result<PromptPreset, PresetError> {
        let presets = self.store.list().await?;
        prompt_builder::choose_preset(&presets, kind, self.random.as_ref())
            .cloned()
            .ok_or(PresetError::NoneOfKind(kind))
    }
}
