//! PromptPreset entity - reusable image prompt fragments

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// What a preset prompt describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    Character,
    Environment,
}

impl PresetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Environment => "environment",
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "character" => Ok(Self::Character),
            "environment" => Ok(Self::Environment),
            other => Err(DomainError::parse(format!("Unknown preset kind: {}", other))),
        }
    }
}

/// A named prompt preset. The name is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPreset {
    name: String,
    kind: PresetKind,
    prompt: String,
}

impl PromptPreset {
    /// Create a preset, trimming the name and prompt.
    pub fn new(
        name: impl Into<String>,
        kind: PresetKind,
        prompt: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        let prompt = prompt.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Preset name cannot be empty"));
        }
        if prompt.is_empty() {
            return Err(DomainError::validation("Preset prompt cannot be empty"));
        }
        Ok(Self { name, kind, prompt })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PresetKind {
        self.kind
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_name_and_prompt() {
        let preset = PromptPreset::new("  Noir  ", PresetKind::Character, " rain, neon ")
            .expect("valid preset");
        assert_eq!(preset.name(), "Noir");
        assert_eq!(preset.prompt(), "rain, neon");
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let err = PromptPreset::new("Noir", PresetKind::Environment, "   ")
            .expect_err("empty prompt");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(
            "Environment".parse::<PresetKind>().expect("known kind"),
            PresetKind::Environment
        );
        assert!("vehicle".parse::<PresetKind>().is_err());
    }
}
