//! CharacterProfile entity - a generated NPC

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Top-level keys a JSON document must carry to be read as a character profile.
pub const CHARACTER_PROFILE_KEYS: &[&str] = &[
    "name",
    "age",
    "gender",
    "personalities",
    "appearance",
    "background",
    "skills",
    "secrets",
];

/// A fully validated NPC profile.
///
/// Every field is required on the wire; there is no `#[serde(default)]` so a
/// model response that omits a key never deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub personalities: Vec<String>,
    pub appearance: Appearance,
    pub background: Background,
    pub skills: BTreeSet<String>,
    pub secrets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
}

impl CharacterProfile {
    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Character name cannot be empty"));
        }
        if self.personalities.iter().any(|p| p.trim().is_empty()) {
            return Err(DomainError::validation(
                "Character personalities cannot contain empty traits",
            ));
        }
        Ok(())
    }

    /// Name used for vector-store collections and default sessions.
    pub fn collection_name(&self) -> String {
        self.name.trim().replace(' ', "_")
    }
}
