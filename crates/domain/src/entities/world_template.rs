//! WorldTemplate entity - the setting a character is generated into

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level keys a JSON document must carry to be read as a world template.
pub const WORLD_TEMPLATE_KEYS: &[&str] = &["era", "time_period", "detail"];

/// A world/environment template loaded from disk.
///
/// `detail` holds free-form aspects ("Environment", "Cultural Norms", ...)
/// and `guardrails` holds rules the NPC must respect in dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTemplate {
    pub era: String,
    pub time_period: String,
    pub detail: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub guardrails: BTreeMap<String, String>,
}

impl WorldTemplate {
    pub fn new(era: impl Into<String>, time_period: impl Into<String>) -> Self {
        Self {
            era: era.into(),
            time_period: time_period.into(),
            detail: BTreeMap::new(),
            guardrails: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    pub fn with_guardrail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.guardrails.insert(key.into(), value.into());
        self
    }

    /// Look up a detail entry, returning `"Not specified"` when absent.
    pub fn detail_or_unspecified(&self, key: &str) -> &str {
        self.detail
            .get(key)
            .map(String::as_str)
            .unwrap_or("Not specified")
    }
}
