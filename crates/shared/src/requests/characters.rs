use npcgen_domain::WorldTemplate;
use serde::{Deserialize, Serialize};

/// Which environment to generate against: a file in the data directory or
/// an inline template. Omitted means the active environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvironmentRef {
    Filename(String),
    Inline(WorldTemplate),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateCharactersRequest {
    #[serde(default)]
    pub environment: Option<EnvironmentRef>,
    /// One character is generated per name. When empty, `count` unnamed
    /// characters are generated instead.
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub count: Option<usize>,
    /// Traits to request. When empty, traits are sampled per character.
    #[serde(default)]
    pub personalities: Vec<String>,
    /// Free-form instruction appended to the prompt.
    #[serde(default)]
    pub instruction: Option<String>,
    /// Attempts per character (caller-side retry). Defaults to one.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestNamesRequest {
    #[serde(default)]
    pub environment: Option<EnvironmentRef>,
    pub amount: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_ref_accepts_filename_or_object() {
        let by_name: EnvironmentRef =
            serde_json::from_str(r#""rome.json""#).expect("filename form");
        assert!(matches!(by_name, EnvironmentRef::Filename(ref f) if f == "rome.json"));

        let inline: EnvironmentRef = serde_json::from_str(
            r#"{"era":"Roman Empire","time_period":"44 BC","detail":{}}"#,
        )
        .expect("inline form");
        assert!(matches!(inline, EnvironmentRef::Inline(ref w) if w.era == "Roman Empire"));
    }
}
