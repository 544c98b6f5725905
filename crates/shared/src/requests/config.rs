use serde::{Deserialize, Serialize};

/// Activate a character by filename or from an inline object.
///
/// The inline object is kept as raw JSON so the backend can report a schema
/// mismatch as a 400 instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadCharacterRequest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub character: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCharacterRequest {
    pub filename: String,
    pub character: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadEnvironmentRequest {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub environment: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEnvironmentRequest {
    pub filename: String,
    pub environment: serde_json::Value,
}
