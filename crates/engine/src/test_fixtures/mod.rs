//! Shared test data and helpers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{sample_profile, write_environment};
//!
//! #[tokio::test]
//! async fn test_load() {
//!     let dir = tempfile::tempdir().expect("tempdir");
//!     write_environment(dir.path(), "rome.json");
//! }
//! ```

pub mod image_mocks;

use std::path::Path;

use npcgen_domain::{CharacterProfile, WorldTemplate};

pub const KAIYA_JSON: &str = r#"{
  "name": "Kaiya Starling",
  "age": 30,
  "gender": "female",
  "personalities": ["curious", "loyal", "witty"],
  "appearance": {
    "description": "A weathered caravan scout with a patched green cloak",
    "height": "5'8\"",
    "hair": "auburn braid",
    "eyes": "grey"
  },
  "background": {
    "hometown": "Ostia",
    "family": "Raised by her uncle, a ship chandler",
    "motivation": "Map the eastern trade roads"
  },
  "skills": ["tracking", "archery", "bartering"],
  "secrets": ["She once sold a forged map to a senator"]
}"#;

pub const ROME_JSON: &str = r#"{
  "era": "Roman Empire",
  "time_period": "44 BC",
  "detail": {
    "Environment": "The crowded Forum at midday",
    "Social and Economic Aspects": "Grain shortages and rising bread prices",
    "Cultural Norms": "Patronage and public oratory",
    "Political Climate": "Tense after the Ides of March"
  }
}"#;

pub fn sample_profile() -> CharacterProfile {
    serde_json::from_str(KAIYA_JSON).expect("fixture profile parses")
}

pub fn sample_world() -> WorldTemplate {
    serde_json::from_str(ROME_JSON).expect("fixture world parses")
}

pub fn write_character(dir: &Path, filename: &str) {
    std::fs::write(dir.join(filename), KAIYA_JSON).expect("write character fixture");
}

pub fn write_environment(dir: &Path, filename: &str) {
    std::fs::write(dir.join(filename), ROME_JSON).expect("write environment fixture");
}

/// A complete profile as the model would return it, named `name`.
pub fn profile_response(name: &str) -> String {
    let mut value: serde_json::Value =
        serde_json::from_str(KAIYA_JSON).expect("fixture profile parses");
    value["name"] = serde_json::Value::String(name.to_string());
    value.to_string()
}
