use serde::{Deserialize, Serialize};

/// A player message plus the exchanges the client has already displayed.
///
/// `history` is a list of `[player, npc]` pairs, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_pairs_deserialize_from_nested_arrays() {
        let json = r#"{"message":"Hello","history":[["Hi","Well met, traveller."]]}"#;
        let req: ChatRequest = serde_json::from_str(json).expect("valid request");
        assert_eq!(req.history.len(), 1);
        assert_eq!(req.history[0].1, "Well met, traveller.");
    }

    #[test]
    fn history_defaults_to_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"Hello"}"#).expect("valid");
        assert!(req.history.is_empty());
    }
}
