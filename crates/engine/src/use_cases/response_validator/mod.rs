//! Response Validator: turns raw model output into accepted domain values.
//!
//! Character output must be a single JSON object with every profile key
//! present and correctly typed. There is no repair and no coercion; a
//! rejection keeps the raw text for diagnosis.

mod dialogue;

use std::sync::LazyLock;

use npcgen_domain::CharacterProfile;
use regex_lite::Regex;

use crate::infrastructure::template_store::parse_template;

pub use dialogue::extract_dialogue;

/// A model response that could not be accepted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid model output: {reason}")]
pub struct ValidationError {
    pub reason: String,
    pub raw: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

// Model special tokens: <|...|> style, llama [INST] and <<SYS>> markers
static SPECIAL_TOKENS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\|[^|>]+\|>|\[/?INST\]|<</?SYS>>").expect("valid regex")
});

// gpt-oss style: analysis channel first, real content after the final marker
static FINAL_CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\|channel\|>final<\|message\|>(.*)$").expect("valid regex"));

static CODE_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\n(.*?)\n?```$").expect("valid regex")
});

/// Remove model-specific special tokens that leak into completions.
pub fn strip_special_tokens(raw: &str) -> String {
    if let Some(content) = FINAL_CONTENT_RE.captures(raw).and_then(|c| c.get(1)) {
        return SPECIAL_TOKENS_RE
            .replace_all(content.as_str().trim(), "")
            .to_string();
    }
    SPECIAL_TOKENS_RE.replace_all(raw, "").to_string()
}

/// Remove one Markdown code fence wrapping the whole text, if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    CODE_FENCE_RE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed)
}

/// Parse a character generation response.
pub fn validate(raw: &str) -> Result<CharacterProfile, ValidationError> {
    let cleaned = strip_special_tokens(raw);
    let body = strip_code_fence(&cleaned);
    if body.is_empty() {
        return Err(ValidationError::new("response is empty", raw));
    }
    parse_template::<CharacterProfile>(body.as_bytes()).map_err(|reason| {
        tracing::debug!(%reason, chars = raw.len(), "Rejected character response");
        ValidationError::new(reason, raw)
    })
}

/// Parse a `{"names": [...]}` response into distinct, non-empty names.
pub fn validate_names(raw: &str) -> Result<Vec<String>, ValidationError> {
    let cleaned = strip_special_tokens(raw);
    let body = strip_code_fence(&cleaned);
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ValidationError::new(format!("invalid JSON: {}", e), raw))?;

    // Models sometimes answer with a bare array or a differently named key.
    let list = match &value {
        serde_json::Value::Array(items) => Some(items),
        serde_json::Value::Object(obj) => obj
            .get("names")
            .and_then(|v| v.as_array())
            .or_else(|| obj.values().find_map(|v| v.as_array())),
        _ => None,
    }
    .ok_or_else(|| ValidationError::new("expected a list of names", raw))?;

    let mut names: Vec<String> = Vec::with_capacity(list.len());
    for item in list {
        let Some(name) = item.as_str().map(str::trim).filter(|n| !n.is_empty()) else {
            return Err(ValidationError::new("names must be non-empty strings", raw));
        };
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
