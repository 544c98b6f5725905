//! Pull the spoken reply out of a dialogue completion.
//!
//! Reasoning models often think out loud before answering, restate the
//! output rules, or wrap several drafts in `<response>` tags. Extraction
//! falls through progressively weaker signals until something usable is left.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::strip_special_tokens;

static PAREN_PREFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\([^)]*response[^)]*\)\s*\n+").expect("valid regex")
});

// Each removes from the marker to the end of its line.
static REASONING_TAIL_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?im)Here are my reasonings?.*$",
        r"(?im)Let me think.*$",
        r"(?im)Okay,\s*let['’]?s\s+.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

// Whole planner lines such as "The user asks: ..." or "So answer: ...".
static PLANNER_LINE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?im)^\s*Okay,\s*i\s+need\s+to\s+.*\n+",
        r"(?im)^\s*The\s+user\s+asks:.*\n+",
        r"(?im)^\s*Must\s+wrap\s+.*\n+",
        r"(?im)^\s*So\s+answer:.*\n+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static RESPONSE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<response>(.*?)</response>").expect("valid regex"));
static OPEN_RESPONSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<response>\s*(.+)$").expect("valid regex"));
static MIGHT_SAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\b(?:she|he|they)\s+might\s+say:\s*["“](.+?)["”]"#).expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static PIPE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\|[^|]+\|>").expect("valid regex"));
static TRAILING_QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\?{3,}.*$").expect("valid regex"));
static TRAILING_THINKING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)Okay let me think.*$").expect("valid regex"));

const META_PREFIXES: &[&str] = &[
    "also ensure",
    "check for",
    "make sure",
    "now output",
    "must wrap",
    "so answer",
    "the user asks",
    "output format",
    "example (follow",
    "disallowed content",
];

const META_FRAGMENTS: &[&str] = &["disallowed content", "exactly one block", "it's safe"];

const BLOCK_META_MARKERS: &[&str] = &[
    "also ensure",
    "check for",
    "make sure",
    "now output",
    "disallowed content",
    "it's safe",
    "guardrails",
    "exactly one block",
];

const REASONING_WORDS: &[&str] = &[
    "here are",
    "reasoning",
    "let me think",
    "we need",
    "the user",
    "the system",
    "i need to",
    "i have to",
    "i must",
];

/// The NPC's reply with reasoning, meta-instructions and markup removed.
pub fn extract_dialogue(raw: &str) -> String {
    let text = strip_preambles(&strip_special_tokens(raw));

    let blocks: Vec<&str> = RESPONSE_BLOCK_RE
        .captures_iter(&text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    // max_by_key keeps the last of equal scores; the final draft is usually the answer.
    if let Some(best) = blocks.iter().max_by_key(|b| block_score(b)) {
        return strip_leading_meta_lines(&strip_tags(best.trim()));
    }

    if let Some(tail) = OPEN_RESPONSE_RE.captures(&text).and_then(|c| c.get(1)) {
        return strip_leading_meta_lines(&strip_tags(tail.as_str().trim()));
    }

    if let Some(quoted) = MIGHT_SAY_RE.captures(&text).and_then(|c| c.get(1)) {
        return strip_tags(quoted.as_str().trim()).trim().to_string();
    }

    if let Some(line) = text.lines().map(str::trim).find(|l| looks_like_dialogue(l)) {
        return strip_tags(line).trim().to_string();
    }

    let cleaned = strip_tags(&text);
    let cleaned = TRAILING_QUESTION_RE.replace_all(cleaned.trim(), "");
    let cleaned = TRAILING_THINKING_RE.replace_all(&cleaned, "");
    strip_leading_meta_lines(&cleaned).trim().to_string()
}

fn strip_preambles(text: &str) -> String {
    let mut text = PAREN_PREFACE_RE.replace(text, "").to_string();
    for re in REASONING_TAIL_RES.iter().chain(PLANNER_LINE_RES.iter()) {
        text = re.replace_all(&text, "").to_string();
    }
    strip_leading_meta_lines(&text)
}

/// Placeholder blocks lose to real ones, then meta-polluted blocks, then shorter ones.
fn block_score(block: &str) -> (u8, u8, usize) {
    let b = block.trim();
    let lower = b.to_lowercase();
    let placeholder =
        b == "..." || b == "…" || lower.contains("i'm ...") || lower.contains("i’m ...");
    let has_meta = BLOCK_META_MARKERS.iter().any(|m| lower.contains(m));
    (u8::from(!placeholder), u8::from(!has_meta), b.chars().count())
}

fn looks_like_dialogue(line: &str) -> bool {
    if line.chars().count() <= 10 {
        return false;
    }
    let lower = line.to_lowercase();
    if REASONING_WORDS.iter().any(|w| lower.contains(w)) {
        return false;
    }
    line.chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c == '"' || c == '\'')
}

fn strip_tags(text: &str) -> String {
    let text = TAG_RE.replace_all(text, "");
    PIPE_TOKEN_RE.replace_all(&text, "").to_string()
}

/// Drop meta/checklist lines that precede the first real line.
fn strip_leading_meta_lines(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut dropping = true;
    for line in text.lines() {
        let line = line.trim_end();
        if dropping {
            let raw = line.trim();
            if raw.is_empty() || raw == "." {
                continue;
            }
            let lower = raw
                .trim_start_matches(['.', '-', '*', '•', '>', ' '])
                .trim()
                .to_lowercase();
            let is_meta = META_PREFIXES.iter().any(|p| lower.starts_with(p))
                || META_FRAGMENTS.iter().any(|f| lower.contains(f));
            if is_meta {
                continue;
            }
            dropping = false;
        }
        kept.push(line);
    }
    kept.join("\n").trim().to_string()
}
