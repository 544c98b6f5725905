//! Which turns reach the vector store and which recalled excerpts are usable.

use npcgen_domain::{ConversationTurn, SpeakerRole};

/// Phrases that mark leaked model reasoning rather than in-character speech.
pub const REASONING_MARKERS: &[&str] = &[
    "The user says",
    "We need to respond",
    "Here are my reasoning",
    "Thus final answer",
    "[BEGIN FINAL RESPONSE]",
    "Your output:",
    "The system expects",
];

pub const MIN_STORED_CHARS: usize = 6;
pub const MAX_STORED_CHARS: usize = 999;
pub const MAX_EXCERPT_CHARS: usize = 500;

pub fn contains_reasoning(text: &str) -> bool {
    REASONING_MARKERS.iter().any(|m| text.contains(m))
}

/// Only clean NPC replies of a reasonable length are embedded.
pub fn admits_turn(turn: &ConversationTurn) -> bool {
    if turn.speaker != SpeakerRole::Npc {
        return false;
    }
    let len = turn.text.chars().count();
    (MIN_STORED_CHARS..=MAX_STORED_CHARS).contains(&len) && !contains_reasoning(&turn.text)
}

/// Recalled documents that are too long or polluted are dropped.
pub fn admits_excerpt(document: &str) -> bool {
    !document.trim().is_empty()
        && document.chars().count() <= MAX_EXCERPT_CHARS
        && !contains_reasoning(document)
}
