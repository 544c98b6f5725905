//! Conversation turns exchanged between the player and an NPC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    Player,
    Npc,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
        }
    }
}

/// One utterance in a session's conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: SpeakerRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn player(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            speaker: SpeakerRole::Player,
            text: text.into(),
            timestamp,
        }
    }

    pub fn npc(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            speaker: SpeakerRole::Npc,
            text: text.into(),
            timestamp,
        }
    }
}
