//! Fixed prompt text used by the engine.
//!
//! Everything here is plain data; the prompt builder decides how the pieces
//! are combined.

/// System prompts for the JSON-producing requests.
pub mod system {
    /// System prompt for character generation.
    pub const CHARACTER_DESIGNER: &str = "You are a creative team designing NPC characters based upon a given environment prompt and output in a json format";

    /// System prompt for name suggestions.
    pub const NAME_SUGGESTER: &str =
        "You are a creative team naming NPC characters for a given environment and output in a json format";
}

/// Shape reminder appended to every character request.
pub const CHARACTER_OUTPUT_FORMAT: &str = "Respond with a single JSON object and nothing else. \
It must have exactly these keys: \"name\" (string), \"age\" (non-negative integer), \
\"gender\" (string), \"personalities\" (array of strings), \
\"appearance\" (object with \"description\" and optional \"height\", \"weight\", \"hair\", \"eyes\"), \
\"background\" (object with optional \"hometown\", \"family\", \"motivation\"), \
\"skills\" (array of strings), \"secrets\" (array of strings).";

/// Example profiles shown to the model before it writes a new one.
pub const EXAMPLE_PROFILES: &[&str] = &[
    r#"{
  "name": "Tamsin Vey",
  "age": 34,
  "gender": "female",
  "personalities": ["shrewd", "warm", "impatient", "loyal", "superstitious"],
  "appearance": {
    "description": "A compact, sun-browned ferry pilot with rope-burned hands and a quick crooked smile.",
    "height": "5'3\"",
    "weight": "130 lbs",
    "hair": "black, tied back with cord",
    "eyes": "dark brown"
  },
  "background": {
    "hometown": "a stilt village at the mouth of a silted river",
    "family": "eldest of six; her mother still runs the village net loft",
    "motivation": "to own the ferry outright before the toll guild buys the crossing"
  },
  "skills": ["river navigation", "haggling", "knot work"],
  "secrets": ["She smuggles letters for a banned reform society"]
}"#,
    r#"{
  "name": "Oren Halloway",
  "age": 61,
  "gender": "male",
  "personalities": ["patient", "pedantic", "kind", "stubborn", "curious"],
  "appearance": {
    "description": "A stooped archivist in ink-stained sleeves who squints at everything as if it were a manuscript.",
    "hair": "thin and white",
    "eyes": "pale grey behind thick lenses"
  },
  "background": {
    "hometown": "the cathedral quarter of an old river city",
    "family": "widowed; his only son serves on a merchant ship",
    "motivation": "to finish the city chronicle his mentor left incomplete"
  },
  "skills": ["paleography", "bookbinding", "local history"],
  "secrets": ["He altered a land record decades ago to save a friend's home"]
}"#,
];

/// Sections of the dialogue system prompt that do not depend on the character.
pub mod dialogue {
    pub const PROFILE_HEADER: &str = "YOUR CHARACTER PROFILE:";
    pub const ENVIRONMENT_HEADER: &str = "ENVIRONMENT CONTEXT:";
    pub const GUARDRAILS_HEADER: &str = "Guardrails (important rules to follow):";
    pub const MEMORY_HEADER: &str = "Previous conversation context from memory:";

    pub const SELF_KNOWLEDGE: &str = "You know everything in your character profile. When asked about yourself you may share \
your name, age, appearance and background, how your personalities shape you, your skills, \
your hometown, family and motivation, and what you know of the world you live in. \
Reveal secrets only when it makes sense for you to do so.";

    pub const CRITICAL_INSTRUCTIONS: &str = "CRITICAL INSTRUCTIONS:
- Respond ONLY in first person, ONLY as {name}.
- Do NOT show reasoning, planning, thinking steps or meta-commentary.
- Do NOT write phrases like \"Let me think\" or \"I need to\".
- Do NOT mention guardrails, instructions or system prompts.
- Speak directly as {name} would in this situation, using only the character's spoken words.";

    pub const OUTPUT_FORMAT: &str = "OUTPUT FORMAT (MANDATORY):
- Wrap the reply in exactly one block: <response>...</response>
- Write NOTHING outside the <response> block.
- Never output placeholders such as \"...\".

Example:
Player: Who are you?
{name}: <response>{example}</response>";
}
