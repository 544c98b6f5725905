//! Prompt Builder: pure composition of prompt text.
//!
//! Nothing here performs I/O. The only randomized choice (`choose_preset`,
//! `sample_personalities`) takes its random source as an argument.

mod personality;

use std::collections::BTreeMap;

use npcgen_domain::{CharacterProfile, PresetKind, PromptPreset, WorldTemplate};

use crate::infrastructure::generation_client::DialoguePrompt;
use crate::infrastructure::ports::RandomPort;
use crate::prompt_templates::{self, dialogue};

pub use personality::{sample_personalities, DEFAULT_OPPOSITES, DEFAULT_TRAITS};

const PROFILE_IMAGE_SUFFIX: &str = "portrait profile picture, centered face, clean background";
const FULL_BODY_IMAGE_SUFFIX: &str = "full body, standing, character sheet, neutral pose";

/// Caller-supplied values that take precedence over the template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptOverrides {
    pub era: Option<String>,
    pub time_period: Option<String>,
    /// Merged key by key over the template's detail map.
    pub detail: BTreeMap<String, String>,
    pub personalities: Vec<String>,
    pub name: Option<String>,
    pub instruction: Option<String>,
}

impl PromptOverrides {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_personalities(mut self, personalities: Vec<String>) -> Self {
        self.personalities = personalities;
        self
    }
}

/// The template with overrides applied.
pub fn effective_world(template: &WorldTemplate, overrides: &PromptOverrides) -> WorldTemplate {
    let mut world = template.clone();
    if let Some(era) = non_blank(&overrides.era) {
        world.era = era.to_string();
    }
    if let Some(period) = non_blank(&overrides.time_period) {
        world.time_period = period.to_string();
    }
    for (key, value) in &overrides.detail {
        world.detail.insert(key.clone(), value.clone());
    }
    world
}

/// `Era: …, Time Period: …, Detail: {…}` followed by a blank line.
pub fn environment_context(world: &WorldTemplate) -> String {
    let detail = serde_json::to_string(&world.detail).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Era: {}, Time Period: {}, Detail: {}\n\n",
        world.era, world.time_period, detail
    )
}

/// Character prompt using the built-in example profiles.
pub fn build(template: &WorldTemplate, overrides: &PromptOverrides) -> String {
    build_character_prompt(template, overrides, prompt_templates::EXAMPLE_PROFILES)
}

pub fn build_character_prompt(
    template: &WorldTemplate,
    overrides: &PromptOverrides,
    examples: &[&str],
) -> String {
    let world = effective_world(template, overrides);
    let mut prompt = environment_context(&world);

    if !examples.is_empty() {
        prompt.push_str("Here are some example character profiles:\n\n");
        for example in examples {
            prompt.push_str(example.trim());
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str("Create a new character profile that fits in this environment");
    let traits: Vec<&str> = overrides
        .personalities
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !traits.is_empty() {
        prompt.push_str(" with the following personality traits: ");
        prompt.push_str(&traits.join(", "));
    }
    if let Some(name) = non_blank(&overrides.name) {
        prompt.push_str(" and this name: ");
        prompt.push_str(name);
    }
    prompt.push_str(".\n\n");

    if let Some(instruction) = non_blank(&overrides.instruction) {
        prompt.push_str("Additional direction: ");
        prompt.push_str(instruction);
        prompt.push_str("\n\n");
    }
    prompt.push_str(prompt_templates::CHARACTER_OUTPUT_FORMAT);
    prompt
}

pub fn build_names_prompt(world: &WorldTemplate, amount: usize) -> String {
    format!(
        "{}Given the json file describing an environment, create {} unique names that don't repeat \
         for NPCs in that environment. Output a JSON object of the form {{\"names\": [\"...\"]}}.",
        environment_context(world),
        amount
    )
}

/// System prompt and stop sequences for speaking as `profile`.
pub fn build_dialogue_system_prompt(
    profile: &CharacterProfile,
    world: &WorldTemplate,
    memory: &[String],
) -> DialoguePrompt {
    let name = profile.name.trim();
    let mut system = format!(
        "You are {}, a character in this world. You know everything about yourself from your character profile.\n\n",
        name
    );

    system.push_str(dialogue::PROFILE_HEADER);
    system.push('\n');
    system.push_str(&describe_profile(profile));
    system.push('\n');

    system.push_str(dialogue::ENVIRONMENT_HEADER);
    system.push('\n');
    system.push_str(&describe_world(world));
    system.push('\n');

    if !world.guardrails.is_empty() {
        system.push_str(dialogue::GUARDRAILS_HEADER);
        system.push('\n');
        for (key, value) in &world.guardrails {
            system.push_str(&format!("- {}: {}\n", key, value));
        }
        system.push('\n');
    }

    system.push_str(dialogue::SELF_KNOWLEDGE);
    system.push_str("\n\n");
    system.push_str(&format!(
        "Your speech pattern is influenced by your personalities: {}.\n\n",
        list_or(&profile.personalities, "Not specified")
    ));
    system.push_str(&dialogue::CRITICAL_INSTRUCTIONS.replace("{name}", name));
    system.push_str("\n\n");
    system.push_str(
        &dialogue::OUTPUT_FORMAT
            .replace("{name}", name)
            .replace("{example}", &format!("I'm {}.", name)),
    );
    system.push('\n');

    let memory: Vec<&str> = memory
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();
    if !memory.is_empty() {
        system.push('\n');
        system.push_str(dialogue::MEMORY_HEADER);
        system.push('\n');
        system.push_str(&memory.join("\n"));
        system.push('\n');
    }

    DialoguePrompt {
        system,
        stop: vec!["\n\nPlayer:".to_string(), format!("\n\n{}:", name)],
    }
}

/// Pick one preset of `kind`, or `None` when there are none.
pub fn choose_preset<'a>(
    presets: &'a [PromptPreset],
    kind: PresetKind,
    random: &dyn RandomPort,
) -> Option<&'a PromptPreset> {
    let candidates: Vec<&PromptPreset> = presets.iter().filter(|p| p.kind() == kind).collect();
    if candidates.is_empty() {
        return None;
    }
    let last = (candidates.len() - 1).min(i32::MAX as usize) as i32;
    let index = random.gen_range(0, last).clamp(0, last) as usize;
    candidates.get(index).copied()
}

pub fn profile_image_prompt(base: &str, explicit: Option<&str>) -> String {
    image_prompt(base, explicit, PROFILE_IMAGE_SUFFIX)
}

pub fn full_body_image_prompt(base: &str, explicit: Option<&str>) -> String {
    image_prompt(base, explicit, FULL_BODY_IMAGE_SUFFIX)
}

fn image_prompt(base: &str, explicit: Option<&str>, suffix: &str) -> String {
    match explicit.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prompt) => prompt.to_string(),
        None => format!("{}, {}", base.trim(), suffix),
    }
}

fn describe_profile(profile: &CharacterProfile) -> String {
    let appearance = &profile.appearance;
    let background = &profile.background;
    let skills: Vec<String> = profile.skills.iter().cloned().collect();
    format!(
        "Name: {}\nAge: {}\nGender: {}\n\n\
         Appearance: {}\nHeight: {}\nWeight: {}\nHair: {}\nEyes: {}\n\n\
         Personalities: {}\n\n\
         Background:\n- Hometown: {}\n- Family: {}\n- Motivation: {}\n\n\
         Skills: {}\n\nSecrets: {}\n",
        profile.name,
        profile.age,
        profile.gender,
        or_default(Some(&appearance.description), "Not specified"),
        or_default(appearance.height.as_ref(), "Unknown"),
        or_default(appearance.weight.as_ref(), "Unknown"),
        or_default(appearance.hair.as_ref(), "Unknown"),
        or_default(appearance.eyes.as_ref(), "Unknown"),
        list_or(&profile.personalities, "Not specified"),
        or_default(background.hometown.as_ref(), "Unknown"),
        or_default(background.family.as_ref(), "Unknown"),
        or_default(background.motivation.as_ref(), "Unknown"),
        list_or(&skills, "Not specified"),
        list_or(&profile.secrets, "None"),
    )
}

fn describe_world(world: &WorldTemplate) -> String {
    format!(
        "Era: {}\nTime Period: {}\n\nEnvironment: {}\nSocial and Economic: {}\nCultural Norms: {}\nPolitical Climate: {}\n",
        world.era,
        world.time_period,
        world.detail_or_unspecified("Environment"),
        world.detail_or_unspecified("Social and Economic Aspects"),
        world.detail_or_unspecified("Cultural Norms"),
        world.detail_or_unspecified("Political Climate"),
    )
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn or_default<'a>(value: Option<&'a String>, fallback: &'a str) -> &'a str {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

fn list_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::test_fixtures::{sample_profile, sample_world};

    #[test]
    fn overrides_flow_into_the_prompt() {
        let world = WorldTemplate::new("Bronze Age", "1200 BC");
        let overrides = PromptOverrides {
            era: Some("Roman Empire".to_string()),
            ..Default::default()
        }
        .with_personalities(vec!["brave".to_string(), "cynical".to_string()]);

        let prompt = build(&world, &overrides);

        assert!(prompt.starts_with("Era: Roman Empire, Time Period: 1200 BC"));
        assert!(prompt.contains("brave"));
        assert!(prompt.contains("cynical"));
        assert!(!prompt.contains("Bronze Age"));
    }

    #[test]
    fn identical_inputs_give_identical_prompts() {
        let world = sample_world();
        let overrides = PromptOverrides::default().with_name("Livia");
        assert_eq!(build(&world, &overrides), build(&world, &overrides));
    }

    #[test]
    fn unspecified_fields_fall_back_to_template() {
        let world = sample_world();
        let mut overrides = PromptOverrides::default();
        overrides
            .detail
            .insert("Political Climate".to_string(), "Civil war".to_string());

        let merged = effective_world(&world, &overrides);
        assert_eq!(merged.era, world.era);
        assert_eq!(merged.detail_or_unspecified("Political Climate"), "Civil war");
        assert_eq!(
            merged.detail_or_unspecified("Environment"),
            world.detail_or_unspecified("Environment")
        );
    }

    #[test]
    fn name_and_instruction_are_included() {
        let overrides = PromptOverrides {
            instruction: Some("Make them a baker".to_string()),
            ..Default::default()
        }
        .with_name("Livia Drusa");
        let prompt = build_character_prompt(&sample_world(), &overrides, &[]);
        assert!(prompt.contains("and this name: Livia Drusa."));
        assert!(prompt.contains("Additional direction: Make them a baker"));
        assert!(!prompt.contains("example character profiles"));
    }

    #[test]
    fn dialogue_prompt_has_sections_memory_and_stops() {
        let profile = sample_profile();
        let world = sample_world().with_guardrail("Violence", "No graphic violence");
        let prompt = build_dialogue_system_prompt(
            &profile,
            &world,
            &["She mentioned the eastern road.".to_string()],
        );

        assert!(prompt.system.starts_with(&format!("You are {}", profile.name)));
        for section in [
            "YOUR CHARACTER PROFILE:",
            "ENVIRONMENT CONTEXT:",
            "- Violence: No graphic violence",
            "CRITICAL INSTRUCTIONS:",
            "<response>",
            "Previous conversation context from memory:\nShe mentioned the eastern road.",
        ] {
            assert!(prompt.system.contains(section), "missing {section}");
        }
        assert_eq!(
            prompt.stop,
            vec!["\n\nPlayer:".to_string(), format!("\n\n{}:", profile.name)]
        );
    }

    #[test]
    fn dialogue_prompt_omits_empty_sections() {
        let prompt = build_dialogue_system_prompt(&sample_profile(), &sample_world(), &[]);
        assert!(!prompt.system.contains("Guardrails"));
        assert!(!prompt.system.contains("from memory"));
    }

    #[test]
    fn choose_preset_filters_by_kind() {
        let presets = vec![
            PromptPreset::new("alley", PresetKind::Environment, "wet bricks").expect("preset"),
            PromptPreset::new("noir", PresetKind::Character, "trench coat").expect("preset"),
            PromptPreset::new("knight", PresetKind::Character, "plate armour").expect("preset"),
        ];
        let picked = choose_preset(&presets, PresetKind::Character, &FixedRandom(1)).expect("one");
        assert_eq!(picked.name(), "knight");
        assert!(choose_preset(&presets[..1], PresetKind::Character, &FixedRandom(0)).is_none());
    }

    #[test]
    fn image_prompts_use_suffix_unless_explicit() {
        assert_eq!(
            profile_image_prompt("a hooded ranger", None),
            "a hooded ranger, portrait profile picture, centered face, clean background"
        );
        assert_eq!(
            full_body_image_prompt("a hooded ranger", Some("  ")),
            "a hooded ranger, full body, standing, character sheet, neutral pose"
        );
        assert_eq!(
            profile_image_prompt("a hooded ranger", Some("close-up, rain")),
            "close-up, rain"
        );
    }
}
