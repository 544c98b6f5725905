//! Personality trait sampling.

use crate::infrastructure::ports::RandomPort;

pub const DEFAULT_TRAITS: &[&str] = &[
    "adventurous", "ambitious", "anxious", "arrogant", "brave", "calm", "careless", "cautious",
    "charming", "cheerful", "compassionate", "cowardly", "cruel", "curious", "cynical",
    "diligent", "generous", "gloomy", "greedy", "honest", "humble", "impatient", "impulsive",
    "kind", "lazy", "loyal", "naive", "optimistic", "patient", "pessimistic", "proud", "reserved",
    "sarcastic", "secretive", "selfish", "shy", "stubborn", "superstitious", "talkative",
    "treacherous", "trusting", "witty",
];

/// Pairs that never appear together in one personality.
pub const DEFAULT_OPPOSITES: &[(&str, &str)] = &[
    ("brave", "cowardly"),
    ("calm", "anxious"),
    ("careless", "cautious"),
    ("cheerful", "gloomy"),
    ("compassionate", "cruel"),
    ("diligent", "lazy"),
    ("generous", "greedy"),
    ("generous", "selfish"),
    ("honest", "treacherous"),
    ("humble", "arrogant"),
    ("humble", "proud"),
    ("impatient", "patient"),
    ("impulsive", "cautious"),
    ("kind", "cruel"),
    ("loyal", "treacherous"),
    ("naive", "cynical"),
    ("optimistic", "pessimistic"),
    ("reserved", "talkative"),
    ("secretive", "honest"),
    ("shy", "talkative"),
    ("trusting", "cynical"),
];

fn are_opposites(opposites: &[(&str, &str)], a: &str, b: &str) -> bool {
    opposites.iter().any(|(x, y)| {
        (x.eq_ignore_ascii_case(a) && y.eq_ignore_ascii_case(b))
            || (x.eq_ignore_ascii_case(b) && y.eq_ignore_ascii_case(a))
    })
}

/// Pick up to `count` distinct traits from `pool`, no two of them opposites.
///
/// Returns fewer than `count` when the pool runs out of compatible traits.
pub fn sample_personalities(
    pool: &[&str],
    opposites: &[(&str, &str)],
    count: usize,
    random: &dyn RandomPort,
) -> Vec<String> {
    let mut remaining: Vec<&str> = Vec::with_capacity(pool.len());
    for candidate in pool {
        if !remaining.iter().any(|r| r.eq_ignore_ascii_case(candidate)) {
            remaining.push(candidate);
        }
    }

    let mut chosen: Vec<String> = Vec::with_capacity(count);
    while chosen.len() < count && !remaining.is_empty() {
        let last = (remaining.len() - 1).min(i32::MAX as usize) as i32;
        let index = random.gen_range(0, last).clamp(0, last) as usize;
        let picked = remaining.swap_remove(index);
        remaining.retain(|r| !are_opposites(opposites, picked, r));
        chosen.push(picked.to_string());
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedRandom, SystemRandom};

    #[test]
    fn never_yields_opposites() {
        let random = SystemRandom::new();
        for _ in 0..200 {
            let traits = sample_personalities(DEFAULT_TRAITS, DEFAULT_OPPOSITES, 5, &random);
            assert_eq!(traits.len(), 5);
            for a in &traits {
                for b in &traits {
                    assert!(!are_opposites(DEFAULT_OPPOSITES, a, b), "{a} with {b}");
                }
            }
        }
    }

    #[test]
    fn deterministic_for_fixed_random() {
        let first = sample_personalities(DEFAULT_TRAITS, DEFAULT_OPPOSITES, 5, &FixedRandom(3));
        let second = sample_personalities(DEFAULT_TRAITS, DEFAULT_OPPOSITES, 5, &FixedRandom(3));
        assert_eq!(first, second);
    }

    #[test]
    fn exhausted_pool_returns_fewer() {
        let traits = sample_personalities(&["brave", "cowardly"], DEFAULT_OPPOSITES, 2, &FixedRandom(0));
        assert_eq!(traits, vec!["brave"]);
    }

    #[test]
    fn duplicates_in_pool_are_collapsed() {
        let traits = sample_personalities(&["kind", "Kind", "witty"], &[], 3, &FixedRandom(0));
        assert_eq!(traits.len(), 2);
    }
}
