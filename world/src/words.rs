//! Word assignment and elite affix rolls drawn from the shared generator.

use keyboard_defence_core::{
    config::{AffixConfig, TierDefinition, WordBands},
    AffixKind, EliteAffix, RngState,
};

/// Picks the word assigned to a newly spawned enemy.
///
/// Consumes one float for the difficulty bucket and one range draw for the
/// word, unless the merged vocabulary is empty and the tier id is used.
pub(crate) fn pick_word(
    rng: &mut RngState,
    tier: &TierDefinition,
    bonus: &[String],
    taken_initials: &[char],
    bands: &WordBands,
    bias: f64,
) -> String {
    let vocabulary = merged_vocabulary(&tier.vocabulary, bonus);
    if vocabulary.is_empty() {
        return tier.id.as_str().to_lowercase();
    }

    let preferred: Vec<&String> = vocabulary
        .iter()
        .filter(|word| {
            word.chars()
                .next()
                .map_or(true, |initial| !taken_initials.contains(&initial))
        })
        .collect();
    let pool: Vec<&String> = if preferred.is_empty() {
        vocabulary.iter().collect()
    } else {
        preferred
    };

    let mut buckets: [Vec<&String>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for word in pool {
        let length = word.chars().count();
        let bucket = if length <= bands.easy_max_length {
            0
        } else if length <= bands.medium_max_length {
            1
        } else {
            2
        };
        buckets[bucket].push(word);
    }

    let shift = bias.clamp(-1.0, 1.0) * bands.bias_strength;
    let base = [
        bands.easy_weight * (1.0 - shift),
        bands.medium_weight,
        bands.hard_weight * (1.0 + shift),
    ];
    let weights: Vec<f64> = base
        .iter()
        .zip(&buckets)
        .map(|(weight, bucket)| {
            if bucket.is_empty() {
                0.0
            } else {
                weight.max(0.0)
            }
        })
        .collect();

    let chosen = rng
        .pick_weighted(&weights)
        .or_else(|| buckets.iter().position(|bucket| !bucket.is_empty()))
        .unwrap_or(0);
    let bucket = buckets.get(chosen).map(Vec::as_slice).unwrap_or_default();

    rng.pick(bucket)
        .map(|word| (*word).clone())
        .unwrap_or_else(|| tier.id.as_str().to_lowercase())
}

/// Tier vocabulary followed by the wave's bonus words, lower-cased,
/// deduplicated, and restricted to words that can be typed.
fn merged_vocabulary(tier: &[String], bonus: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(tier.len() + bonus.len());
    for word in tier.iter().chain(bonus) {
        let word = word.to_lowercase();
        if word.is_empty() || !word.chars().all(char::is_alphanumeric) {
            continue;
        }
        if !merged.contains(&word) {
            merged.push(word);
        }
    }
    merged
}

/// Rolls elite affixes for a regular spawn.
///
/// Consumes one float for the chance roll and, on success, one float per
/// affix picked.
pub(crate) fn roll_affixes(
    rng: &mut RngState,
    config: &AffixConfig,
    spawns_shielded: bool,
) -> Vec<EliteAffix> {
    let mut rolled: Vec<EliteAffix> = Vec::new();
    if config.catalog.is_empty() || rng.next_float01() >= config.chance {
        return rolled;
    }

    for _ in 0..config.max_per_enemy {
        let weights: Vec<f64> = config
            .catalog
            .iter()
            .map(|entry| {
                let taken = rolled.iter().any(|affix| affix.kind == entry.kind);
                let excluded = entry.kind == AffixKind::Shielded && spawns_shielded;
                if taken || excluded {
                    0.0
                } else {
                    entry.weight
                }
            })
            .collect();
        let Some(index) = rng.pick_weighted(&weights) else {
            break;
        };
        if let Some(entry) = config.catalog.get(index) {
            rolled.push(EliteAffix {
                kind: entry.kind,
                effect: entry.effect,
            });
        }
    }
    rolled
}

/// Resolves explicit affix hints against the catalog, skipping unknown kinds.
pub(crate) fn hinted_affixes(config: &AffixConfig, hints: &[AffixKind]) -> Vec<EliteAffix> {
    let mut resolved: Vec<EliteAffix> = Vec::new();
    for kind in hints {
        if resolved.iter().any(|affix| affix.kind == *kind) {
            continue;
        }
        if let Some(entry) = config.catalog.iter().find(|entry| entry.kind == *kind) {
            resolved.push(EliteAffix {
                kind: entry.kind,
                effect: entry.effect,
            });
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard_defence_core::{
        config::{AffixDefinition, GameConfig},
        AffixEffect, TierId,
    };

    fn tier(vocabulary: &[&str], shield: f64) -> TierDefinition {
        TierDefinition {
            id: TierId::from("grunt"),
            health: 30.0,
            shield,
            speed: 0.1,
            reward: 10,
            breach_damage: 5.0,
            vocabulary: vocabulary.iter().map(|word| (*word).to_owned()).collect(),
            boss: false,
        }
    }

    #[test]
    fn empty_vocabulary_falls_back_to_tier_id() {
        let mut rng = RngState::new(1);
        let word = pick_word(&mut rng, &tier(&[], 0.0), &[], &[], &WordBands::default(), 0.0);
        assert_eq!(word, "grunt");
        assert_eq!(rng, RngState::new(1));
    }

    #[test]
    fn taken_initials_are_avoided_when_possible() {
        let vocabulary = ["raid", "rust", "mud"];
        for seed in 0..64 {
            let mut rng = RngState::new(seed);
            let word = pick_word(
                &mut rng,
                &tier(&vocabulary, 0.0),
                &[],
                &['r'],
                &WordBands::default(),
                0.0,
            );
            assert_eq!(word, "mud");
        }
    }

    #[test]
    fn bonus_vocabulary_is_merged_without_duplicates() {
        let merged = merged_vocabulary(
            &["Raid".to_owned(), "mud".to_owned()],
            &["raid".to_owned(), "last light".to_owned(), "dawn".to_owned()],
        );
        assert_eq!(merged, vec!["raid", "mud", "dawn"]);
    }

    #[test]
    fn full_positive_bias_avoids_easy_words() {
        let bands = WordBands {
            easy_weight: 0.5,
            medium_weight: 0.0,
            hard_weight: 0.5,
            bias_strength: 1.0,
            ..WordBands::default()
        };
        for seed in 0..64 {
            let mut rng = RngState::new(seed);
            let word = pick_word(
                &mut rng,
                &tier(&["mud", "juggernaut"], 0.0),
                &[],
                &[],
                &bands,
                1.0,
            );
            assert_eq!(word, "juggernaut");
        }
    }

    #[test]
    fn affixes_skip_shielded_for_shielded_spawns() {
        let config = AffixConfig {
            chance: 1.0,
            max_per_enemy: 3,
            catalog: vec![
                AffixDefinition {
                    kind: AffixKind::Shielded,
                    weight: 5.0,
                    effect: AffixEffect::BonusShield { amount: 10.0 },
                },
                AffixDefinition {
                    kind: AffixKind::Armored,
                    weight: 1.0,
                    effect: AffixEffect::Mitigation {
                        turret: 0.5,
                        typing: 1.0,
                    },
                },
            ],
        };
        let mut rng = RngState::new(5);
        let rolled = roll_affixes(&mut rng, &config, true);
        assert_eq!(rolled.len(), 1);
        assert_eq!(rolled[0].kind, AffixKind::Armored);

        let mut rng = RngState::new(5);
        let rolled = roll_affixes(&mut rng, &config, false);
        assert_eq!(rolled.len(), 2, "no duplicates even with spare picks");
    }

    #[test]
    fn zero_chance_consumes_one_float() {
        let config = GameConfig::builtin().expect("builtin").affixes;
        let config = AffixConfig {
            chance: 0.0,
            ..config
        };
        let mut rng = RngState::new(12);
        assert!(roll_affixes(&mut rng, &config, false).is_empty());
        let mut expected = RngState::new(12);
        let _ = expected.next_float01();
        assert_eq!(rng, expected);
    }

    #[test]
    fn hints_resolve_through_the_catalog() {
        let config = GameConfig::builtin().expect("builtin").affixes;
        let resolved = hinted_affixes(&config, &[AffixKind::Armored, AffixKind::Armored]);
        assert_eq!(resolved.len(), 1);
        assert!(matches!(
            resolved[0].effect,
            AffixEffect::Mitigation { .. }
        ));
    }
}
