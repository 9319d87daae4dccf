//! Configuration tables consumed by the simulation at construction time.
//!
//! The tables are owned by an external collaborator and loaded before a world
//! is built. A builtin JSON document ships with the crate so headless tools and
//! tests have a complete, playable configuration without touching the disk.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AffixKind, SlotId, TierId, TurretKindId};

/// Builtin configuration embedded in the crate.
pub const BUILTIN_GAME_CONFIG: &str = include_str!("data/default_config.json");

/// Complete set of tuning tables for a simulation instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of parallel lanes enemies travel along.
    pub lanes: u32,
    /// Maximum number of alive enemies a single lane may hold.
    pub lane_capacity: u32,
    /// Currency available when the session starts.
    pub starting_currency: u32,
    /// Seconds before the first wave starts.
    pub first_wave_delay: f64,
    /// Seconds between a completed wave and the next one.
    pub intermission: f64,
    /// Seconds a turret projectile travels before resolving.
    pub projectile_flight_time: f64,
    /// Defended structure statistics and upgrade table.
    pub structure: StructureConfig,
    /// Enemy archetypes.
    pub tiers: Vec<TierDefinition>,
    /// Turret archetypes and their level tables.
    pub turrets: Vec<TurretArchetype>,
    /// Pre-allocated turret slots.
    pub slots: Vec<SlotDefinition>,
    /// Ordered wave definitions.
    pub waves: Vec<WaveDefinition>,
    /// Word difficulty bands used for word assignment.
    pub words: WordBands,
    /// Typing damage and combo tuning.
    pub typing: TypingConfig,
    /// Shape of the typing support multiplier applied to turret cooldowns.
    pub support: TypingSupportConfig,
    /// Limits applied to support boost activations.
    pub boost: SupportBoostConfig,
    /// Elite affix catalog and roll parameters.
    pub affixes: AffixConfig,
    /// Boss phase timings.
    pub boss: BossConfig,
    /// Evacuation objective tuning.
    pub evacuation: EvacuationConfig,
    /// Optional challenge constraints.
    pub challenge: ChallengeConfig,
    /// Feature toggles.
    pub features: FeatureToggles,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            lanes: 3,
            lane_capacity: 12,
            starting_currency: 200,
            first_wave_delay: 2.0,
            intermission: 5.0,
            projectile_flight_time: 0.2,
            structure: StructureConfig::default(),
            tiers: Vec::new(),
            turrets: Vec::new(),
            slots: Vec::new(),
            waves: Vec::new(),
            words: WordBands::default(),
            typing: TypingConfig::default(),
            support: TypingSupportConfig::default(),
            boost: SupportBoostConfig::default(),
            affixes: AffixConfig::default(),
            boss: BossConfig::default(),
            evacuation: EvacuationConfig::default(),
            challenge: ChallengeConfig::default(),
            features: FeatureToggles::default(),
        }
    }
}

impl GameConfig {
    /// Parses the configuration embedded in the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_GAME_CONFIG)
    }

    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Looks up an enemy tier by identifier.
    #[must_use]
    pub fn tier(&self, id: &TierId) -> Option<&TierDefinition> {
        self.tiers.iter().find(|tier| &tier.id == id)
    }

    /// Looks up a turret archetype by identifier.
    #[must_use]
    pub fn turret(&self, id: &TurretKindId) -> Option<&TurretArchetype> {
        self.turrets.iter().find(|turret| &turret.id == id)
    }

    /// Checks cross references between tables.
    ///
    /// Disabled features are not validated, so a configuration may omit the
    /// evacuation tier when evacuation events are switched off.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes == 0 {
            return Err(ConfigError::NoLanes);
        }

        let mut tier_ids = HashSet::new();
        for tier in &self.tiers {
            if !tier_ids.insert(&tier.id) {
                return Err(ConfigError::DuplicateTier(tier.id.clone()));
            }
        }

        for turret in &self.turrets {
            if turret.levels.is_empty() {
                return Err(ConfigError::EmptyTurretLevels(turret.id.clone()));
            }
        }

        let mut slot_ids = HashSet::new();
        for slot in &self.slots {
            if !slot_ids.insert(slot.id) {
                return Err(ConfigError::DuplicateSlot(slot.id));
            }
            self.check_lane(slot.lane)?;
        }

        for (index, wave) in self.waves.iter().enumerate() {
            let wave_index = u32::try_from(index).unwrap_or(u32::MAX);
            for spawn in &wave.spawns {
                self.check_lane(spawn.lane)?;
                self.check_tier(&spawn.tier, wave_index)?;
            }
            for hazard in &wave.hazards {
                self.check_lane(hazard.lane)?;
            }
            if let Some(dynamic) = &wave.dynamic_events {
                for tier in &dynamic.tiers {
                    self.check_tier(tier, wave_index)?;
                }
            }
            if wave.evacuation.is_some() && self.features.evacuation_events {
                self.check_tier(&self.evacuation.tier, wave_index)?;
            }
        }

        Ok(())
    }

    fn check_lane(&self, lane: u32) -> Result<(), ConfigError> {
        if lane >= self.lanes {
            return Err(ConfigError::LaneOutOfRange {
                lane,
                lanes: self.lanes,
            });
        }
        Ok(())
    }

    fn check_tier(&self, tier: &TierId, wave: u32) -> Result<(), ConfigError> {
        if self.tier(tier).is_none() {
            return Err(ConfigError::UnknownTier {
                tier: tier.clone(),
                wave,
            });
        }
        Ok(())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration file could not be read.
    #[error("failed to read game config from {path:?}: {source}")]
    ReadFailed {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration declares zero lanes.
    #[error("game config must declare at least one lane")]
    NoLanes,
    /// A lane index exceeds the configured lane count.
    #[error("lane {lane} is out of range for {lanes} lanes")]
    LaneOutOfRange {
        /// Offending lane index.
        lane: u32,
        /// Configured lane count.
        lanes: u32,
    },
    /// A wave references a tier that is not declared.
    #[error("wave {wave} references unknown tier `{tier}`")]
    UnknownTier {
        /// Missing tier identifier.
        tier: TierId,
        /// Index of the referencing wave.
        wave: u32,
    },
    /// Two tiers share an identifier.
    #[error("tier `{0}` is declared more than once")]
    DuplicateTier(TierId),
    /// Two slots share an identifier.
    #[error("slot {0} is declared more than once")]
    DuplicateSlot(SlotId),
    /// A turret archetype has no levels.
    #[error("turret `{0}` declares no levels")]
    EmptyTurretLevels(TurretKindId),
}

/// Statistics and upgrade table of the defended structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Maximum health at level one.
    pub max_health: f64,
    /// Flat breach damage reduction at level one.
    pub armor: f64,
    /// Health regenerated per second at level one.
    pub regen: f64,
    /// Repair command tuning.
    pub repair: RepairConfig,
    /// Upgrades beyond level one, in order.
    pub levels: Vec<StructureLevel>,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            armor: 0.0,
            regen: 0.0,
            repair: RepairConfig::default(),
            levels: Vec::new(),
        }
    }
}

/// Repair command tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Currency spent per repair.
    pub cost: u32,
    /// Health restored per repair.
    pub amount: f64,
    /// Seconds before another repair is allowed.
    pub cooldown: f64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            cost: 40,
            amount: 25.0,
            cooldown: 10.0,
        }
    }
}

/// A single structure upgrade step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureLevel {
    /// Currency required to reach this level.
    pub cost: u32,
    /// Maximum health at this level.
    pub max_health: f64,
    /// Flat breach damage reduction at this level.
    pub armor: f64,
    /// Health regenerated per second at this level.
    pub regen: f64,
    /// Passive unlocked when the level is reached.
    #[serde(default)]
    pub passive: Option<Passive>,
}

/// Passive bonuses unlocked by structure upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Passive {
    /// Multiplies the repair cost.
    RepairDiscount {
        /// Factor applied to the repair cost.
        factor: f64,
    },
    /// Multiplies currency rewarded for defeated enemies.
    Bounty {
        /// Factor applied to enemy rewards.
        multiplier: f64,
    },
    /// Unlocks every locked turret slot.
    Arsenal,
}

/// Enemy archetype definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Unique tier identifier.
    pub id: TierId,
    /// Maximum health.
    pub health: f64,
    /// Base shield absorbed before health.
    #[serde(default)]
    pub shield: f64,
    /// Lane distance travelled per second.
    pub speed: f64,
    /// Currency awarded on defeat.
    pub reward: u32,
    /// Structure damage dealt on breach before armor.
    pub breach_damage: f64,
    /// Base vocabulary used for word assignment.
    #[serde(default)]
    pub vocabulary: Vec<String>,
    /// Whether spawning this tier activates boss mechanics.
    #[serde(default)]
    pub boss: bool,
}

/// Turret archetype with its level table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretArchetype {
    /// Unique turret identifier.
    pub id: TurretKindId,
    /// Levels in order; the first entry's cost is the placement cost.
    pub levels: Vec<TurretLevel>,
}

/// Statistics of a turret at one level.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretLevel {
    /// Currency required to reach this level.
    pub cost: u32,
    /// Damage carried by each projectile.
    pub damage: f64,
    /// Seconds between shots before multipliers.
    pub cooldown: f64,
}

/// Pre-allocated turret slot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Unique slot identifier.
    pub id: SlotId,
    /// Lane the slot covers.
    pub lane: u32,
    /// Whether the slot starts unlocked.
    #[serde(default)]
    pub unlocked: bool,
    /// Wave index at which the slot unlocks automatically.
    #[serde(default)]
    pub unlock_wave: Option<u32>,
}

/// Declarative description of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Minimum seconds the wave lasts.
    pub duration: f64,
    /// Static spawn instructions in declaration order.
    #[serde(default)]
    pub spawns: Vec<SpawnInstruction>,
    /// Time-boxed lane hazards.
    #[serde(default)]
    pub hazards: Vec<HazardDefinition>,
    /// RNG-generated extra spawns.
    #[serde(default)]
    pub dynamic_events: Option<DynamicEventDescriptor>,
    /// Evacuation objective window.
    #[serde(default)]
    pub evacuation: Option<EvacuationDescriptor>,
    /// Extra vocabulary merged into every tier's word pool during the wave.
    #[serde(default)]
    pub bonus_vocabulary: Vec<String>,
}

/// Static spawn instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnInstruction {
    /// Seconds into the wave of the first spawn.
    pub at: f64,
    /// Lane the enemies enter.
    pub lane: u32,
    /// Tier of the spawned enemies.
    pub tier: TierId,
    /// Number of enemies spawned.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Seconds between consecutive enemies of the instruction.
    #[serde(default)]
    pub cadence: f64,
    /// Overrides the tier's base shield.
    #[serde(default)]
    pub shield: Option<f64>,
    /// Affixes applied instead of rolling.
    #[serde(default)]
    pub affixes: Vec<AffixKind>,
}

fn default_count() -> u32 {
    1
}

/// Time-boxed lane-scoped hazard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardDefinition {
    /// Affected lane.
    pub lane: u32,
    /// Seconds into the wave the hazard begins.
    pub start: f64,
    /// Seconds the hazard lasts.
    pub duration: f64,
    /// Turret fire-rate multiplier while active.
    #[serde(default = "unit_multiplier")]
    pub fire_rate_multiplier: f64,
    /// Enemy speed multiplier while active.
    #[serde(default = "unit_multiplier")]
    pub speed_multiplier: f64,
}

fn unit_multiplier() -> f64 {
    1.0
}

/// Describes the RNG-generated spawns injected into a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DynamicEventDescriptor {
    /// Minimum number of injected spawns.
    pub min_count: u32,
    /// Maximum number of injected spawns.
    pub max_count: u32,
    /// Earliest spawn time.
    pub window_start: f64,
    /// Latest spawn time, clamped to the wave duration.
    pub window_end: f64,
    /// Tiers eligible for injection.
    pub tiers: Vec<TierId>,
}

/// Window in which a wave's evacuation objective may start.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvacuationDescriptor {
    /// Earliest start time.
    pub window_start: f64,
    /// Latest start time, clamped to the wave duration.
    pub window_end: f64,
    /// Overrides the global evacuation countdown.
    #[serde(default)]
    pub countdown: Option<f64>,
}

/// Length thresholds splitting vocabulary into difficulty buckets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordBands {
    /// Longest word considered easy.
    pub easy_max_length: usize,
    /// Longest word considered medium.
    pub medium_max_length: usize,
    /// Base weight of the easy bucket.
    pub easy_weight: f64,
    /// Base weight of the medium bucket.
    pub medium_weight: f64,
    /// Base weight of the hard bucket.
    pub hard_weight: f64,
    /// How strongly the difficulty bias shifts bucket weights.
    pub bias_strength: f64,
}

impl Default for WordBands {
    fn default() -> Self {
        Self {
            easy_max_length: 4,
            medium_max_length: 7,
            easy_weight: 0.5,
            medium_weight: 0.35,
            hard_weight: 0.15,
            bias_strength: 0.8,
        }
    }
}

/// Typing damage and combo tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    /// Damage per character of a completed word.
    pub damage_per_character: f64,
    /// Flat damage added on word completion.
    pub completion_bonus: f64,
    /// Seconds of idleness before the combo is lost.
    pub combo_decay_seconds: f64,
    /// Remaining decay seconds at which the combo warning activates.
    pub combo_warning_threshold: f64,
    /// Combo points removed by a typing error.
    pub error_combo_penalty: u32,
    /// Number of recent inputs tracked for accuracy.
    pub recent_window: usize,
    /// Recent accuracy at which the difficulty bias is neutral.
    pub target_accuracy: f64,
    /// Bias change per unit of accuracy above or below target.
    pub bias_gain: f64,
    /// Recent inputs required before the bias leaves zero.
    pub bias_min_samples: usize,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            damage_per_character: 8.0,
            completion_bonus: 10.0,
            combo_decay_seconds: 4.0,
            combo_warning_threshold: 1.5,
            error_combo_penalty: 2,
            recent_window: 20,
            target_accuracy: 0.85,
            bias_gain: 4.0,
            bias_min_samples: 8,
        }
    }
}

/// Shape of the typing support multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingSupportConfig {
    /// Multiplier growth per combo point.
    pub per_combo: f64,
    /// Cap on the combo contribution.
    pub combo_cap: f64,
    /// Cap on the whole multiplier.
    pub max_multiplier: f64,
}

impl Default for TypingSupportConfig {
    fn default() -> Self {
        Self {
            per_combo: 0.02,
            combo_cap: 0.5,
            max_multiplier: 1.5,
        }
    }
}

/// Limits applied to support boost activations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportBoostConfig {
    /// Seconds after activation before another boost is accepted.
    pub cooldown: f64,
    /// Largest accepted multiplier.
    pub max_multiplier: f64,
    /// Longest accepted duration.
    pub max_duration: f64,
}

impl Default for SupportBoostConfig {
    fn default() -> Self {
        Self {
            cooldown: 20.0,
            max_multiplier: 2.0,
            max_duration: 8.0,
        }
    }
}

/// Elite affix catalog and roll parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffixConfig {
    /// Probability that a regular spawn rolls affixes.
    pub chance: f64,
    /// Maximum affixes rolled onto one enemy.
    pub max_per_enemy: u32,
    /// Available affixes.
    pub catalog: Vec<AffixDefinition>,
}

impl Default for AffixConfig {
    fn default() -> Self {
        Self {
            chance: 0.15,
            max_per_enemy: 1,
            catalog: Vec::new(),
        }
    }
}

/// Catalog entry of an elite affix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffixDefinition {
    /// Affix identifier.
    pub kind: AffixKind,
    /// Relative roll weight.
    pub weight: f64,
    /// Effect contributed by the affix.
    pub effect: AffixEffect,
}

/// Effect contributed by an elite affix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AffixEffect {
    /// Scales incoming damage by source.
    Mitigation {
        /// Factor applied to turret damage.
        turret: f64,
        /// Factor applied to typing damage.
        typing: f64,
    },
    /// Adds shield on spawn.
    BonusShield {
        /// Shield added.
        amount: f64,
    },
    /// Slows turrets and enemies in the carrier's lane.
    LaneSlowAura {
        /// Turret fire-rate multiplier for the lane.
        fire_rate_multiplier: f64,
        /// Enemy speed multiplier for the lane.
        speed_multiplier: f64,
    },
}

/// Boss phase timings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Seconds between vulnerability windows.
    pub vulnerability_interval: f64,
    /// Seconds a vulnerability window lasts.
    pub vulnerability_duration: f64,
    /// Turret damage multiplier while vulnerable.
    pub vulnerability_multiplier: f64,
    /// Seconds between shockwaves.
    pub shockwave_interval: f64,
    /// Seconds a shockwave lasts.
    pub shockwave_duration: f64,
    /// Turret fire-rate multiplier in the boss lane during a shockwave.
    pub shockwave_fire_rate_multiplier: f64,
    /// Enemy speed multiplier in the boss lane during a shockwave.
    pub shockwave_speed_multiplier: f64,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            vulnerability_interval: 8.0,
            vulnerability_duration: 3.0,
            vulnerability_multiplier: 1.75,
            shockwave_interval: 11.0,
            shockwave_duration: 2.5,
            shockwave_fire_rate_multiplier: 0.5,
            shockwave_speed_multiplier: 1.0,
        }
    }
}

/// Evacuation objective tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvacuationConfig {
    /// Tier of the transport enemy.
    pub tier: TierId,
    /// Seconds the player has to destroy the transport.
    pub countdown: f64,
    /// Currency awarded on success.
    pub reward: u32,
    /// Currency deducted on failure.
    pub penalty: u32,
}

impl Default for EvacuationConfig {
    fn default() -> Self {
        Self {
            tier: TierId::from("transport"),
            countdown: 12.0,
            reward: 60,
            penalty: 30,
        }
    }
}

/// Optional challenge constraints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    /// Typing errors allowed before the session is lost.
    pub mistake_limit: Option<u32>,
}

/// Feature toggles; every combination is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// Inject RNG-generated spawns into waves.
    pub dynamic_spawns: bool,
    /// Roll elite affixes on spawn.
    pub elite_affixes: bool,
    /// Schedule evacuation objectives.
    pub evacuation_events: bool,
    /// Run boss phase mechanics.
    pub boss_mechanics: bool,
    /// Wrap to the first wave after the last one instead of ending.
    pub looping: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            dynamic_spawns: true,
            elite_affixes: true,
            evacuation_events: true,
            boss_mechanics: true,
            looping: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses_and_validates() {
        let config = GameConfig::builtin().expect("builtin config should parse");
        config.validate().expect("builtin config should validate");
        assert!(!config.waves.is_empty());
        assert!(config.tier(&TierId::from("grunt")).is_some());
        assert!(config.tiers.iter().any(|tier| tier.boss));
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let config = GameConfig::from_json_str(r#"{ "lanes": 2 }"#).expect("parse");
        assert_eq!(config.lanes, 2);
        assert_eq!(config.typing, TypingConfig::default());
        assert!(config.features.dynamic_spawns);
        assert!(!config.features.looping);
    }

    #[test]
    fn spawn_count_defaults_to_one() {
        let json = r#"{
            "tiers": [{ "id": "grunt", "health": 10, "speed": 0.1, "reward": 5, "breach_damage": 5 }],
            "waves": [{ "duration": 5, "spawns": [{ "at": 1, "lane": 0, "tier": "grunt" }] }]
        }"#;
        let config = GameConfig::from_json_str(json).expect("parse");
        assert_eq!(config.waves[0].spawns[0].count, 1);
        config.validate().expect("valid");
    }

    #[test]
    fn validation_rejects_unknown_tier() {
        let json = r#"{
            "waves": [{ "duration": 5, "spawns": [{ "at": 1, "lane": 0, "tier": "ghost" }] }]
        }"#;
        let config = GameConfig::from_json_str(json).expect("parse");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownTier { wave: 0, .. })
        ));
    }

    #[test]
    fn validation_rejects_out_of_range_lane() {
        let json = r#"{ "lanes": 2, "slots": [{ "id": 1, "lane": 2 }] }"#;
        let config = GameConfig::from_json_str(json).expect("parse");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LaneOutOfRange { lane: 2, lanes: 2 })
        ));
    }

    #[test]
    fn missing_evacuation_tier_is_fine_when_feature_disabled() {
        let json = r#"{
            "features": { "evacuation_events": false },
            "waves": [{ "duration": 5, "evacuation": { "window_start": 1, "window_end": 3 } }]
        }"#;
        let config = GameConfig::from_json_str(json).expect("parse");
        config.validate().expect("disabled evacuation is not validated");
    }

    #[test]
    fn passives_use_tagged_representation() {
        let passive: Passive =
            serde_json::from_str(r#"{ "kind": "bounty", "multiplier": 1.25 }"#).expect("parse");
        assert_eq!(passive, Passive::Bounty { multiplier: 1.25 });
    }
}
