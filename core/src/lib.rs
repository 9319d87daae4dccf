#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Keyboard Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes them through its `apply`
//! entry point and broadcasts [`Event`] values describing what happened.
//! Systems consume immutable views such as [`EnemyView`] and respond with
//! decisions the world applies in a fixed order.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod rng;
mod snapshot;

pub use config::{AffixEffect, GameConfig, Passive};
pub use rng::{RngState, Seed};
pub use snapshot::{
    BossSnapshot, EnemySnapshot, EnemyView, EvacuationSnapshot, HazardSnapshot,
    ProjectileSnapshot, SessionAnalytics, SlotSnapshot, StateSnapshot, StructureSnapshot,
    SupportBoostSnapshot, TurretSnapshot, TypingSnapshot, UpcomingSpawn, WaveProgressSnapshot,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Keyboard Defence.";

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier of a pre-allocated turret slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the slot identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an enemy archetype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TierId(String);

impl TierId {
    /// Creates a tier identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TierId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a turret archetype.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurretKindId(String);

impl TurretKindId {
    /// Creates a turret archetype identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TurretKindId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for TurretKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a simulation session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Time advances and commands are accepted.
    Running,
    /// Time is frozen; only resuming and mode changes are accepted.
    Paused,
    /// Every wave has been cleared.
    Victory,
    /// The structure fell or the challenge limit was reached.
    Defeat,
}

impl SessionStatus {
    /// Reports whether the session reached a terminal state.
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Victory | Self::Defeat)
    }
}

/// Gameplay mode of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Breaches damage the structure and challenge limits apply.
    Campaign,
    /// Breaches are harmless; used for drills.
    Practice,
}

/// Rule a turret uses to pick a target within its lane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    /// Enemy closest to breaching.
    #[default]
    First,
    /// Enemy with the highest current health.
    Strongest,
    /// Enemy with the lowest current health.
    Weakest,
}

/// Origin of damage applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    /// Damage from a completed typed word.
    Typing,
    /// Damage from a turret projectile.
    Turret,
}

/// Lifecycle status of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyStatus {
    /// The enemy is advancing.
    Alive,
    /// The enemy's health reached zero.
    Defeated,
    /// The enemy reached the structure.
    Breached,
}

/// How an enemy entered the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    /// Declared in the wave's static spawn list.
    Static,
    /// Injected by the wave's dynamic events.
    Dynamic,
    /// Transport of an evacuation objective.
    Evacuation,
    /// Spawned through the command API.
    Manual,
}

/// Identifier of an elite affix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixKind {
    /// Mitigates incoming damage.
    Armored,
    /// Carries an extra shield.
    Shielded,
    /// Slows the carrier's lane.
    SlowAura,
}

/// Affix attached to an enemy at spawn; never changes afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EliteAffix {
    /// Affix identifier.
    pub kind: AffixKind,
    /// Effect contributed by the affix.
    pub effect: AffixEffect,
}

/// Timed boss sub-phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossPhase {
    /// Turret damage against the boss is multiplied.
    Vulnerability,
    /// Turrets in the boss lane are slowed.
    Shockwave,
}

/// Optional overrides accepted when spawning an enemy through the API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnOptions {
    /// Replaces the tier's base shield.
    pub shield: Option<f64>,
    /// Applies these affixes instead of rolling.
    pub affixes: Vec<AffixKind>,
}

/// Parameters of a support boost activation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    /// Multiplier applied to turret fire rate in the lane.
    pub multiplier: f64,
    /// Seconds the boost lasts.
    pub duration: f64,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Advances the simulation clock by the provided delta in seconds.
    Advance {
        /// Seconds of simulated time that elapsed since the previous tick.
        dt: f64,
    },
    /// Spawns an enemy outside of the wave schedule.
    SpawnEnemy {
        /// Tier of the enemy.
        tier: TierId,
        /// Lane the enemy enters.
        lane: u32,
        /// Optional overrides.
        #[serde(default)]
        options: SpawnOptions,
    },
    /// Installs a turret into an empty, unlocked slot.
    PlaceTurret {
        /// Target slot.
        slot: SlotId,
        /// Turret archetype to install.
        kind: TurretKindId,
    },
    /// Raises the level of an installed turret.
    UpgradeTurret {
        /// Slot holding the turret.
        slot: SlotId,
    },
    /// Changes how a slot's turret picks targets.
    SetTargetPriority {
        /// Slot to reconfigure.
        slot: SlotId,
        /// New priority rule.
        priority: TargetPriority,
    },
    /// Raises the structure to its next level.
    UpgradeStructure,
    /// Restores structure health.
    RepairStructure,
    /// Feeds one typed character to the typing system.
    InputCharacter {
        /// Character typed by the player.
        character: char,
    },
    /// Removes the last typed character.
    Backspace,
    /// Clears the typing buffer and releases the target.
    PurgeBuffer,
    /// Restores a lost combo through an assist mechanic.
    RecoverCombo {
        /// Combo points to restore.
        amount: u32,
    },
    /// Switches between campaign and practice.
    SetMode {
        /// Mode to activate.
        mode: GameMode,
    },
    /// Sets or clears the lane preferred when binding typing targets.
    SetLaneFocus {
        /// Focused lane, if any.
        lane: Option<u32>,
    },
    /// Temporarily boosts turret fire rate in a lane.
    ActivateSupportBoost {
        /// Boosted lane.
        lane: u32,
        /// Boost parameters.
        params: BoostParams,
    },
    /// Freezes simulation time.
    Pause,
    /// Resumes simulation time.
    Resume,
    /// Ends the current wave immediately, clearing live enemies.
    SkipWave,
}

/// Record of a combo lost to idle decay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboWarningDelta {
    /// Simulation time at which the combo was lost.
    pub time: f64,
    /// Combo before the loss.
    pub combo_before: u32,
    /// Combo after the loss.
    pub combo_after: u32,
    /// Recent accuracy when the warning started.
    pub accuracy_before: f64,
    /// Recent accuracy when the combo was lost.
    pub accuracy_after: f64,
}

/// Result of feeding one character to the typing system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputOutcome {
    /// Input was not alphanumeric; nothing changed.
    Ignored,
    /// Character matched and the word is not finished yet.
    Progress {
        /// Bound target.
        enemy: EnemyId,
        /// Characters typed so far.
        typed: u32,
    },
    /// Character completed the target word.
    Completed {
        /// Target whose word was completed.
        enemy: EnemyId,
        /// Completed word.
        word: String,
    },
    /// Character did not match.
    Mismatch {
        /// Character that was expected, if a target was bound.
        expected: Option<char>,
    },
}

/// Successful result of [`Command`] dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The command mutated state.
    Applied,
    /// Result of a spawn request; `None` when it was silently dropped.
    Spawned {
        /// Identifier of the spawned enemy.
        enemy: Option<EnemyId>,
    },
    /// Result of a typed character.
    Input {
        /// Typing resolution.
        outcome: InputOutcome,
    },
    /// Result of a support boost request.
    Boost {
        /// Whether the boost was activated.
        activated: bool,
    },
}

/// Validation failures returned by commands. None of them mutate state.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum CommandError {
    /// The session is paused.
    #[error("the simulation is paused")]
    Paused,
    /// The session reached victory or defeat.
    #[error("the session has ended")]
    SessionOver,
    /// Not enough currency for the action.
    #[error("not enough currency: {required} required, {available} available")]
    InsufficientCurrency {
        /// Currency required.
        required: u32,
        /// Currency available.
        available: u32,
    },
    /// The slot does not exist.
    #[error("slot {slot} does not exist")]
    UnknownSlot {
        /// Requested slot.
        slot: SlotId,
    },
    /// The slot has not been unlocked.
    #[error("slot {slot} is locked")]
    SlotLocked {
        /// Requested slot.
        slot: SlotId,
    },
    /// The slot already holds a turret.
    #[error("slot {slot} already holds a turret")]
    SlotOccupied {
        /// Requested slot.
        slot: SlotId,
    },
    /// The slot holds no turret.
    #[error("slot {slot} has no turret")]
    SlotEmpty {
        /// Requested slot.
        slot: SlotId,
    },
    /// The turret archetype is not configured.
    #[error("unknown turret type `{kind}`")]
    UnknownTurretKind {
        /// Requested archetype.
        kind: TurretKindId,
    },
    /// The turret cannot be upgraded further.
    #[error("turret in slot {slot} is at its maximum level")]
    TurretAtMaxLevel {
        /// Requested slot.
        slot: SlotId,
    },
    /// The structure cannot be upgraded further.
    #[error("structure is at its maximum level")]
    StructureAtMaxLevel,
    /// A repair was requested at full health.
    #[error("structure is at full health")]
    FullHealth,
    /// A repair was requested before the cooldown elapsed.
    #[error("repair is cooling down ({remaining:.1}s remaining)")]
    RepairCoolingDown {
        /// Seconds until repairs are accepted again.
        remaining: f64,
    },
    /// The lane does not exist.
    #[error("lane {lane} does not exist")]
    InvalidLane {
        /// Requested lane.
        lane: u32,
    },
}

/// Events broadcast by the world after processing commands and ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The simulation clock advanced.
    TimeAdvanced {
        /// Seconds of simulated time that elapsed.
        dt: f64,
    },
    /// A wave began.
    WaveStarted {
        /// Index of the wave.
        wave: u32,
    },
    /// A wave ended.
    WaveCompleted {
        /// Index of the wave.
        wave: u32,
        /// Whether the wave was force-skipped.
        skipped: bool,
    },
    /// An enemy entered a lane.
    EnemySpawned {
        /// Assigned identifier.
        enemy: EnemyId,
        /// Tier of the enemy.
        tier: TierId,
        /// Lane entered.
        lane: u32,
        /// Word assigned for typing.
        word: String,
        /// Spawn origin.
        kind: SpawnKind,
        /// Attached affixes.
        affixes: Vec<AffixKind>,
    },
    /// Damage reached an enemy.
    EnemyDamaged {
        /// Damaged enemy.
        enemy: EnemyId,
        /// Damage origin.
        source: DamageSource,
        /// Damage absorbed by the shield.
        shield_damage: f64,
        /// Damage applied to health.
        health_damage: f64,
    },
    /// An enemy was defeated.
    EnemyDefeated {
        /// Defeated enemy.
        enemy: EnemyId,
        /// Tier of the enemy.
        tier: TierId,
        /// Lane the enemy occupied.
        lane: u32,
        /// Source of the killing blow.
        source: DamageSource,
        /// Currency awarded.
        reward: u32,
    },
    /// An enemy reached the structure.
    EnemyBreached {
        /// Breaching enemy.
        enemy: EnemyId,
        /// Tier of the enemy.
        tier: TierId,
        /// Lane the enemy occupied.
        lane: u32,
        /// Structure damage after armor.
        damage: f64,
    },
    /// A turret fired.
    ProjectileFired {
        /// Assigned projectile identifier.
        projectile: ProjectileId,
        /// Firing slot.
        slot: SlotId,
        /// Targeted enemy.
        enemy: EnemyId,
    },
    /// A turret was installed.
    TurretPlaced {
        /// Slot receiving the turret.
        slot: SlotId,
        /// Installed archetype.
        kind: TurretKindId,
    },
    /// A turret was upgraded.
    TurretUpgraded {
        /// Slot holding the turret.
        slot: SlotId,
        /// New level, starting at one.
        level: u32,
    },
    /// A slot's targeting priority changed.
    TargetPriorityChanged {
        /// Reconfigured slot.
        slot: SlotId,
        /// New priority.
        priority: TargetPriority,
    },
    /// A locked slot became available.
    SlotUnlocked {
        /// Unlocked slot.
        slot: SlotId,
    },
    /// The structure reached a new level.
    StructureUpgraded {
        /// New level, starting at one.
        level: u32,
    },
    /// The structure was repaired.
    StructureRepaired {
        /// Health restored.
        amount: f64,
        /// Currency spent.
        cost: u32,
    },
    /// A structure passive became active.
    PassiveUnlocked {
        /// Unlocked passive.
        passive: Passive,
    },
    /// A typed word was completed.
    WordCompleted {
        /// Target enemy.
        enemy: EnemyId,
        /// Completed word.
        word: String,
        /// Damage dealt before mitigation.
        damage: f64,
    },
    /// A typed character did not match.
    TypingError {
        /// Expected character, if a target was bound.
        expected: Option<char>,
        /// Character received.
        received: char,
    },
    /// The combo decay timer crossed the warning threshold.
    ComboWarning {
        /// Combo at risk.
        combo: u32,
    },
    /// The combo was lost to decay.
    ComboWarningDelta {
        /// Recorded delta.
        delta: ComboWarningDelta,
    },
    /// A lost combo was partially or fully restored.
    ComboRecovered {
        /// Combo after recovery.
        combo: u32,
    },
    /// A boss entered the field.
    BossIntro {
        /// Boss enemy.
        enemy: EnemyId,
        /// Boss tier.
        tier: TierId,
    },
    /// A boss sub-phase started or ended.
    BossPhaseChanged {
        /// Boss enemy.
        enemy: EnemyId,
        /// Sub-phase.
        phase: BossPhase,
        /// Whether the sub-phase started.
        active: bool,
    },
    /// An evacuation transport spawned.
    EvacuationStarted {
        /// Transport enemy.
        enemy: EnemyId,
        /// Lane of the transport.
        lane: u32,
        /// Seconds available.
        countdown: f64,
    },
    /// The transport was destroyed in time.
    EvacuationSucceeded {
        /// Currency awarded.
        reward: u32,
    },
    /// The countdown expired or the transport breached.
    EvacuationFailed {
        /// Currency deducted.
        penalty: u32,
    },
    /// No free lane was available for the wave's evacuation.
    EvacuationSkipped {
        /// Wave index.
        wave: u32,
    },
    /// A lane hazard started.
    HazardStarted {
        /// Affected lane.
        lane: u32,
    },
    /// A lane hazard expired.
    HazardExpired {
        /// Affected lane.
        lane: u32,
    },
    /// A support boost was activated.
    SupportBoostActivated {
        /// Boosted lane.
        lane: u32,
        /// Effective multiplier.
        multiplier: f64,
        /// Effective duration.
        duration: f64,
    },
    /// The active support boost ended.
    SupportBoostExpired {
        /// Previously boosted lane.
        lane: u32,
    },
    /// The session status changed.
    StatusChanged {
        /// New status.
        status: SessionStatus,
    },
    /// The game mode changed.
    ModeChanged {
        /// New mode.
        mode: GameMode,
    },
    /// The focused lane changed.
    LaneFocusChanged {
        /// New focused lane.
        lane: Option<u32>,
    },
    /// The challenge mistake limit was reached.
    ChallengeMistakeLimitReached {
        /// Errors recorded.
        mistakes: u32,
    },
}

/// Recorded session input: a seed plus the exact command sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Seed the session was created with.
    pub seed: Seed,
    /// Commands in application order.
    pub commands: Vec<Command>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_snake_case_tags() {
        let json = serde_json::to_string(&Command::InputCharacter { character: 'r' })
            .expect("serialize");
        assert_eq!(json, r#"{"type":"input_character","character":"r"}"#);

        let parsed: Command = serde_json::from_str(r#"{"type":"skip_wave"}"#).expect("parse");
        assert_eq!(parsed, Command::SkipWave);
    }

    #[test]
    fn spawn_command_options_are_optional() {
        let parsed: Command =
            serde_json::from_str(r#"{"type":"spawn_enemy","tier":"grunt","lane":1}"#)
                .expect("parse");
        assert_eq!(
            parsed,
            Command::SpawnEnemy {
                tier: TierId::from("grunt"),
                lane: 1,
                options: SpawnOptions::default(),
            }
        );
    }

    #[test]
    fn replay_script_accepts_text_and_numeric_seeds() {
        let numeric: ReplayScript =
            serde_json::from_str(r#"{"seed":123,"commands":[{"type":"pause"}]}"#).expect("parse");
        assert_eq!(numeric.seed, Seed::Number(123));
        let text: ReplayScript =
            serde_json::from_str(r#"{"seed":"ghost","commands":[]}"#).expect("parse");
        assert_eq!(text.seed, Seed::Text("ghost".to_owned()));
    }

    #[test]
    fn command_errors_read_naturally() {
        assert_eq!(
            CommandError::FullHealth.to_string(),
            "structure is at full health"
        );
        assert_eq!(
            CommandError::RepairCoolingDown { remaining: 4.25 }.to_string(),
            "repair is cooling down (4.2s remaining)"
        );
        assert_eq!(
            CommandError::SlotLocked {
                slot: SlotId::new(4)
            }
            .to_string(),
            "slot 4 is locked"
        );
    }

    #[test]
    fn terminal_statuses_are_over() {
        assert!(SessionStatus::Victory.is_over());
        assert!(SessionStatus::Defeat.is_over());
        assert!(!SessionStatus::Paused.is_over());
    }

    #[test]
    fn enemy_snapshot_serializes_with_bincode() {
        let snapshot = EnemySnapshot {
            id: EnemyId::new(3),
            tier: TierId::from("grunt"),
            lane: 1,
            distance: 0.25,
            health: 30.0,
            max_health: 30.0,
            shield: 0.0,
            max_shield: 0.0,
            word: "raid".to_owned(),
            typed: 2,
            status: EnemyStatus::Alive,
            affixes: Vec::new(),
            spawned_at: 1.5,
            wave: 0,
            kind: SpawnKind::Static,
        };
        let first = bincode::serialize(&snapshot).expect("serialize");
        let second = bincode::serialize(&snapshot.clone()).expect("serialize");
        assert_eq!(first, second);
    }
}
