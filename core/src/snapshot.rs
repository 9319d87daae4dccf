//! Read-only, serialisable views of the simulation state.

use serde::{Deserialize, Serialize};

use crate::{
    ComboWarningDelta, EliteAffix, EnemyId, EnemyStatus, GameMode, Passive, ProjectileId,
    SessionStatus, SlotId, SpawnKind, TargetPriority, TierId, TurretKindId,
};

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub tier: TierId,
    /// Lane the enemy travels along.
    pub lane: u32,
    /// Progress toward the structure; one means breach.
    pub distance: f64,
    /// Current health.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Current shield.
    pub shield: f64,
    /// Shield the enemy spawned with.
    pub max_shield: f64,
    /// Word assigned for typing.
    pub word: String,
    /// Characters of the word typed so far.
    pub typed: u32,
    /// Lifecycle status.
    pub status: EnemyStatus,
    /// Affixes attached at spawn.
    pub affixes: Vec<EliteAffix>,
    /// Simulation time of the spawn.
    pub spawned_at: f64,
    /// Wave the enemy originated from.
    pub wave: u32,
    /// Spawn origin.
    pub kind: SpawnKind,
}

impl EnemySnapshot {
    /// First character of the assigned word.
    #[must_use]
    pub fn initial(&self) -> Option<char> {
        self.word.chars().next()
    }
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the enemies travelling along `lane`.
    pub fn in_lane(&self, lane: u32) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.lane == lane)
    }

    /// Looks up a single enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Installed turret state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurretSnapshot {
    /// Turret archetype.
    pub kind: TurretKindId,
    /// Current level, starting at one.
    pub level: u32,
    /// Seconds until the turret may fire again.
    pub cooldown: f64,
}

/// Turret slot state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    /// Slot identifier.
    pub id: SlotId,
    /// Lane covered by the slot.
    pub lane: u32,
    /// Whether turrets may be installed.
    pub unlocked: bool,
    /// Targeting rule.
    pub priority: TargetPriority,
    /// Installed turret, if any.
    pub turret: Option<TurretSnapshot>,
}

/// In-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Projectile identifier.
    pub id: ProjectileId,
    /// Firing slot.
    pub slot: SlotId,
    /// Lane of the firing slot.
    pub lane: u32,
    /// Targeted enemy.
    pub target: EnemyId,
    /// Damage carried.
    pub damage: f64,
    /// Seconds until impact.
    pub remaining: f64,
}

/// Defended structure state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    /// Current health.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Flat breach damage reduction.
    pub armor: f64,
    /// Health regenerated per second.
    pub regen: f64,
    /// Upgrade level, starting at one.
    pub level: u32,
    /// Seconds before another repair is allowed.
    pub repair_cooldown: f64,
    /// Passives unlocked so far, in unlock order.
    pub passives: Vec<Passive>,
}

/// Wave progression state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveProgressSnapshot {
    /// Index of the current or next wave.
    pub index: u32,
    /// Completed passes over the wave list when looping.
    pub cycle: u32,
    /// Whether a wave is in progress.
    pub active: bool,
    /// Seconds until the next wave starts while inactive.
    pub countdown: f64,
    /// Seconds elapsed in the active wave.
    pub elapsed: f64,
    /// Number of configured waves.
    pub total: u32,
}

/// Typing and combo state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingSnapshot {
    /// Characters typed toward the bound target.
    pub buffer: String,
    /// Bound target.
    pub target: Option<EnemyId>,
    /// Alphanumeric inputs received.
    pub total_inputs: u32,
    /// Inputs that matched.
    pub correct_inputs: u32,
    /// Inputs that did not match.
    pub errors: u32,
    /// Current combo.
    pub combo: u32,
    /// Highest combo reached.
    pub best_combo: u32,
    /// Seconds until the combo decays.
    pub decay_remaining: f64,
    /// Whether the combo warning is active.
    pub combo_warning: bool,
    /// Accuracy over every input.
    pub accuracy: f64,
    /// Accuracy over the recent window.
    pub recent_accuracy: f64,
    /// Word difficulty bias in `[-1, 1]`.
    pub difficulty_bias: f64,
    /// Combo available for recovery.
    pub last_lost_combo: u32,
}

/// Active boss state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    /// Boss enemy.
    pub enemy: EnemyId,
    /// Lane of the boss.
    pub lane: u32,
    /// Whether the vulnerability window is open.
    pub vulnerable: bool,
    /// Seconds until the vulnerability window toggles.
    pub vulnerability_timer: f64,
    /// Whether a shockwave is active.
    pub shockwave: bool,
    /// Seconds until the shockwave toggles.
    pub shockwave_timer: f64,
}

/// Active evacuation state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvacuationSnapshot {
    /// Transport enemy.
    pub enemy: EnemyId,
    /// Lane of the transport.
    pub lane: u32,
    /// Seconds until the objective fails.
    pub remaining: f64,
}

/// Active lane hazard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardSnapshot {
    /// Affected lane.
    pub lane: u32,
    /// Seconds until expiry.
    pub remaining: f64,
    /// Turret fire-rate multiplier.
    pub fire_rate_multiplier: f64,
    /// Enemy speed multiplier.
    pub speed_multiplier: f64,
}

/// Support boost state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportBoostSnapshot {
    /// Boosted lane while active.
    pub lane: Option<u32>,
    /// Active multiplier.
    pub multiplier: f64,
    /// Seconds until the boost ends.
    pub remaining: f64,
    /// Seconds until another boost is accepted.
    pub cooldown: f64,
}

/// Cumulative session counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalytics {
    /// Waves completed, skipped ones included.
    pub waves_completed: u32,
    /// Enemies spawned.
    pub enemies_spawned: u32,
    /// Spawn requests dropped for full lanes or unknown tiers.
    pub spawns_dropped: u32,
    /// Enemies defeated by typing.
    pub typing_kills: u32,
    /// Enemies defeated by turrets.
    pub turret_kills: u32,
    /// Enemies that reached the structure.
    pub breaches: u32,
    /// Enemies removed by skipped waves.
    pub enemies_cleared: u32,
    /// Words completed.
    pub words_completed: u32,
    /// Damage dealt by typing after mitigation.
    pub typing_damage: f64,
    /// Damage dealt by turrets after mitigation.
    pub turret_damage: f64,
    /// Structure damage taken from breaches.
    pub structure_damage: f64,
    /// Projectiles fired.
    pub projectiles_fired: u32,
    /// Projectiles discarded because their target left the lane.
    pub projectiles_lost: u32,
    /// Currency earned from every source.
    pub currency_earned: u64,
    /// Currency spent or deducted.
    pub currency_spent: u64,
    /// Evacuations completed successfully.
    pub evacuations_succeeded: u32,
    /// Evacuations that failed.
    pub evacuations_failed: u32,
    /// Evacuations skipped for lack of a free lane.
    pub evacuations_skipped: u32,
    /// Bosses defeated.
    pub bosses_defeated: u32,
    /// Support boosts activated.
    pub boosts_activated: u32,
    /// Combos lost to decay, in order.
    pub combo_warning_deltas: Vec<ComboWarningDelta>,
}

/// Planned spawn that has not been released yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpcomingSpawn {
    /// Seconds into the wave.
    pub at: f64,
    /// Lane of the spawn.
    pub lane: u32,
    /// Tier of the spawn.
    pub tier: TierId,
    /// Spawn origin.
    pub kind: SpawnKind,
}

/// Complete read-only capture of the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Simulation time in seconds.
    pub time: f64,
    /// Session status.
    pub status: SessionStatus,
    /// Game mode.
    pub mode: GameMode,
    /// Wave progression.
    pub wave: WaveProgressSnapshot,
    /// Structure state.
    pub structure: StructureSnapshot,
    /// Currency available.
    pub currency: u32,
    /// Accumulated score.
    pub score: u64,
    /// Turret slots in ascending id order.
    pub slots: Vec<SlotSnapshot>,
    /// Live enemies in ascending id order.
    pub enemies: Vec<EnemySnapshot>,
    /// In-flight projectiles in ascending id order.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Typing state.
    pub typing: TypingSnapshot,
    /// Boss state while a boss is active.
    pub boss: Option<BossSnapshot>,
    /// Evacuation state while an objective is active.
    pub evacuation: Option<EvacuationSnapshot>,
    /// Active lane hazards.
    pub hazards: Vec<HazardSnapshot>,
    /// Support boost state.
    pub support_boost: SupportBoostSnapshot,
    /// Lane preferred when binding typing targets.
    pub lane_focus: Option<u32>,
    /// Cumulative counters.
    pub analytics: SessionAnalytics,
    /// Raw generator state.
    pub rng_state: u64,
}
