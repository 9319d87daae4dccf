#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that selects turret targets and resolves fire rates.

use keyboard_defence_core::{
    config::TypingSupportConfig, EnemyId, EnemySnapshot, EnemyView, SlotId, TargetPriority,
};

/// Lowest fire-rate multiplier a lane can be slowed to.
pub const MIN_FIRE_RATE: f64 = 0.05;

/// Turret that finished its cooldown and is looking for a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadyTurret {
    /// Slot holding the turret.
    pub slot: SlotId,
    /// Lane covered by the slot.
    pub lane: u32,
    /// Targeting rule of the slot.
    pub priority: TargetPriority,
}

/// Target chosen for a ready turret.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurretTarget {
    /// Firing slot.
    pub slot: SlotId,
    /// Selected enemy.
    pub enemy: EnemyId,
}

/// Turret targeting system that reuses a scratch buffer between ticks.
#[derive(Debug, Default)]
pub struct TurretTargeting {
    candidates: Vec<Candidate>,
}

impl TurretTargeting {
    /// Creates a new targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a target for every ready turret.
    ///
    /// The output buffer is cleared first. Turrets without an enemy in their
    /// lane produce no entry. Output follows the order of `turrets`.
    pub fn handle(
        &mut self,
        turrets: &[ReadyTurret],
        enemies: &EnemyView,
        out: &mut Vec<TurretTarget>,
    ) {
        out.clear();

        if turrets.is_empty() {
            return;
        }

        for turret in turrets {
            self.candidates.clear();
            self.candidates
                .extend(enemies.in_lane(turret.lane).map(Candidate::from));

            let mut best: Option<&Candidate> = None;
            for candidate in &self.candidates {
                match best {
                    Some(existing) if !candidate.precedes(existing, turret.priority) => {}
                    _ => best = Some(candidate),
                }
            }

            if let Some(candidate) = best {
                out.push(TurretTarget {
                    slot: turret.slot,
                    enemy: candidate.id,
                });
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    id: EnemyId,
    distance: f64,
    health: f64,
}

impl From<&EnemySnapshot> for Candidate {
    fn from(snapshot: &EnemySnapshot) -> Self {
        Self {
            id: snapshot.id,
            distance: snapshot.distance,
            health: snapshot.health,
        }
    }
}

impl Candidate {
    fn precedes(&self, other: &Self, priority: TargetPriority) -> bool {
        let (mine, theirs) = match priority {
            TargetPriority::First => (self.distance, other.distance),
            TargetPriority::Strongest => (self.health, other.health),
            TargetPriority::Weakest => (-self.health, -other.health),
        };

        if mine != theirs {
            return mine > theirs;
        }

        self.id < other.id
    }
}

/// Combines the active slow sources of a lane into one fire-rate multiplier.
///
/// Returns the smallest source, or `1.0` when the lane has none. The result is
/// floored at [`MIN_FIRE_RATE`].
#[must_use]
pub fn lane_fire_rate(sources: impl IntoIterator<Item = f64>) -> f64 {
    sources
        .into_iter()
        .filter(|source| source.is_finite())
        .fold(1.0_f64, f64::min)
        .max(MIN_FIRE_RATE)
}

/// Cooldown multiplier granted by the player's typing performance.
#[must_use]
pub fn typing_support_multiplier(
    combo: u32,
    accuracy: f64,
    config: &TypingSupportConfig,
) -> f64 {
    let contribution = (f64::from(combo) * config.per_combo).min(config.combo_cap);
    let multiplier = 1.0 + contribution * accuracy.clamp(0.0, 1.0);
    multiplier.min(config.max_multiplier).max(1.0)
}

/// Cooldown applied to a turret right after it fires.
#[must_use]
pub fn cooldown_after_fire(base: f64, fire_rate: f64, support: f64, boost: f64) -> f64 {
    let rate = fire_rate.max(MIN_FIRE_RATE) * support.max(1.0) * boost.max(1.0);
    base.max(0.0) / rate
}
