//! Authoritative enemy state and damage resolution.

use std::collections::BTreeMap;

use keyboard_defence_core::{
    AffixEffect, DamageSource, EliteAffix, EnemyId, EnemySnapshot, EnemyStatus, SpawnKind, TierId,
};

/// Live enemy stored inside the world.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) tier: TierId,
    pub(crate) lane: u32,
    pub(crate) distance: f64,
    pub(crate) speed: f64,
    pub(crate) health: f64,
    pub(crate) max_health: f64,
    pub(crate) shield: f64,
    pub(crate) max_shield: f64,
    pub(crate) word: String,
    pub(crate) affixes: Vec<EliteAffix>,
    pub(crate) spawned_at: f64,
    pub(crate) wave: u32,
    pub(crate) kind: SpawnKind,
}

/// Portion of a hit absorbed by the shield and by health.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DamageReport {
    pub(crate) shield: f64,
    pub(crate) health: f64,
    pub(crate) defeated: bool,
}

impl Enemy {
    /// Product of the affix mitigation factors for `source`.
    pub(crate) fn mitigation(&self, source: DamageSource) -> f64 {
        self.affixes
            .iter()
            .filter_map(|affix| match affix.effect {
                AffixEffect::Mitigation { turret, typing } => Some(match source {
                    DamageSource::Turret => turret,
                    DamageSource::Typing => typing,
                }),
                _ => None,
            })
            .fold(1.0, |total, factor| total * factor.max(0.0))
    }

    /// Applies a hit of `amount` after mitigation and `multiplier`.
    ///
    /// The shield absorbs first and overflow reaches health, which never drops
    /// below zero.
    pub(crate) fn take_damage(
        &mut self,
        amount: f64,
        source: DamageSource,
        multiplier: f64,
    ) -> DamageReport {
        let amount = (amount * self.mitigation(source) * multiplier).max(0.0);
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let overflow = amount - absorbed;
        let dealt = overflow.min(self.health);
        self.health = (self.health - overflow).max(0.0);
        DamageReport {
            shield: absorbed,
            health: dealt,
            defeated: self.health <= 0.0,
        }
    }

    /// Speed multiplier this enemy's auras impose on its lane.
    pub(crate) fn aura_speed(&self) -> impl Iterator<Item = f64> + '_ {
        self.affixes.iter().filter_map(|affix| match affix.effect {
            AffixEffect::LaneSlowAura {
                speed_multiplier, ..
            } => Some(speed_multiplier),
            _ => None,
        })
    }

    /// Fire-rate multipliers this enemy's auras impose on its lane.
    pub(crate) fn aura_fire_rate(&self) -> impl Iterator<Item = f64> + '_ {
        self.affixes.iter().filter_map(|affix| match affix.effect {
            AffixEffect::LaneSlowAura {
                fire_rate_multiplier,
                ..
            } => Some(fire_rate_multiplier),
            _ => None,
        })
    }

    pub(crate) fn snapshot(&self, typed: u32) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            tier: self.tier.clone(),
            lane: self.lane,
            distance: self.distance,
            health: self.health,
            max_health: self.max_health,
            shield: self.shield,
            max_shield: self.max_shield,
            word: self.word.clone(),
            typed,
            status: EnemyStatus::Alive,
            affixes: self.affixes.clone(),
            spawned_at: self.spawned_at,
            wave: self.wave,
            kind: self.kind,
        }
    }
}

/// Registry that stores live enemies and manages identifier allocation.
#[derive(Clone, Debug)]
pub(crate) struct EnemyRoster {
    entries: BTreeMap<EnemyId, Enemy>,
    next_id: EnemyId,
}

impl EnemyRoster {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: EnemyId::new(1),
        }
    }

    /// Allocates the identifier the next inserted enemy receives.
    pub(crate) fn allocate(&mut self) -> EnemyId {
        let id = self.next_id;
        self.next_id = EnemyId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, enemy: Enemy) {
        let _ = self.entries.insert(enemy.id, enemy);
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    pub(crate) fn in_lane(&self, lane: u32) -> impl Iterator<Item = &Enemy> {
        self.entries.values().filter(move |enemy| enemy.lane == lane)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }
}
