//! Authoritative turret slot and projectile state.

use std::collections::BTreeMap;

use keyboard_defence_core::{
    config::SlotDefinition, EnemyId, ProjectileId, ProjectileSnapshot, SlotId, SlotSnapshot,
    TargetPriority, TurretKindId, TurretSnapshot,
};

/// Turret installed into a slot.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Turret {
    pub(crate) kind: TurretKindId,
    /// Zero-based index into the archetype's level table.
    pub(crate) level: usize,
    pub(crate) cooldown: f64,
}

/// Pre-allocated turret slot.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Slot {
    pub(crate) id: SlotId,
    pub(crate) lane: u32,
    pub(crate) unlocked: bool,
    pub(crate) unlock_wave: Option<u32>,
    pub(crate) priority: TargetPriority,
    pub(crate) turret: Option<Turret>,
}

impl Slot {
    fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            id: self.id,
            lane: self.lane,
            unlocked: self.unlocked,
            priority: self.priority,
            turret: self.turret.as_ref().map(|turret| TurretSnapshot {
                kind: turret.kind.clone(),
                level: u32::try_from(turret.level + 1).unwrap_or(u32::MAX),
                cooldown: turret.cooldown,
            }),
        }
    }
}

/// Projectile travelling toward its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) slot: SlotId,
    pub(crate) lane: u32,
    pub(crate) target: EnemyId,
    pub(crate) damage: f64,
    pub(crate) remaining: f64,
}

/// Registry that stores slots and projectiles and allocates projectile ids.
#[derive(Clone, Debug)]
pub(crate) struct TurretRegistry {
    slots: BTreeMap<SlotId, Slot>,
    projectiles: Vec<Projectile>,
    next_projectile_id: ProjectileId,
}

impl TurretRegistry {
    /// Creates the registry with every configured slot and no turrets.
    pub(crate) fn new(definitions: &[SlotDefinition]) -> Self {
        let slots = definitions
            .iter()
            .map(|definition| {
                (
                    definition.id,
                    Slot {
                        id: definition.id,
                        lane: definition.lane,
                        unlocked: definition.unlocked,
                        unlock_wave: definition.unlock_wave,
                        priority: TargetPriority::default(),
                        turret: None,
                    },
                )
            })
            .collect();
        Self {
            slots,
            projectiles: Vec::new(),
            next_projectile_id: ProjectileId::new(1),
        }
    }

    pub(crate) fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(&id)
    }

    /// Slots in ascending id order.
    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.slots.values_mut()
    }

    /// Unlocks every locked slot matching `predicate`, returning their ids.
    pub(crate) fn unlock_where(&mut self, predicate: impl Fn(&Slot) -> bool) -> Vec<SlotId> {
        let mut unlocked = Vec::new();
        for slot in self.slots.values_mut() {
            if !slot.unlocked && predicate(slot) {
                slot.unlocked = true;
                unlocked.push(slot.id);
            }
        }
        unlocked
    }

    pub(crate) fn launch(
        &mut self,
        slot: SlotId,
        lane: u32,
        target: EnemyId,
        damage: f64,
        flight_time: f64,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().saturating_add(1));
        self.projectiles.push(Projectile {
            id,
            slot,
            lane,
            target,
            damage,
            remaining: flight_time.max(0.0),
        });
        id
    }

    /// Takes every projectile out of flight; the caller returns the ones that
    /// are still travelling through [`TurretRegistry::restore`].
    pub(crate) fn take_projectiles(&mut self) -> Vec<Projectile> {
        std::mem::take(&mut self.projectiles)
    }

    pub(crate) fn restore(&mut self, projectiles: Vec<Projectile>) {
        self.projectiles = projectiles;
    }

    pub(crate) fn clear_projectiles(&mut self) {
        self.projectiles.clear();
    }

    pub(crate) fn slot_snapshots(&self) -> Vec<SlotSnapshot> {
        self.slots.values().map(Slot::snapshot).collect()
    }

    pub(crate) fn projectile_snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.projectiles
            .iter()
            .map(|projectile| ProjectileSnapshot {
                id: projectile.id,
                slot: projectile.slot,
                lane: projectile.lane,
                target: projectile.target,
                damage: projectile.damage,
                remaining: projectile.remaining,
            })
            .collect()
    }
}
