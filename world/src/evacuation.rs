//! Evacuation objective: a transport that must be destroyed before its
//! countdown expires.

use keyboard_defence_core::{EnemyId, EvacuationSnapshot};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EvacuationState {
    pub(crate) enemy: EnemyId,
    pub(crate) lane: u32,
    remaining: f64,
}

impl EvacuationState {
    pub(crate) fn new(enemy: EnemyId, lane: u32, countdown: f64) -> Self {
        Self {
            enemy,
            lane,
            remaining: countdown.max(0.0),
        }
    }

    /// Counts down; returns `true` once the countdown has expired.
    pub(crate) fn tick(&mut self, dt: f64) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.remaining <= 0.0
    }

    pub(crate) fn snapshot(&self) -> EvacuationSnapshot {
        EvacuationSnapshot {
            enemy: self.enemy,
            lane: self.lane,
            remaining: self.remaining,
        }
    }
}
