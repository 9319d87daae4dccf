//! Boss phase state machine.
//!
//! A boss runs two independent windows. Vulnerability multiplies turret damage
//! against the boss; the shockwave slows turrets and enemies in the boss lane.
//! Each window closes after its duration and reopens after its interval.

use keyboard_defence_core::{config::BossConfig, BossPhase, BossSnapshot, EnemyId, Event};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BossState {
    pub(crate) enemy: EnemyId,
    pub(crate) lane: u32,
    vulnerability: PhaseWindow,
    shockwave: PhaseWindow,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PhaseWindow {
    active: bool,
    timer: f64,
}

impl PhaseWindow {
    const fn closed(interval: f64) -> Self {
        Self {
            active: false,
            timer: interval,
        }
    }

    /// Counts the window down, returning the new state when it toggles.
    fn tick(&mut self, dt: f64, interval: f64, duration: f64) -> Option<bool> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.active = !self.active;
        let next = if self.active { duration } else { interval };
        self.timer = next.max(f64::EPSILON);
        Some(self.active)
    }
}

impl BossState {
    pub(crate) fn new(enemy: EnemyId, lane: u32, config: &BossConfig) -> Self {
        Self {
            enemy,
            lane,
            vulnerability: PhaseWindow::closed(config.vulnerability_interval),
            shockwave: PhaseWindow::closed(config.shockwave_interval),
        }
    }

    pub(crate) fn tick(&mut self, dt: f64, config: &BossConfig, out: &mut Vec<Event>) {
        if let Some(active) = self.vulnerability.tick(
            dt,
            config.vulnerability_interval,
            config.vulnerability_duration,
        ) {
            out.push(Event::BossPhaseChanged {
                enemy: self.enemy,
                phase: BossPhase::Vulnerability,
                active,
            });
        }
        if let Some(active) =
            self.shockwave
                .tick(dt, config.shockwave_interval, config.shockwave_duration)
        {
            out.push(Event::BossPhaseChanged {
                enemy: self.enemy,
                phase: BossPhase::Shockwave,
                active,
            });
        }
    }

    /// Turret damage multiplier against `enemy`.
    pub(crate) fn turret_multiplier(&self, enemy: EnemyId, config: &BossConfig) -> f64 {
        if enemy == self.enemy && self.vulnerability.active {
            config.vulnerability_multiplier
        } else {
            1.0
        }
    }

    /// Shockwave multipliers `(fire_rate, speed)` for `lane`, when active.
    pub(crate) fn shockwave(&self, lane: u32, config: &BossConfig) -> Option<(f64, f64)> {
        (self.shockwave.active && lane == self.lane).then_some((
            config.shockwave_fire_rate_multiplier,
            config.shockwave_speed_multiplier,
        ))
    }

    pub(crate) fn snapshot(&self) -> BossSnapshot {
        BossSnapshot {
            enemy: self.enemy,
            lane: self.lane,
            vulnerable: self.vulnerability.active,
            vulnerability_timer: self.vulnerability.timer,
            shockwave: self.shockwave.active,
            shockwave_timer: self.shockwave.timer,
        }
    }
}
