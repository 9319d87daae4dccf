//! Lane-scoped timed modifiers: wave hazards and the support boost.

use keyboard_defence_core::{
    config::{HazardDefinition, SupportBoostConfig},
    BoostParams, HazardSnapshot, SupportBoostSnapshot,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ActiveHazard {
    pub(crate) lane: u32,
    remaining: f64,
    pub(crate) fire_rate_multiplier: f64,
    pub(crate) speed_multiplier: f64,
}

impl ActiveHazard {
    pub(crate) fn start(definition: &HazardDefinition) -> Self {
        Self {
            lane: definition.lane,
            remaining: definition.duration.max(0.0),
            fire_rate_multiplier: definition.fire_rate_multiplier,
            speed_multiplier: definition.speed_multiplier,
        }
    }

    /// Counts down; returns `true` once expired.
    pub(crate) fn tick(&mut self, dt: f64) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }

    pub(crate) fn snapshot(&self) -> HazardSnapshot {
        HazardSnapshot {
            lane: self.lane,
            remaining: self.remaining.max(0.0),
            fire_rate_multiplier: self.fire_rate_multiplier,
            speed_multiplier: self.speed_multiplier,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveBoost {
    lane: u32,
    multiplier: f64,
    remaining: f64,
}

/// Lane-scoped fire-rate boost with a shared cooldown.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SupportBoost {
    active: Option<ActiveBoost>,
    cooldown: f64,
}

impl SupportBoost {
    /// Activates a boost, returning the effective `(multiplier, duration)`.
    ///
    /// Refused while the cooldown runs or when the parameters cannot produce
    /// a boost.
    pub(crate) fn activate(
        &mut self,
        lane: u32,
        params: BoostParams,
        config: &SupportBoostConfig,
    ) -> Option<(f64, f64)> {
        if self.cooldown > 0.0 {
            return None;
        }
        if !params.multiplier.is_finite() || !params.duration.is_finite() {
            return None;
        }
        let duration = params.duration.min(config.max_duration);
        if duration <= 0.0 {
            return None;
        }
        let multiplier = params.multiplier.clamp(1.0, config.max_multiplier.max(1.0));
        self.active = Some(ActiveBoost {
            lane,
            multiplier,
            remaining: duration,
        });
        self.cooldown = config.cooldown.max(0.0);
        Some((multiplier, duration))
    }

    /// Multiplier applied to turrets in `lane`.
    pub(crate) fn multiplier(&self, lane: u32) -> f64 {
        match self.active {
            Some(boost) if boost.lane == lane => boost.multiplier,
            _ => 1.0,
        }
    }

    /// Counts timers down; returns the lane of a boost that just expired.
    pub(crate) fn tick(&mut self, dt: f64) -> Option<u32> {
        self.cooldown = (self.cooldown - dt).max(0.0);
        let boost = self.active.as_mut()?;
        boost.remaining -= dt;
        if boost.remaining > 0.0 {
            return None;
        }
        let lane = boost.lane;
        self.active = None;
        Some(lane)
    }

    pub(crate) fn snapshot(&self) -> SupportBoostSnapshot {
        SupportBoostSnapshot {
            lane: self.active.map(|boost| boost.lane),
            multiplier: self.active.map_or(1.0, |boost| boost.multiplier),
            remaining: self.active.map_or(0.0, |boost| boost.remaining),
            cooldown: self.cooldown,
        }
    }
}
