#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns wave definitions into ordered spawn plans.
//!
//! A plan is built once when a wave starts. Static spawn instructions are
//! expanded first, then dynamic events and the evacuation objective are drawn
//! from the shared generator. Randomness is consumed in a fixed order: the
//! dynamic event count, then time, lane and tier for each event, then the
//! evacuation time and finally the evacuation lane.

use std::cmp::Ordering;

use keyboard_defence_core::{
    config::{EvacuationConfig, FeatureToggles, GameConfig, HazardDefinition, WaveDefinition},
    AffixKind, RngState, SpawnKind, TierId, UpcomingSpawn,
};

/// A single entry of a wave plan.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedSpawn {
    /// Seconds into the wave at which the spawn is released.
    pub at: f64,
    /// Tie-breaking key; ascending in planning order.
    pub order: u32,
    /// Lane the enemy enters.
    pub lane: u32,
    /// Tier of the enemy.
    pub tier: TierId,
    /// Origin of the spawn.
    pub kind: SpawnKind,
    /// Shield override.
    pub shield: Option<f64>,
    /// Affixes applied instead of rolling.
    pub affixes: Vec<AffixKind>,
}

impl PlannedSpawn {
    fn precedes(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.order.cmp(&other.order))
    }

    /// Converts the entry into its public preview form.
    #[must_use]
    pub fn preview(&self) -> UpcomingSpawn {
        UpcomingSpawn {
            at: self.at,
            lane: self.lane,
            tier: self.tier.clone(),
            kind: self.kind,
        }
    }
}

/// Evacuation objective planned for a wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvacuationPlan {
    /// Seconds into the wave at which the transport spawns.
    pub at: f64,
    /// Lane reserved for the transport.
    pub lane: u32,
    /// Seconds the player has to destroy the transport.
    pub countdown: f64,
}

/// Outcome of evacuation planning for a wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EvacuationSchedule {
    /// The wave carries no evacuation or the feature is disabled.
    None,
    /// A free lane was found.
    Planned(EvacuationPlan),
    /// Every lane was reserved during the objective window.
    Skipped,
}

/// Ordered spawn plan of a single wave.
#[derive(Clone, Debug, PartialEq)]
pub struct WavePlan {
    wave: u32,
    entries: Vec<PlannedSpawn>,
    cursor: usize,
    evacuation: EvacuationSchedule,
}

impl WavePlan {
    /// Index of the planned wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Moves every entry due at `elapsed` into `out`, in ascending
    /// `(time, order)` order.
    pub fn drain_due(&mut self, elapsed: f64, out: &mut Vec<PlannedSpawn>) {
        while let Some(entry) = self.entries.get(self.cursor) {
            if entry.at > elapsed {
                break;
            }
            out.push(entry.clone());
            self.cursor += 1;
        }
    }

    /// Previews up to `count` entries that have not been released yet.
    #[must_use]
    pub fn upcoming(&self, count: usize) -> &[PlannedSpawn] {
        let pending = self.entries.get(self.cursor..).unwrap_or_default();
        &pending[..count.min(pending.len())]
    }

    /// Reports whether every entry has been released.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    /// Drops every pending entry.
    pub fn clear_pending(&mut self) {
        self.cursor = self.entries.len();
    }

    /// Number of planned entries, released ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the plan holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evacuation planning outcome.
    #[must_use]
    pub const fn evacuation(&self) -> EvacuationSchedule {
        self.evacuation
    }
}

/// Scheduler holding the configuration slices needed to plan waves.
#[derive(Clone, Debug)]
pub struct WaveScheduler {
    lanes: u32,
    features: FeatureToggles,
    evacuation: EvacuationConfig,
}

impl WaveScheduler {
    /// Creates a scheduler for the provided configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            lanes: config.lanes,
            features: config.features,
            evacuation: config.evacuation.clone(),
        }
    }

    /// Plans `definition` as wave `wave`, consuming randomness from `rng`.
    pub fn plan(&self, wave: u32, definition: &WaveDefinition, rng: &mut RngState) -> WavePlan {
        let mut entries = Vec::new();
        let mut order = 0u32;

        for instruction in &definition.spawns {
            for index in 0..instruction.count {
                entries.push(PlannedSpawn {
                    at: instruction.at + instruction.cadence * f64::from(index),
                    order,
                    lane: instruction.lane,
                    tier: instruction.tier.clone(),
                    kind: SpawnKind::Static,
                    shield: instruction.shield,
                    affixes: instruction.affixes.clone(),
                });
                order += 1;
            }
        }

        let dynamic_start = entries.len();
        self.plan_dynamic_events(definition, rng, &mut order, &mut entries);

        let evacuation = self.plan_evacuation(definition, &entries[dynamic_start..], rng);
        if let EvacuationSchedule::Planned(plan) = evacuation {
            entries.push(PlannedSpawn {
                at: plan.at,
                order,
                lane: plan.lane,
                tier: self.evacuation.tier.clone(),
                kind: SpawnKind::Evacuation,
                shield: None,
                affixes: Vec::new(),
            });
        }

        entries.sort_by(PlannedSpawn::precedes);

        WavePlan {
            wave,
            entries,
            cursor: 0,
            evacuation,
        }
    }

    fn plan_dynamic_events(
        &self,
        definition: &WaveDefinition,
        rng: &mut RngState,
        order: &mut u32,
        entries: &mut Vec<PlannedSpawn>,
    ) {
        if !self.features.dynamic_spawns {
            return;
        }
        let Some(descriptor) = &definition.dynamic_events else {
            return;
        };
        if descriptor.tiers.is_empty() {
            return;
        }

        let count = rng.next_in_range(
            i64::from(descriptor.min_count),
            i64::from(descriptor.max_count),
        );
        let (start, end) = window(
            descriptor.window_start,
            descriptor.window_end,
            definition.duration,
        );
        for _ in 0..count {
            let at = start + rng.next_float01() * (end - start);
            let lane = self.pick_lane(rng);
            let Some(tier) = rng.pick(&descriptor.tiers) else {
                continue;
            };
            entries.push(PlannedSpawn {
                at,
                order: *order,
                lane,
                tier: tier.clone(),
                kind: SpawnKind::Dynamic,
                shield: None,
                affixes: Vec::new(),
            });
            *order += 1;
        }
    }

    fn plan_evacuation(
        &self,
        definition: &WaveDefinition,
        dynamic: &[PlannedSpawn],
        rng: &mut RngState,
    ) -> EvacuationSchedule {
        if !self.features.evacuation_events {
            return EvacuationSchedule::None;
        }
        let Some(descriptor) = definition.evacuation else {
            return EvacuationSchedule::None;
        };

        let countdown = descriptor.countdown.unwrap_or(self.evacuation.countdown);
        let (start, end) = window(
            descriptor.window_start,
            descriptor.window_end,
            definition.duration,
        );
        let at = start + rng.next_float01() * (end - start);
        let reserved_until = at + countdown;

        let free: Vec<u32> = (0..self.lanes)
            .filter(|lane| {
                !definition
                    .hazards
                    .iter()
                    .any(|hazard| hazard.lane == *lane && overlaps(hazard, at, reserved_until))
            })
            .filter(|lane| {
                !dynamic.iter().any(|event| {
                    event.lane == *lane && event.at >= at && event.at <= reserved_until
                })
            })
            .collect();

        match rng.pick(&free) {
            Some(lane) => EvacuationSchedule::Planned(EvacuationPlan {
                at,
                lane: *lane,
                countdown,
            }),
            None => EvacuationSchedule::Skipped,
        }
    }

    fn pick_lane(&self, rng: &mut RngState) -> u32 {
        let last = i64::from(self.lanes.saturating_sub(1));
        u32::try_from(rng.next_in_range(0, last)).unwrap_or(0)
    }
}

/// Clamps a descriptor window to `[0, duration]`, collapsing inverted windows
/// onto their start.
fn window(start: f64, end: f64, duration: f64) -> (f64, f64) {
    let start = start.max(0.0);
    let end = end.min(duration).max(start);
    (start, end)
}

fn overlaps(hazard: &HazardDefinition, from: f64, until: f64) -> bool {
    hazard.start <= until && hazard.start + hazard.duration >= from
}
