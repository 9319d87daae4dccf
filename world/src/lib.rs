#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Keyboard Defence.
//!
//! The [`World`] owns every piece of mutable simulation state, including the
//! only generator instance. Time moves forward exclusively through
//! [`World::advance`], which runs the subsystems in a fixed order; commands
//! run between ticks and either mutate state and emit events or fail with a
//! [`CommandError`] without touching anything.

mod boss;
mod enemies;
mod evacuation;
mod hazards;
mod structure;
mod turrets;
mod words;

use keyboard_defence_core::{
    config::{ConfigError, GameConfig, HazardDefinition},
    AffixEffect, AffixKind, BoostParams, Command, CommandError, CommandOutcome, DamageSource,
    EnemyId, EnemyView, Event, GameMode, InputOutcome, Passive, RngState, Seed, SessionAnalytics,
    SessionStatus, SlotId, SpawnKind, SpawnOptions, TargetPriority, TierId, TurretKindId,
    WELCOME_BANNER,
};
use keyboard_defence_system_turret_targeting::{self as targeting, ReadyTurret, TurretTargeting};
use keyboard_defence_system_typing::{self as typing, ComboSignal, TypingState};
use keyboard_defence_system_wave_scheduling::{EvacuationSchedule, WavePlan, WaveScheduler};
use tracing::{debug, info};

use crate::{
    boss::BossState,
    enemies::{Enemy, EnemyRoster},
    evacuation::EvacuationState,
    hazards::{ActiveHazard, SupportBoost},
    structure::Structure,
    turrets::{Turret, TurretRegistry},
};

const LOG_WAVES: &str = "keyboard_defence::waves";
const LOG_COMBAT: &str = "keyboard_defence::combat";
const LOG_SESSION: &str = "keyboard_defence::session";

#[derive(Clone, Debug)]
struct WaveProgress {
    index: u32,
    cycle: u32,
    countdown: f64,
    elapsed: f64,
    /// Present while a wave is in progress.
    plan: Option<WavePlan>,
    pending_hazards: Vec<HazardDefinition>,
}

/// Represents the authoritative Keyboard Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    rng: RngState,
    time: f64,
    status: SessionStatus,
    mode: GameMode,
    waves: WaveProgress,
    scheduler: WaveScheduler,
    structure: Structure,
    currency: u32,
    score: u64,
    turrets: TurretRegistry,
    enemies: EnemyRoster,
    typing: TypingState,
    targeting: TurretTargeting,
    boss: Option<BossState>,
    evacuation: Option<EvacuationState>,
    hazards: Vec<ActiveHazard>,
    boost: SupportBoost,
    lane_focus: Option<u32>,
    analytics: SessionAnalytics,
    mistake_limit_reached: bool,
}

impl World {
    /// Creates a world from a validated configuration and seed.
    pub fn new(config: GameConfig, seed: Seed) -> Result<Self, ConfigError> {
        config.validate()?;
        let waves = WaveProgress {
            index: 0,
            cycle: 0,
            countdown: config.first_wave_delay.max(0.0),
            elapsed: 0.0,
            plan: None,
            pending_hazards: Vec::new(),
        };
        Ok(Self {
            banner: WELCOME_BANNER,
            rng: seed.to_state(),
            time: 0.0,
            status: SessionStatus::Running,
            mode: GameMode::Campaign,
            waves,
            scheduler: WaveScheduler::new(&config),
            structure: Structure::new(&config.structure),
            currency: config.starting_currency,
            score: 0,
            turrets: TurretRegistry::new(&config.slots),
            enemies: EnemyRoster::new(),
            typing: TypingState::new(),
            targeting: TurretTargeting::new(),
            boss: None,
            evacuation: None,
            hazards: Vec::new(),
            boost: SupportBoost::default(),
            lane_focus: None,
            analytics: SessionAnalytics::default(),
            mistake_limit_reached: false,
            config,
        })
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Negative or non-finite deltas are treated as zero. Does nothing while
    /// paused or after the session ended.
    pub fn advance(&mut self, dt: f64, out: &mut Vec<Event>) {
        if self.status != SessionStatus::Running {
            return;
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.time += dt;
        out.push(Event::TimeAdvanced { dt });

        self.advance_clocks(dt, out);
        self.release_due_spawns(out);
        self.move_enemies(dt, out);
        if self.status.is_over() {
            return;
        }
        self.fire_turrets(dt, out);
        self.resolve_projectiles(dt, out);
        self.decay_combo(dt, out);
        self.update_side_events(dt, out);
        self.check_wave_completion(out);
        self.structure.tick(dt);
    }

    /// Spawns an enemy outside of the wave schedule.
    ///
    /// Returns `None` for an unknown tier, an invalid or full lane, or when
    /// the session does not accept commands.
    pub fn spawn_enemy(
        &mut self,
        tier: &TierId,
        lane: u32,
        options: SpawnOptions,
        out: &mut Vec<Event>,
    ) -> Option<EnemyId> {
        self.admit().ok()?;
        self.spawn(
            tier,
            lane,
            SpawnKind::Manual,
            options.shield,
            &options.affixes,
            out,
        )
    }

    /// Installs a turret of `kind` into an empty, unlocked slot.
    pub fn place_turret(
        &mut self,
        slot: SlotId,
        kind: &TurretKindId,
        out: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        self.admit()?;
        let target = self
            .turrets
            .slot(slot)
            .ok_or(CommandError::UnknownSlot { slot })?;
        if !target.unlocked {
            return Err(CommandError::SlotLocked { slot });
        }
        if target.turret.is_some() {
            return Err(CommandError::SlotOccupied { slot });
        }
        let cost = self
            .config
            .turret(kind)
            .ok_or_else(|| CommandError::UnknownTurretKind { kind: kind.clone() })?
            .levels
            .first()
            .map_or(0, |level| level.cost);
        self.spend(cost)?;

        if let Some(target) = self.turrets.slot_mut(slot) {
            target.turret = Some(Turret {
                kind: kind.clone(),
                level: 0,
                cooldown: 0.0,
            });
        }
        out.push(Event::TurretPlaced {
            slot,
            kind: kind.clone(),
        });
        Ok(())
    }

    /// Raises the level of the turret installed in `slot`.
    pub fn upgrade_turret(&mut self, slot: SlotId, out: &mut Vec<Event>) -> Result<(), CommandError> {
        self.admit()?;
        let target = self
            .turrets
            .slot(slot)
            .ok_or(CommandError::UnknownSlot { slot })?;
        let turret = target
            .turret
            .as_ref()
            .ok_or(CommandError::SlotEmpty { slot })?;
        let next_level = turret.level + 1;
        let cost = self
            .config
            .turret(&turret.kind)
            .ok_or_else(|| CommandError::UnknownTurretKind {
                kind: turret.kind.clone(),
            })?
            .levels
            .get(next_level)
            .ok_or(CommandError::TurretAtMaxLevel { slot })?
            .cost;
        self.spend(cost)?;

        if let Some(turret) = self
            .turrets
            .slot_mut(slot)
            .and_then(|target| target.turret.as_mut())
        {
            turret.level = next_level;
        }
        out.push(Event::TurretUpgraded {
            slot,
            level: u32::try_from(next_level + 1).unwrap_or(u32::MAX),
        });
        Ok(())
    }

    /// Changes how the turret in `slot` picks its targets.
    pub fn set_target_priority(
        &mut self,
        slot: SlotId,
        priority: TargetPriority,
        out: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        self.admit()?;
        let target = self
            .turrets
            .slot_mut(slot)
            .ok_or(CommandError::UnknownSlot { slot })?;
        target.priority = priority;
        out.push(Event::TargetPriorityChanged { slot, priority });
        Ok(())
    }

    /// Raises the structure to its next level.
    pub fn upgrade_structure(&mut self, out: &mut Vec<Event>) -> Result<(), CommandError> {
        self.admit()?;
        let before = self.currency;
        let upgrade = self
            .structure
            .upgrade(&mut self.currency, &self.config.structure)?;
        self.analytics.currency_spent += u64::from(before - self.currency);
        out.push(Event::StructureUpgraded {
            level: upgrade.level,
        });

        if let Some(passive) = upgrade.passive {
            out.push(Event::PassiveUnlocked { passive });
            if passive == Passive::Arsenal {
                for slot in self.turrets.unlock_where(|_| true) {
                    out.push(Event::SlotUnlocked { slot });
                }
            }
        }
        Ok(())
    }

    /// Restores structure health for currency.
    pub fn repair_structure(&mut self, out: &mut Vec<Event>) -> Result<(), CommandError> {
        self.admit()?;
        let repair = self
            .structure
            .repair(&mut self.currency, &self.config.structure)?;
        self.analytics.currency_spent += u64::from(repair.cost);
        out.push(Event::StructureRepaired {
            amount: repair.amount,
            cost: repair.cost,
        });
        Ok(())
    }

    /// Feeds one typed character to the typing system.
    pub fn input_character(
        &mut self,
        character: char,
        out: &mut Vec<Event>,
    ) -> Result<InputOutcome, CommandError> {
        self.admit()?;
        let view = self.enemy_view();
        let outcome =
            self.typing
                .input_character(character, &view, self.lane_focus, &self.config.typing);

        match &outcome {
            InputOutcome::Completed { enemy, word } => {
                let length = word.chars().count() as f64;
                let damage = self.config.typing.damage_per_character * length
                    + self.config.typing.completion_bonus;
                self.analytics.words_completed += 1;
                out.push(Event::WordCompleted {
                    enemy: *enemy,
                    word: word.clone(),
                    damage,
                });
                self.damage_enemy(*enemy, damage, DamageSource::Typing, out);
            }
            InputOutcome::Mismatch { expected } => {
                out.push(Event::TypingError {
                    expected: *expected,
                    received: typing::normalize(character).unwrap_or(character),
                });
                self.check_mistake_limit(out);
            }
            InputOutcome::Ignored | InputOutcome::Progress { .. } => {}
        }
        Ok(outcome)
    }

    /// Removes the last typed character.
    pub fn backspace(&mut self) -> Result<(), CommandError> {
        self.admit()?;
        self.typing.backspace();
        Ok(())
    }

    /// Clears the typing buffer and releases the target.
    pub fn purge_buffer(&mut self) -> Result<(), CommandError> {
        self.admit()?;
        self.typing.purge();
        Ok(())
    }

    /// Restores a lost combo, returning the resulting combo.
    pub fn recover_combo(&mut self, amount: u32, out: &mut Vec<Event>) -> Result<u32, CommandError> {
        self.admit()?;
        let combo = self.typing.recover_combo(amount, &self.config.typing);
        out.push(Event::ComboRecovered { combo });
        Ok(combo)
    }

    /// Switches between campaign and practice. Accepted while paused.
    pub fn set_mode(&mut self, mode: GameMode, out: &mut Vec<Event>) -> Result<(), CommandError> {
        if self.status.is_over() {
            return Err(CommandError::SessionOver);
        }
        self.mode = mode;
        out.push(Event::ModeChanged { mode });
        Ok(())
    }

    /// Sets or clears the lane preferred when binding typing targets.
    pub fn set_lane_focus(
        &mut self,
        lane: Option<u32>,
        out: &mut Vec<Event>,
    ) -> Result<(), CommandError> {
        self.admit()?;
        if let Some(lane) = lane {
            self.check_lane(lane)?;
        }
        self.lane_focus = lane;
        out.push(Event::LaneFocusChanged { lane });
        Ok(())
    }

    /// Boosts turret fire rate in `lane`, returning whether it was accepted.
    pub fn activate_support_boost(
        &mut self,
        lane: u32,
        params: BoostParams,
        out: &mut Vec<Event>,
    ) -> bool {
        if self.status != SessionStatus::Running || self.check_lane(lane).is_err() {
            return false;
        }
        let Some((multiplier, duration)) = self.boost.activate(lane, params, &self.config.boost)
        else {
            debug!(target: LOG_COMBAT, lane, "support_boost.refused");
            return false;
        };
        self.analytics.boosts_activated += 1;
        out.push(Event::SupportBoostActivated {
            lane,
            multiplier,
            duration,
        });
        true
    }

    /// Freezes simulation time.
    pub fn pause(&mut self, out: &mut Vec<Event>) -> Result<(), CommandError> {
        self.admit()?;
        self.set_status(SessionStatus::Paused, out);
        Ok(())
    }

    /// Resumes simulation time.
    pub fn resume(&mut self, out: &mut Vec<Event>) -> Result<(), CommandError> {
        if self.status.is_over() {
            return Err(CommandError::SessionOver);
        }
        self.set_status(SessionStatus::Running, out);
        Ok(())
    }

    /// Ends the current wave immediately, clearing live enemies and pending
    /// spawns. A live evacuation transport counts as lost. Between waves the
    /// intermission is cut short instead.
    pub fn skip_wave(&mut self, out: &mut Vec<Event>) -> Result<(), CommandError> {
        self.admit()?;
        let Some(plan) = self.waves.plan.as_mut() else {
            self.waves.countdown = 0.0;
            return Ok(());
        };
        plan.clear_pending();

        self.fail_evacuation(out);
        let cleared = self.enemies.clear();
        self.analytics.enemies_cleared += u32::try_from(cleared).unwrap_or(u32::MAX);
        self.typing.purge();
        self.turrets.clear_projectiles();
        self.complete_wave(true, out);
        Ok(())
    }

    fn admit(&self) -> Result<(), CommandError> {
        match self.status {
            SessionStatus::Running => Ok(()),
            SessionStatus::Paused => Err(CommandError::Paused),
            SessionStatus::Victory | SessionStatus::Defeat => Err(CommandError::SessionOver),
        }
    }

    fn check_lane(&self, lane: u32) -> Result<(), CommandError> {
        if lane >= self.config.lanes {
            return Err(CommandError::InvalidLane { lane });
        }
        Ok(())
    }

    fn set_status(&mut self, status: SessionStatus, out: &mut Vec<Event>) {
        if self.status == status {
            return;
        }
        self.status = status;
        info!(target: LOG_SESSION, ?status, time = self.time, "session.status_changed");
        out.push(Event::StatusChanged { status });
    }

    fn spend(&mut self, cost: u32) -> Result<(), CommandError> {
        if self.currency < cost {
            return Err(CommandError::InsufficientCurrency {
                required: cost,
                available: self.currency,
            });
        }
        self.currency -= cost;
        self.analytics.currency_spent += u64::from(cost);
        Ok(())
    }

    fn earn(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
        self.analytics.currency_earned += u64::from(amount);
    }

    fn advance_clocks(&mut self, dt: f64, out: &mut Vec<Event>) {
        if self.waves.plan.is_some() {
            self.waves.elapsed += dt;
        } else if !self.config.waves.is_empty() {
            self.waves.countdown -= dt;
            if self.waves.countdown <= 0.0 {
                self.start_wave(out);
            }
        }
        self.activate_hazards(out);
    }

    fn start_wave(&mut self, out: &mut Vec<Event>) {
        let index = self.waves.index;
        let Some(definition) = self.config.waves.get(index as usize) else {
            return;
        };
        let plan = self.scheduler.plan(index, definition, &mut self.rng);
        self.waves.pending_hazards = definition.hazards.clone();
        self.waves.countdown = 0.0;
        self.waves.elapsed = 0.0;

        info!(
            target: LOG_WAVES,
            wave = index,
            cycle = self.waves.cycle,
            planned = plan.len(),
            "wave.started"
        );
        out.push(Event::WaveStarted { wave: index });

        for slot in self
            .turrets
            .unlock_where(|slot| slot.unlock_wave.is_some_and(|wave| wave <= index))
        {
            out.push(Event::SlotUnlocked { slot });
        }

        if plan.evacuation() == EvacuationSchedule::Skipped {
            self.skip_evacuation(index, out);
        }
        self.waves.plan = Some(plan);
    }

    fn skip_evacuation(&mut self, wave: u32, out: &mut Vec<Event>) {
        self.analytics.evacuations_skipped += 1;
        debug!(target: LOG_WAVES, wave, "evacuation.skipped");
        out.push(Event::EvacuationSkipped { wave });
    }

    fn activate_hazards(&mut self, out: &mut Vec<Event>) {
        if self.waves.plan.is_none() || self.waves.pending_hazards.is_empty() {
            return;
        }
        let elapsed = self.waves.elapsed;
        let (due, pending): (Vec<HazardDefinition>, Vec<HazardDefinition>) =
            std::mem::take(&mut self.waves.pending_hazards)
                .into_iter()
                .partition(|hazard| hazard.start <= elapsed);
        self.waves.pending_hazards = pending;
        for hazard in due {
            self.hazards.push(ActiveHazard::start(&hazard));
            out.push(Event::HazardStarted { lane: hazard.lane });
        }
    }

    fn release_due_spawns(&mut self, out: &mut Vec<Event>) {
        let elapsed = self.waves.elapsed;
        let Some(plan) = self.waves.plan.as_mut() else {
            return;
        };
        let mut due = Vec::new();
        plan.drain_due(elapsed, &mut due);
        let wave = plan.wave();
        let countdown = match plan.evacuation() {
            EvacuationSchedule::Planned(evacuation) => evacuation.countdown,
            EvacuationSchedule::None | EvacuationSchedule::Skipped => 0.0,
        };

        for entry in due {
            let spawned = self.spawn(
                &entry.tier,
                entry.lane,
                entry.kind,
                entry.shield,
                &entry.affixes,
                out,
            );
            if entry.kind != SpawnKind::Evacuation {
                continue;
            }
            match spawned {
                Some(enemy) => {
                    self.evacuation = Some(EvacuationState::new(enemy, entry.lane, countdown));
                    info!(target: LOG_WAVES, wave, lane = entry.lane, "evacuation.started");
                    out.push(Event::EvacuationStarted {
                        enemy,
                        lane: entry.lane,
                        countdown,
                    });
                }
                None => self.skip_evacuation(wave, out),
            }
        }
    }

    fn spawn(
        &mut self,
        tier_id: &TierId,
        lane: u32,
        kind: SpawnKind,
        shield: Option<f64>,
        hints: &[AffixKind],
        out: &mut Vec<Event>,
    ) -> Option<EnemyId> {
        let Some(tier) = self.config.tier(tier_id).cloned() else {
            self.drop_spawn(tier_id, lane, "unknown tier");
            return None;
        };
        if lane >= self.config.lanes {
            self.drop_spawn(tier_id, lane, "invalid lane");
            return None;
        }
        let capacity = self.config.lane_capacity as usize;
        if self.enemies.in_lane(lane).count() >= capacity {
            self.drop_spawn(tier_id, lane, "lane full");
            return None;
        }

        let transport = kind == SpawnKind::Evacuation || tier.id == self.config.evacuation.tier;
        let base_shield = shield.unwrap_or(tier.shield).max(0.0);
        let affixes = if !hints.is_empty() {
            words::hinted_affixes(&self.config.affixes, hints)
        } else if self.config.features.elite_affixes && !tier.boss && !transport {
            words::roll_affixes(&mut self.rng, &self.config.affixes, base_shield > 0.0)
        } else {
            Vec::new()
        };

        let bonus = match &self.waves.plan {
            Some(_) => self
                .config
                .waves
                .get(self.waves.index as usize)
                .map(|wave| wave.bonus_vocabulary.as_slice())
                .unwrap_or_default(),
            None => &[],
        };
        let initials: Vec<char> = self
            .enemies
            .iter()
            .filter_map(|enemy| enemy.word.chars().next())
            .collect();
        let bias = self.typing.difficulty_bias(&self.config.typing);
        let word = words::pick_word(
            &mut self.rng,
            &tier,
            bonus,
            &initials,
            &self.config.words,
            bias,
        );

        let bonus_shield: f64 = affixes
            .iter()
            .filter_map(|affix| match affix.effect {
                AffixEffect::BonusShield { amount } => Some(amount.max(0.0)),
                _ => None,
            })
            .sum();
        let shield = base_shield + bonus_shield;

        let id = self.enemies.allocate();
        out.push(Event::EnemySpawned {
            enemy: id,
            tier: tier.id.clone(),
            lane,
            word: word.clone(),
            kind,
            affixes: affixes.iter().map(|affix| affix.kind).collect(),
        });
        self.enemies.insert(Enemy {
            id,
            tier: tier.id.clone(),
            lane,
            distance: 0.0,
            speed: tier.speed.max(0.0),
            health: tier.health,
            max_health: tier.health,
            shield,
            max_shield: shield,
            word,
            affixes,
            spawned_at: self.time,
            wave: self.waves.index,
            kind,
        });
        self.analytics.enemies_spawned += 1;

        if tier.boss && self.config.features.boss_mechanics && self.boss.is_none() {
            self.boss = Some(BossState::new(id, lane, &self.config.boss));
            info!(target: LOG_COMBAT, enemy = id.get(), tier = %tier.id, lane, "boss.intro");
            out.push(Event::BossIntro {
                enemy: id,
                tier: tier.id,
            });
        }
        Some(id)
    }

    fn drop_spawn(&mut self, tier: &TierId, lane: u32, reason: &'static str) {
        self.analytics.spawns_dropped += 1;
        debug!(target: LOG_WAVES, %tier, lane, reason, "spawn.dropped");
    }

    fn lane_speed_multiplier(&self, lane: u32) -> f64 {
        let hazards = self
            .hazards
            .iter()
            .filter(|hazard| hazard.lane == lane)
            .map(|hazard| hazard.speed_multiplier);
        let shockwave = self
            .boss
            .and_then(|boss| boss.shockwave(lane, &self.config.boss))
            .map(|(_, speed)| speed);
        let auras = self.enemies.in_lane(lane).flat_map(Enemy::aura_speed);
        hazards
            .chain(shockwave)
            .chain(auras)
            .fold(1.0, |total, factor| total * factor)
            .max(0.0)
    }

    fn lane_fire_sources(&self, lane: u32) -> Vec<f64> {
        let hazards = self
            .hazards
            .iter()
            .filter(|hazard| hazard.lane == lane)
            .map(|hazard| hazard.fire_rate_multiplier);
        let shockwave = self
            .boss
            .and_then(|boss| boss.shockwave(lane, &self.config.boss))
            .map(|(fire_rate, _)| fire_rate);
        let auras = self.enemies.in_lane(lane).flat_map(Enemy::aura_fire_rate);
        hazards.chain(shockwave).chain(auras).collect()
    }

    fn move_enemies(&mut self, dt: f64, out: &mut Vec<Event>) {
        if self.enemies.is_empty() {
            return;
        }
        let multipliers: Vec<f64> = (0..self.config.lanes)
            .map(|lane| self.lane_speed_multiplier(lane))
            .collect();

        let mut breached = Vec::new();
        for enemy in self.enemies.iter_mut() {
            let multiplier = multipliers
                .get(enemy.lane as usize)
                .copied()
                .unwrap_or(1.0);
            enemy.distance = (enemy.distance + enemy.speed * multiplier * dt).min(1.0);
            if enemy.distance >= 1.0 {
                breached.push(enemy.id);
            }
        }

        for id in breached {
            self.breach(id, out);
            if self.status.is_over() {
                return;
            }
        }
    }

    fn breach(&mut self, id: EnemyId, out: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(id) else {
            return;
        };
        let raw = self
            .config
            .tier(&enemy.tier)
            .map_or(0.0, |tier| tier.breach_damage);
        let damage = match self.mode {
            GameMode::Campaign => self.structure.breach_damage(raw),
            GameMode::Practice => 0.0,
        };
        self.structure.take_damage(damage);
        self.analytics.breaches += 1;
        self.analytics.structure_damage += damage;
        debug!(target: LOG_COMBAT, enemy = id.get(), lane = enemy.lane, damage, "enemy.breached");
        out.push(Event::EnemyBreached {
            enemy: id,
            tier: enemy.tier,
            lane: enemy.lane,
            damage,
        });

        self.forget_enemy(id);
        if self.evacuation.is_some_and(|evacuation| evacuation.enemy == id) {
            self.fail_evacuation(out);
        }
        if self.mode == GameMode::Campaign && self.structure.is_destroyed() {
            self.set_status(SessionStatus::Defeat, out);
        }
    }

    fn fire_turrets(&mut self, dt: f64, out: &mut Vec<Event>) {
        let mut ready = Vec::new();
        for slot in self.turrets.slots_mut() {
            let Some(turret) = slot.turret.as_mut() else {
                continue;
            };
            turret.cooldown = (turret.cooldown - dt).max(0.0);
            if slot.unlocked && turret.cooldown <= 0.0 {
                ready.push(ReadyTurret {
                    slot: slot.id,
                    lane: slot.lane,
                    priority: slot.priority,
                });
            }
        }
        if ready.is_empty() || self.enemies.is_empty() {
            return;
        }

        let view = self.enemy_view();
        let mut targets = Vec::new();
        self.targeting.handle(&ready, &view, &mut targets);

        let support = targeting::typing_support_multiplier(
            self.typing.combo(),
            self.typing.recent_accuracy(),
            &self.config.support,
        );
        for target in targets {
            let Some((lane, kind, level)) = self.turrets.slot(target.slot).and_then(|slot| {
                slot.turret
                    .as_ref()
                    .map(|turret| (slot.lane, turret.kind.clone(), turret.level))
            }) else {
                continue;
            };
            let Some(stats) = self
                .config
                .turret(&kind)
                .and_then(|archetype| archetype.levels.get(level))
                .copied()
            else {
                continue;
            };

            let fire_rate = targeting::lane_fire_rate(self.lane_fire_sources(lane));
            let cooldown = targeting::cooldown_after_fire(
                stats.cooldown,
                fire_rate,
                support,
                self.boost.multiplier(lane),
            );
            if let Some(turret) = self
                .turrets
                .slot_mut(target.slot)
                .and_then(|slot| slot.turret.as_mut())
            {
                turret.cooldown = cooldown;
            }

            let projectile = self.turrets.launch(
                target.slot,
                lane,
                target.enemy,
                stats.damage,
                self.config.projectile_flight_time,
            );
            self.analytics.projectiles_fired += 1;
            out.push(Event::ProjectileFired {
                projectile,
                slot: target.slot,
                enemy: target.enemy,
            });
        }
    }

    fn resolve_projectiles(&mut self, dt: f64, out: &mut Vec<Event>) {
        let projectiles = self.turrets.take_projectiles();
        let mut in_flight = Vec::with_capacity(projectiles.len());
        for mut projectile in projectiles {
            if self.enemies.get(projectile.target).is_none() {
                self.analytics.projectiles_lost += 1;
                continue;
            }
            projectile.remaining -= dt;
            if projectile.remaining > 0.0 {
                in_flight.push(projectile);
                continue;
            }
            self.damage_enemy(projectile.target, projectile.damage, DamageSource::Turret, out);
        }
        self.turrets.restore(in_flight);
    }

    fn damage_enemy(&mut self, id: EnemyId, amount: f64, source: DamageSource, out: &mut Vec<Event>) {
        let multiplier = match (source, &self.boss) {
            (DamageSource::Turret, Some(boss)) => boss.turret_multiplier(id, &self.config.boss),
            _ => 1.0,
        };
        let Some(enemy) = self.enemies.get_mut(id) else {
            return;
        };
        let report = enemy.take_damage(amount, source, multiplier);
        let dealt = report.shield + report.health;
        match source {
            DamageSource::Typing => self.analytics.typing_damage += dealt,
            DamageSource::Turret => self.analytics.turret_damage += dealt,
        }
        out.push(Event::EnemyDamaged {
            enemy: id,
            source,
            shield_damage: report.shield,
            health_damage: report.health,
        });
        if report.defeated {
            self.defeat_enemy(id, source, out);
        }
    }

    fn defeat_enemy(&mut self, id: EnemyId, source: DamageSource, out: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(id) else {
            return;
        };
        let base = self.config.tier(&enemy.tier).map_or(0, |tier| tier.reward);
        let reward = (f64::from(base) * self.structure.bounty()).round() as u32;
        self.earn(reward);
        self.score = self
            .score
            .saturating_add(u64::from(base) + u64::from(self.typing.combo()));
        match source {
            DamageSource::Typing => self.analytics.typing_kills += 1,
            DamageSource::Turret => self.analytics.turret_kills += 1,
        }
        out.push(Event::EnemyDefeated {
            enemy: id,
            tier: enemy.tier.clone(),
            lane: enemy.lane,
            source,
            reward,
        });

        if self.boss.is_some_and(|boss| boss.enemy == id) {
            self.analytics.bosses_defeated += 1;
            info!(target: LOG_COMBAT, enemy = id.get(), tier = %enemy.tier, "boss.defeated");
        }
        self.forget_enemy(id);
        if self.evacuation.is_some_and(|evacuation| evacuation.enemy == id) {
            self.succeed_evacuation(out);
        }
    }

    /// Drops every reference other subsystems hold to a removed enemy.
    fn forget_enemy(&mut self, id: EnemyId) {
        self.typing.release_target(id);
        if self.boss.is_some_and(|boss| boss.enemy == id) {
            self.boss = None;
        }
    }

    fn succeed_evacuation(&mut self, out: &mut Vec<Event>) {
        if self.evacuation.take().is_none() {
            return;
        }
        let reward = self.config.evacuation.reward;
        self.earn(reward);
        self.analytics.evacuations_succeeded += 1;
        info!(target: LOG_WAVES, reward, "evacuation.succeeded");
        out.push(Event::EvacuationSucceeded { reward });
    }

    fn fail_evacuation(&mut self, out: &mut Vec<Event>) {
        let Some(evacuation) = self.evacuation.take() else {
            return;
        };
        if self.enemies.remove(evacuation.enemy).is_some() {
            self.forget_enemy(evacuation.enemy);
        }
        let penalty = self.config.evacuation.penalty.min(self.currency);
        self.currency -= penalty;
        self.analytics.currency_spent += u64::from(penalty);
        self.analytics.evacuations_failed += 1;
        info!(target: LOG_WAVES, penalty, "evacuation.failed");
        out.push(Event::EvacuationFailed { penalty });
    }

    fn decay_combo(&mut self, dt: f64, out: &mut Vec<Event>) {
        let mut signals = Vec::new();
        self.typing
            .decay(dt, self.time, &self.config.typing, &mut signals);
        for signal in signals {
            match signal {
                ComboSignal::Warning { combo } => out.push(Event::ComboWarning { combo }),
                ComboSignal::Lost(delta) => {
                    self.analytics.combo_warning_deltas.push(delta);
                    out.push(Event::ComboWarningDelta { delta });
                }
            }
        }
    }

    fn check_mistake_limit(&mut self, out: &mut Vec<Event>) {
        if self.mistake_limit_reached || self.mode != GameMode::Campaign {
            return;
        }
        let Some(limit) = self.config.challenge.mistake_limit else {
            return;
        };
        let mistakes = self.typing.errors();
        if mistakes < limit {
            return;
        }
        self.mistake_limit_reached = true;
        out.push(Event::ChallengeMistakeLimitReached { mistakes });
        self.set_status(SessionStatus::Defeat, out);
    }

    fn update_side_events(&mut self, dt: f64, out: &mut Vec<Event>) {
        if let Some(boss) = self.boss.as_mut() {
            boss.tick(dt, &self.config.boss, out);
        }

        let expired = self
            .evacuation
            .as_mut()
            .is_some_and(|evacuation| evacuation.tick(dt));
        if expired {
            self.fail_evacuation(out);
        }

        let mut ended = Vec::new();
        self.hazards.retain_mut(|hazard| {
            if hazard.tick(dt) {
                ended.push(hazard.lane);
                false
            } else {
                true
            }
        });
        for lane in ended {
            out.push(Event::HazardExpired { lane });
        }

        if let Some(lane) = self.boost.tick(dt) {
            out.push(Event::SupportBoostExpired { lane });
        }
    }

    fn check_wave_completion(&mut self, out: &mut Vec<Event>) {
        let Some(plan) = &self.waves.plan else {
            return;
        };
        let duration = self
            .config
            .waves
            .get(self.waves.index as usize)
            .map_or(0.0, |wave| wave.duration);
        if self.waves.elapsed >= duration && plan.is_exhausted() && self.enemies.is_empty() {
            self.complete_wave(false, out);
        }
    }

    fn complete_wave(&mut self, skipped: bool, out: &mut Vec<Event>) {
        let wave = self.waves.index;
        self.waves.plan = None;
        self.waves.pending_hazards.clear();
        self.waves.elapsed = 0.0;
        self.boss = None;
        for hazard in std::mem::take(&mut self.hazards) {
            out.push(Event::HazardExpired { lane: hazard.lane });
        }

        self.analytics.waves_completed += 1;
        info!(target: LOG_WAVES, wave, skipped, "wave.completed");
        out.push(Event::WaveCompleted { wave, skipped });

        let next = wave + 1;
        if (next as usize) < self.config.waves.len() {
            self.waves.index = next;
            self.waves.countdown = self.config.intermission.max(0.0);
        } else if self.config.features.looping {
            self.waves.index = 0;
            self.waves.cycle += 1;
            self.waves.countdown = self.config.intermission.max(0.0);
        } else {
            self.set_status(SessionStatus::Victory, out);
        }
    }

    fn typed_for(&self, id: EnemyId) -> u32 {
        if self.typing.target() == Some(id) {
            self.typing.typed()
        } else {
            0
        }
    }

    fn enemy_view(&self) -> EnemyView {
        EnemyView::from_snapshots(
            self.enemies
                .iter()
                .map(|enemy| enemy.snapshot(self.typed_for(enemy.id)))
                .collect(),
        )
    }
}

/// Applies the provided command to the world.
///
/// Rejected commands leave the world untouched and are logged at debug level.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<CommandOutcome, CommandError> {
    let result = dispatch(world, command, out_events);
    if let Err(error) = &result {
        debug!(target: LOG_SESSION, %error, time = world.time, "command.rejected");
    }
    result
}

fn dispatch(
    world: &mut World,
    command: Command,
    out: &mut Vec<Event>,
) -> Result<CommandOutcome, CommandError> {
    let applied = |result: Result<(), CommandError>| result.map(|()| CommandOutcome::Applied);
    match command {
        Command::Advance { dt } => {
            if world.status == SessionStatus::Paused {
                return Err(CommandError::Paused);
            }
            world.advance(dt, out);
            Ok(CommandOutcome::Applied)
        }
        Command::SpawnEnemy {
            tier,
            lane,
            options,
        } => {
            world.admit()?;
            let enemy = world.spawn_enemy(&tier, lane, options, out);
            Ok(CommandOutcome::Spawned { enemy })
        }
        Command::PlaceTurret { slot, kind } => applied(world.place_turret(slot, &kind, out)),
        Command::UpgradeTurret { slot } => applied(world.upgrade_turret(slot, out)),
        Command::SetTargetPriority { slot, priority } => {
            applied(world.set_target_priority(slot, priority, out))
        }
        Command::UpgradeStructure => applied(world.upgrade_structure(out)),
        Command::RepairStructure => applied(world.repair_structure(out)),
        Command::InputCharacter { character } => world
            .input_character(character, out)
            .map(|outcome| CommandOutcome::Input { outcome }),
        Command::Backspace => applied(world.backspace()),
        Command::PurgeBuffer => applied(world.purge_buffer()),
        Command::RecoverCombo { amount } => {
            applied(world.recover_combo(amount, out).map(|_| ()))
        }
        Command::SetMode { mode } => applied(world.set_mode(mode, out)),
        Command::SetLaneFocus { lane } => applied(world.set_lane_focus(lane, out)),
        Command::ActivateSupportBoost { lane, params } => {
            world.admit()?;
            let activated = world.activate_support_boost(lane, params, out);
            Ok(CommandOutcome::Boost { activated })
        }
        Command::Pause => applied(world.pause(out)),
        Command::Resume => applied(world.resume(out)),
        Command::SkipWave => applied(world.skip_wave(out)),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use sha2::{Digest, Sha256};

    use super::World;
    use keyboard_defence_core::{
        config::GameConfig, EnemyView, GameMode, SessionAnalytics, SessionStatus, SpawnKind,
        StateSnapshot, TypingSnapshot, UpcomingSpawn, WaveProgressSnapshot,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current session status.
    #[must_use]
    pub fn status(world: &World) -> SessionStatus {
        world.status
    }

    /// Current game mode.
    #[must_use]
    pub fn mode(world: &World) -> GameMode {
        world.mode
    }

    /// Simulation time in seconds.
    #[must_use]
    pub fn time(world: &World) -> f64 {
        world.time
    }

    /// Currency available.
    #[must_use]
    pub fn currency(world: &World) -> u32 {
        world.currency
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        world.enemy_view()
    }

    /// Captures the typing and combo state.
    #[must_use]
    pub fn typing(world: &World) -> TypingSnapshot {
        world.typing.snapshot(&world.config.typing)
    }

    /// Cumulative session counters.
    #[must_use]
    pub fn analytics(world: &World) -> &SessionAnalytics {
        &world.analytics
    }

    /// Previews up to `count` spawns that have not been released yet.
    ///
    /// Between waves only the next wave's static spawns are known, since
    /// dynamic events and evacuations are drawn when the wave starts.
    #[must_use]
    pub fn upcoming_spawns(world: &World, count: usize) -> Vec<UpcomingSpawn> {
        if let Some(plan) = &world.waves.plan {
            return plan.upcoming(count).iter().map(|entry| entry.preview()).collect();
        }
        if world.status.is_over() {
            return Vec::new();
        }
        let Some(definition) = world.config.waves.get(world.waves.index as usize) else {
            return Vec::new();
        };

        let mut preview: Vec<UpcomingSpawn> = definition
            .spawns
            .iter()
            .flat_map(|instruction| {
                (0..instruction.count).map(move |index| UpcomingSpawn {
                    at: instruction.at + instruction.cadence * f64::from(index),
                    lane: instruction.lane,
                    tier: instruction.tier.clone(),
                    kind: SpawnKind::Static,
                })
            })
            .collect();
        preview.sort_by(|left, right| left.at.total_cmp(&right.at));
        preview.truncate(count);
        preview
    }

    /// Captures the complete simulation state.
    #[must_use]
    pub fn snapshot(world: &World) -> StateSnapshot {
        StateSnapshot {
            time: world.time,
            status: world.status,
            mode: world.mode,
            wave: WaveProgressSnapshot {
                index: world.waves.index,
                cycle: world.waves.cycle,
                active: world.waves.plan.is_some(),
                countdown: world.waves.countdown,
                elapsed: world.waves.elapsed,
                total: u32::try_from(world.config.waves.len()).unwrap_or(u32::MAX),
            },
            structure: world.structure.snapshot(),
            currency: world.currency,
            score: world.score,
            slots: world.turrets.slot_snapshots(),
            enemies: world.enemy_view().into_vec(),
            projectiles: world.turrets.projectile_snapshots(),
            typing: world.typing.snapshot(&world.config.typing),
            boss: world.boss.map(|boss| boss.snapshot()),
            evacuation: world.evacuation.map(|evacuation| evacuation.snapshot()),
            hazards: world.hazards.iter().map(|hazard| hazard.snapshot()).collect(),
            support_boost: world.boost.snapshot(),
            lane_focus: world.lane_focus,
            analytics: world.analytics.clone(),
            rng_state: world.rng.get(),
        }
    }

    /// SHA-256 over the bincode encoding of [`snapshot`], as lowercase hex.
    pub fn fingerprint(world: &World) -> Result<String, bincode::Error> {
        let bytes = bincode::serialize(&snapshot(world))?;
        let digest = Sha256::digest(&bytes);
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }
}
