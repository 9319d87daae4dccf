//! Defended structure: health, armor, regeneration, repairs and upgrades.

use keyboard_defence_core::{
    config::StructureConfig, CommandError, Passive, StructureSnapshot,
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Structure {
    health: f64,
    max_health: f64,
    armor: f64,
    regen: f64,
    /// Number of upgrades applied; level one has none.
    upgrades: usize,
    repair_cooldown: f64,
    passives: Vec<Passive>,
}

/// Outcome of a successful repair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Repair {
    pub(crate) amount: f64,
    pub(crate) cost: u32,
}

/// Outcome of a successful upgrade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Upgrade {
    pub(crate) level: u32,
    pub(crate) passive: Option<Passive>,
}

impl Structure {
    pub(crate) fn new(config: &StructureConfig) -> Self {
        let max_health = config.max_health.max(1.0);
        Self {
            health: max_health,
            max_health,
            armor: config.armor.max(0.0),
            regen: config.regen.max(0.0),
            upgrades: 0,
            repair_cooldown: 0.0,
            passives: Vec::new(),
        }
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Breach damage after armor; never below one.
    pub(crate) fn breach_damage(&self, raw: f64) -> f64 {
        (raw - self.armor).max(1.0)
    }

    pub(crate) fn take_damage(&mut self, amount: f64) {
        self.health = (self.health - amount.max(0.0)).clamp(0.0, self.max_health);
    }

    /// Regenerates health and counts the repair cooldown down.
    pub(crate) fn tick(&mut self, dt: f64) {
        if self.health > 0.0 {
            self.health = (self.health + self.regen * dt).min(self.max_health);
        }
        self.repair_cooldown = (self.repair_cooldown - dt).max(0.0);
    }

    pub(crate) fn repair_cost(&self, config: &StructureConfig) -> u32 {
        let factor: f64 = self
            .passives
            .iter()
            .filter_map(|passive| match passive {
                Passive::RepairDiscount { factor } => Some(factor.max(0.0)),
                _ => None,
            })
            .product();
        (f64::from(config.repair.cost) * factor).round() as u32
    }

    /// Currency multiplier applied to enemy rewards.
    pub(crate) fn bounty(&self) -> f64 {
        self.passives
            .iter()
            .filter_map(|passive| match passive {
                Passive::Bounty { multiplier } => Some(multiplier.max(0.0)),
                _ => None,
            })
            .product()
    }

    /// Validates and performs a repair, spending from `currency`.
    pub(crate) fn repair(
        &mut self,
        currency: &mut u32,
        config: &StructureConfig,
    ) -> Result<Repair, CommandError> {
        if self.repair_cooldown > 0.0 {
            return Err(CommandError::RepairCoolingDown {
                remaining: self.repair_cooldown,
            });
        }
        if self.health >= self.max_health {
            return Err(CommandError::FullHealth);
        }
        let cost = self.repair_cost(config);
        if *currency < cost {
            return Err(CommandError::InsufficientCurrency {
                required: cost,
                available: *currency,
            });
        }

        *currency -= cost;
        let amount = config.repair.amount.max(0.0).min(self.max_health - self.health);
        self.health += amount;
        self.repair_cooldown = config.repair.cooldown.max(0.0);
        Ok(Repair { amount, cost })
    }

    /// Validates and applies the next level of the upgrade table.
    pub(crate) fn upgrade(
        &mut self,
        currency: &mut u32,
        config: &StructureConfig,
    ) -> Result<Upgrade, CommandError> {
        let Some(next) = config.levels.get(self.upgrades) else {
            return Err(CommandError::StructureAtMaxLevel);
        };
        if *currency < next.cost {
            return Err(CommandError::InsufficientCurrency {
                required: next.cost,
                available: *currency,
            });
        }

        *currency -= next.cost;
        let max_health = next.max_health.max(1.0);
        self.health = (self.health + max_health - self.max_health).clamp(0.0, max_health);
        self.max_health = max_health;
        self.armor = next.armor.max(0.0);
        self.regen = next.regen.max(0.0);
        self.upgrades += 1;
        if let Some(passive) = next.passive {
            self.passives.push(passive);
        }
        Ok(Upgrade {
            level: self.level(),
            passive: next.passive,
        })
    }

    fn level(&self) -> u32 {
        u32::try_from(self.upgrades + 1).unwrap_or(u32::MAX)
    }

    pub(crate) fn snapshot(&self) -> StructureSnapshot {
        StructureSnapshot {
            health: self.health,
            max_health: self.max_health,
            armor: self.armor,
            regen: self.regen,
            level: self.level(),
            repair_cooldown: self.repair_cooldown,
            passives: self.passives.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard_defence_core::config::{RepairConfig, StructureLevel};

    fn config() -> StructureConfig {
        StructureConfig {
            max_health: 100.0,
            armor: 2.0,
            regen: 1.0,
            repair: RepairConfig {
                cost: 40,
                amount: 25.0,
                cooldown: 10.0,
            },
            levels: vec![StructureLevel {
                cost: 100,
                max_health: 150.0,
                armor: 4.0,
                regen: 2.0,
                passive: Some(Passive::RepairDiscount { factor: 0.5 }),
            }],
        }
    }

    #[test]
    fn breach_damage_respects_armor_and_floor() {
        let structure = Structure::new(&config());
        assert_eq!(structure.breach_damage(10.0), 8.0);
        assert_eq!(structure.breach_damage(1.5), 1.0);
    }

    #[test]
    fn repair_heals_clamped_and_starts_cooldown() {
        let config = config();
        let mut structure = Structure::new(&config);
        let mut currency = 100;
        structure.take_damage(10.0);

        let repair = structure.repair(&mut currency, &config).expect("repair");
        assert_eq!(repair, Repair { amount: 10.0, cost: 40 });
        assert_eq!(structure.snapshot().health, 100.0);
        assert_eq!(currency, 60);
        assert_eq!(structure.snapshot().repair_cooldown, 10.0);
    }

    #[test]
    fn repair_rejections_leave_state_untouched() {
        let config = config();
        let mut structure = Structure::new(&config);
        let mut currency = 10;

        assert_eq!(
            structure.repair(&mut currency, &config),
            Err(CommandError::FullHealth)
        );
        assert_eq!(structure.snapshot().repair_cooldown, 0.0);

        structure.take_damage(30.0);
        assert_eq!(
            structure.repair(&mut currency, &config),
            Err(CommandError::InsufficientCurrency {
                required: 40,
                available: 10
            })
        );
        assert_eq!(currency, 10);
    }

    #[test]
    fn upgrade_grows_health_by_the_same_delta_and_unlocks_passive() {
        let config = config();
        let mut structure = Structure::new(&config);
        let mut currency = 300;
        structure.take_damage(20.0);

        let upgrade = structure.upgrade(&mut currency, &config).expect("upgrade");
        assert_eq!(upgrade.level, 2);
        assert_eq!(structure.snapshot().health, 130.0);
        assert_eq!(structure.repair_cost(&config), 20);
        assert_eq!(
            structure.upgrade(&mut currency, &config),
            Err(CommandError::StructureAtMaxLevel)
        );
    }

    #[test]
    fn regeneration_stops_at_max_health() {
        let config = config();
        let mut structure = Structure::new(&config);
        structure.take_damage(1.5);
        structure.tick(5.0);
        assert_eq!(structure.snapshot().health, 100.0);
    }
}
