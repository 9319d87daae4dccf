use keyboard_defence_core::{
    config::{
        AffixConfig, AffixDefinition, EvacuationDescriptor, HazardDefinition, SpawnInstruction,
        TypingSupportConfig, WaveDefinition,
    },
    AffixEffect, AffixKind, BossPhase, Command, CommandError, CommandOutcome, Event, GameConfig,
    GameMode, Seed, SessionStatus, SlotId, SpawnKind, SpawnOptions, TierId, TurretKindId,
};
use keyboard_defence_world::{self as world, query, World};

fn sandbox(config: impl FnOnce(&mut GameConfig)) -> World {
    let mut base = GameConfig::builtin().expect("builtin config");
    base.waves.clear();
    base.features.elite_affixes = false;
    config(&mut base);
    World::new(base, Seed::from(99)).expect("valid config")
}

fn spawn(world: &mut World, tier: &str, lane: u32, events: &mut Vec<Event>) {
    let outcome = world::apply(
        world,
        Command::SpawnEnemy {
            tier: TierId::from(tier),
            lane,
            options: SpawnOptions::default(),
        },
        events,
    )
    .expect("spawn accepted");
    assert!(matches!(
        outcome,
        CommandOutcome::Spawned { enemy: Some(_) }
    ));
}

fn advance_until(world: &mut World, events: &mut Vec<Event>, done: impl Fn(&[Event]) -> bool) {
    for _ in 0..400 {
        world.advance(0.25, events);
        if done(events) {
            return;
        }
    }
    panic!("condition not reached");
}

#[test]
fn repair_is_rejected_at_full_health_and_while_cooling_down() {
    let mut world = sandbox(|_| {});
    let mut events = Vec::new();

    let before = query::fingerprint(&world).expect("fingerprint");
    assert_eq!(
        world::apply(&mut world, Command::RepairStructure, &mut events),
        Err(CommandError::FullHealth)
    );
    assert_eq!(query::fingerprint(&world).expect("fingerprint"), before);
    assert!(events.is_empty());

    spawn(&mut world, "grunt", 0, &mut events);
    advance_until(&mut world, &mut events, |events| {
        events
            .iter()
            .any(|event| matches!(event, Event::EnemyBreached { .. }))
    });
    let damaged = query::snapshot(&world).structure;
    assert!(damaged.health < damaged.max_health);

    let _ = world::apply(&mut world, Command::RepairStructure, &mut events).expect("repair");
    let repaired = query::snapshot(&world).structure;
    assert!((repaired.health - repaired.max_health).abs() < 1e-9);
    assert_eq!(query::currency(&world), 160);
    assert_eq!(repaired.repair_cooldown, 10.0);

    world.advance(1.0, &mut events);
    let before = query::fingerprint(&world).expect("fingerprint");
    let rejected = world::apply(&mut world, Command::RepairStructure, &mut events);
    assert!(matches!(
        rejected,
        Err(CommandError::RepairCoolingDown { remaining }) if (remaining - 9.0).abs() < 1e-9
    ));
    assert_eq!(query::fingerprint(&world).expect("fingerprint"), before);
}

#[test]
fn repair_requires_currency() {
    let mut world = sandbox(|config| config.starting_currency = 10);
    let mut events = Vec::new();
    spawn(&mut world, "runner", 0, &mut events);
    advance_until(&mut world, &mut events, |events| {
        events
            .iter()
            .any(|event| matches!(event, Event::EnemyBreached { .. }))
    });

    assert_eq!(
        world::apply(&mut world, Command::RepairStructure, &mut events),
        Err(CommandError::InsufficientCurrency {
            required: 40,
            available: 10
        })
    );
}

#[test]
fn defeat_ends_the_session() {
    let mut world = sandbox(|config| config.structure.max_health = 5.0);
    let mut events = Vec::new();
    spawn(&mut world, "runner", 1, &mut events);
    advance_until(&mut world, &mut events, |events| {
        events.contains(&Event::StatusChanged {
            status: SessionStatus::Defeat,
        })
    });

    assert_eq!(query::status(&world), SessionStatus::Defeat);
    let time = query::time(&world);
    assert_eq!(
        world::apply(&mut world, Command::Advance { dt: 1.0 }, &mut events),
        Ok(CommandOutcome::Applied)
    );
    assert_eq!(query::time(&world), time, "advance is a no-op once over");
    assert_eq!(
        world::apply(&mut world, Command::UpgradeStructure, &mut events),
        Err(CommandError::SessionOver)
    );
    assert_eq!(
        world::apply(&mut world, Command::Resume, &mut events),
        Err(CommandError::SessionOver)
    );
}

#[test]
fn practice_mode_breaches_leave_the_structure_untouched() {
    let mut world = sandbox(|_| {});
    let mut events = Vec::new();
    let _ = world::apply(
        &mut world,
        Command::SetMode {
            mode: GameMode::Practice,
        },
        &mut events,
    )
    .expect("mode");
    spawn(&mut world, "runner", 2, &mut events);
    advance_until(&mut world, &mut events, |events| {
        events
            .iter()
            .any(|event| matches!(event, Event::EnemyBreached { damage, .. } if *damage == 0.0))
    });

    let structure = query::snapshot(&world).structure;
    assert_eq!(structure.health, structure.max_health);
    assert_eq!(query::analytics(&world).breaches, 1);
}

#[test]
fn mistake_limit_defeats_the_campaign_once() {
    let mut world = sandbox(|config| config.challenge.mistake_limit = Some(2));
    let mut events = Vec::new();

    for _ in 0..2 {
        let _ = world::apply(
            &mut world,
            Command::InputCharacter { character: 'q' },
            &mut events,
        )
        .expect("input");
    }

    let reached = events
        .iter()
        .filter(|event| matches!(event, Event::ChallengeMistakeLimitReached { mistakes: 2 }))
        .count();
    assert_eq!(reached, 1);
    assert_eq!(query::status(&world), SessionStatus::Defeat);
    assert_eq!(
        world::apply(
            &mut world,
            Command::InputCharacter { character: 'q' },
            &mut events
        ),
        Err(CommandError::SessionOver)
    );
}

fn evacuation_world(hazard_lanes: &[u32]) -> World {
    let mut config = GameConfig::builtin().expect("builtin config");
    config.lanes = 2;
    config.slots.retain(|slot| slot.lane < 2);
    config.first_wave_delay = 0.0;
    config.features.dynamic_spawns = false;
    config.evacuation.countdown = 3.0;
    config.waves = vec![WaveDefinition {
        duration: 30.0,
        spawns: Vec::new(),
        hazards: hazard_lanes
            .iter()
            .map(|&lane| HazardDefinition {
                lane,
                start: 0.0,
                duration: 30.0,
                fire_rate_multiplier: 0.5,
                speed_multiplier: 1.0,
            })
            .collect(),
        dynamic_events: None,
        evacuation: Some(EvacuationDescriptor {
            window_start: 1.0,
            window_end: 2.0,
            countdown: None,
        }),
        bonus_vocabulary: Vec::new(),
    }];
    World::new(config, Seed::from(7)).expect("valid config")
}

fn evacuation_started(events: &[Event]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, Event::EvacuationStarted { .. }))
}

#[test]
fn evacuation_avoids_hazard_lanes_and_fails_on_expiry() {
    let mut world = evacuation_world(&[0]);
    let mut events = Vec::new();

    advance_until(&mut world, &mut events, evacuation_started);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EvacuationStarted { lane: 1, .. })));
    assert!(query::snapshot(&world).evacuation.is_some());

    advance_until(&mut world, &mut events, |events| {
        events
            .iter()
            .any(|event| matches!(event, Event::EvacuationFailed { .. }))
    });
    assert!(events.contains(&Event::EvacuationFailed { penalty: 30 }));
    assert_eq!(query::currency(&world), 170);
    assert!(query::snapshot(&world).evacuation.is_none());
    assert_eq!(query::analytics(&world).evacuations_failed, 1);
}

#[test]
fn evacuation_is_skipped_when_every_lane_is_reserved() {
    let mut world = evacuation_world(&[0, 1]);
    let mut events = Vec::new();

    while query::status(&world) == SessionStatus::Running {
        world.advance(0.25, &mut events);
        assert!(query::snapshot(&world).evacuation.is_none());
        assert!(query::time(&world) < 60.0, "wave never completed");
    }

    assert_eq!(query::status(&world), SessionStatus::Victory);
    assert!(events.contains(&Event::EvacuationSkipped { wave: 0 }));
    assert!(!evacuation_started(&events));
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::EnemySpawned {
            kind: SpawnKind::Evacuation,
            ..
        }
    )));
    assert_eq!(query::analytics(&world).evacuations_skipped, 1);
    assert_eq!(query::currency(&world), 200);
}

#[test]
fn skipping_a_wave_fails_the_live_evacuation() {
    let mut world = evacuation_world(&[0]);
    let mut events = Vec::new();
    advance_until(&mut world, &mut events, evacuation_started);
    events.clear();

    let _ = world::apply(&mut world, Command::SkipWave, &mut events).expect("skip");

    let failed = events
        .iter()
        .position(|event| *event == Event::EvacuationFailed { penalty: 30 })
        .expect("evacuation resolved");
    let completed = events
        .iter()
        .position(|event| {
            *event
                == Event::WaveCompleted {
                    wave: 0,
                    skipped: true,
                }
        })
        .expect("wave completed");
    assert!(failed < completed);
    assert_eq!(query::currency(&world), 170);
    assert!(query::snapshot(&world).evacuation.is_none());
    assert_eq!(query::analytics(&world).evacuations_failed, 1);
}

#[test]
fn upcoming_spawns_preview_the_next_wave_without_mutation() {
    let mut world = sandbox(|config| {
        config.features.dynamic_spawns = false;
        let instruction = |at: f64, lane: u32, tier: &str, count: u32, cadence: f64| {
            SpawnInstruction {
                at,
                lane,
                tier: TierId::from(tier),
                count,
                cadence,
                shield: None,
                affixes: Vec::new(),
            }
        };
        config.waves = vec![WaveDefinition {
            duration: 30.0,
            spawns: vec![
                instruction(1.0, 0, "grunt", 3, 1.0),
                instruction(1.5, 2, "runner", 1, 0.0),
            ],
            hazards: Vec::new(),
            dynamic_events: None,
            evacuation: None,
            bonus_vocabulary: Vec::new(),
        }];
    });
    let mut events = Vec::new();

    let before = query::fingerprint(&world).expect("fingerprint");
    let preview = query::upcoming_spawns(&world, 3);
    assert_eq!(query::fingerprint(&world).expect("fingerprint"), before);
    assert!(!query::snapshot(&world).wave.active);

    let order: Vec<(f64, u32)> = preview.iter().map(|spawn| (spawn.at, spawn.lane)).collect();
    assert_eq!(order, vec![(1.0, 0), (1.5, 2), (2.0, 0)]);
    assert!(preview.iter().all(|spawn| spawn.kind == SpawnKind::Static));

    let full = query::upcoming_spawns(&world, 10);
    assert_eq!(full.len(), 4);
    assert!(full.windows(2).all(|pair| pair[0].at <= pair[1].at));

    advance_until(&mut world, &mut events, |events| {
        events
            .iter()
            .filter(|event| matches!(event, Event::EnemySpawned { .. }))
            .count()
            >= 4
    });
    assert!(query::snapshot(&world).wave.active);
    assert!(query::upcoming_spawns(&world, 10).is_empty());
}

#[test]
fn turret_support_follows_recent_accuracy() {
    let mut world = sandbox(|config| {
        config.typing.recent_window = 3;
        config.support = TypingSupportConfig {
            per_combo: 0.1,
            combo_cap: 0.5,
            max_multiplier: 2.0,
        };
        for tier in &mut config.tiers {
            if tier.id == TierId::from("brute") {
                tier.vocabulary = vec!["juggernaut".to_owned()];
            }
        }
    });
    let mut events = Vec::new();

    for _ in 0..5 {
        let _ = world::apply(
            &mut world,
            Command::InputCharacter { character: 'q' },
            &mut events,
        )
        .expect("input");
    }
    let _ = world::apply(
        &mut world,
        Command::PlaceTurret {
            slot: SlotId::new(1),
            kind: TurretKindId::from("arrow"),
        },
        &mut events,
    )
    .expect("turret placed");
    spawn(&mut world, "brute", 0, &mut events);
    for character in "juggern".chars() {
        let _ = world::apply(&mut world, Command::InputCharacter { character }, &mut events)
            .expect("input");
    }

    let typing = query::typing(&world);
    assert_eq!(typing.combo, 7);
    assert_eq!(typing.recent_accuracy, 1.0);
    assert!((typing.accuracy - 7.0 / 12.0).abs() < 1e-12);

    world.advance(0.1, &mut events);
    let cooldown = query::snapshot(&world)
        .slots
        .iter()
        .find(|slot| slot.id == SlotId::new(1))
        .and_then(|slot| slot.turret.as_ref())
        .map(|turret| turret.cooldown)
        .expect("arrow turret installed");
    assert!((cooldown - 1.0 / 1.5).abs() < 1e-9, "cooldown was {cooldown}");
}

#[test]
fn shield_overrides_block_the_shielded_affix() {
    let mut world = sandbox(|config| {
        config.features.elite_affixes = true;
        config.affixes = AffixConfig {
            chance: 1.0,
            max_per_enemy: 1,
            catalog: vec![AffixDefinition {
                kind: AffixKind::Shielded,
                weight: 1.0,
                effect: AffixEffect::BonusShield { amount: 25.0 },
            }],
        };
    });
    let mut events = Vec::new();

    let mut spawn_grunt = |shield: Option<f64>| {
        let outcome = world::apply(
            &mut world,
            Command::SpawnEnemy {
                tier: TierId::from("grunt"),
                lane: 0,
                options: SpawnOptions {
                    shield,
                    affixes: Vec::new(),
                },
            },
            &mut events,
        )
        .expect("spawn accepted");
        match outcome {
            CommandOutcome::Spawned { enemy: Some(id) } => id,
            other => panic!("grunt not spawned: {other:?}"),
        }
    };
    let overridden = spawn_grunt(Some(15.0));
    let plain = spawn_grunt(None);

    let view = query::enemy_view(&world);
    let overridden = view.get(overridden).expect("overridden grunt");
    assert!(overridden.affixes.is_empty());
    assert_eq!(overridden.shield, 15.0);

    let plain = view.get(plain).expect("plain grunt");
    assert_eq!(plain.affixes.len(), 1);
    assert_eq!(plain.affixes[0].kind, AffixKind::Shielded);
    assert_eq!(plain.shield, 25.0);
}

#[test]
fn boss_spawn_starts_phase_timers() {
    let mut world = sandbox(|_| {});
    let mut events = Vec::new();
    spawn(&mut world, "warlord", 2, &mut events);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::BossIntro { .. })));

    world.advance(8.0, &mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::BossPhaseChanged {
            phase: BossPhase::Vulnerability,
            active: true,
            ..
        }
    )));
    assert!(query::snapshot(&world).boss.is_some_and(|boss| boss.vulnerable));
}

#[test]
fn paused_sessions_freeze_time() {
    let mut world = sandbox(|_| {});
    let mut events = Vec::new();
    let _ = world::apply(&mut world, Command::Pause, &mut events).expect("pause");
    assert_eq!(
        world::apply(&mut world, Command::Pause, &mut events),
        Err(CommandError::Paused)
    );
    world.advance(3.0, &mut events);
    assert_eq!(query::time(&world), 0.0);
    let _ = world::apply(&mut world, Command::Resume, &mut events).expect("resume");
    assert_eq!(query::status(&world), SessionStatus::Running);
}
