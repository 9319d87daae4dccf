use keyboard_defence_core::{
    Command, EnemyId, Event, GameConfig, Seed, SlotId, SpawnOptions, TargetPriority, TierId,
    TurretKindId,
};
use keyboard_defence_system_turret_targeting::{ReadyTurret, TurretTarget, TurretTargeting};
use keyboard_defence_world::{self as world, query, World};

#[test]
fn deterministic_replay_follows_priority_changes() {
    let script = scripted_commands();
    let script_len = script.len();
    let first = replay(script.clone());
    let second = replay(script);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.assignments.len(), script_len);

    let spawn_ids: Vec<EnemyId> = first
        .events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(spawn_ids.len(), 3, "expected exactly three spawn events");
    let grunt = spawn_ids[0];
    let brute = spawn_ids[1];

    assert!(first.assignments[0].is_empty(), "no enemies yet");
    assert_eq!(targets_of(&first.assignments[1]), vec![grunt]);
    assert_eq!(
        targets_of(&first.assignments[2]),
        vec![grunt],
        "equal distance resolves to the lowest id"
    );
    assert_eq!(targets_of(&first.assignments[4]), vec![grunt]);
    assert_eq!(targets_of(&first.assignments[5]), vec![brute]);
    assert_eq!(targets_of(&first.assignments[6]), vec![grunt]);

    assert!(first
        .events
        .iter()
        .any(|event| matches!(event, Event::ProjectileFired { enemy, .. } if *enemy == grunt)));
}

#[test]
fn turrets_ignore_enemies_in_other_lanes() {
    let mut world = sandbox_world();
    let mut events = Vec::new();
    let _ = world::apply(
        &mut world,
        Command::SpawnEnemy {
            tier: TierId::from("runner"),
            lane: 2,
            options: SpawnOptions::default(),
        },
        &mut events,
    )
    .expect("spawn");

    let mut targeting = TurretTargeting::new();
    let mut targets = vec![TurretTarget {
        slot: SlotId::new(9),
        enemy: EnemyId::new(9),
    }];
    targeting.handle(
        &[ReadyTurret {
            slot: SlotId::new(1),
            lane: 0,
            priority: TargetPriority::First,
        }],
        &query::enemy_view(&world),
        &mut targets,
    );
    assert!(targets.is_empty(), "stale output must be cleared");
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    assignments: Vec<Vec<TurretTarget>>,
}

fn targets_of(assignment: &[TurretTarget]) -> Vec<EnemyId> {
    assignment.iter().map(|target| target.enemy).collect()
}

fn sandbox_world() -> World {
    let mut config = GameConfig::builtin().expect("builtin config");
    config.waves.clear();
    config.features.elite_affixes = false;
    World::new(config, Seed::from(42)).expect("valid config")
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = sandbox_world();
    let mut targeting = TurretTargeting::new();
    let mut current_targets = Vec::new();
    let mut assignments = Vec::new();
    let mut events = Vec::new();

    for command in commands {
        let mut generated = Vec::new();
        let _ = world::apply(&mut world, command, &mut generated).expect("command accepted");
        events.extend(generated);

        let ready: Vec<ReadyTurret> = query::snapshot(&world)
            .slots
            .iter()
            .filter(|slot| slot.unlocked && slot.turret.is_some())
            .map(|slot| ReadyTurret {
                slot: slot.id,
                lane: slot.lane,
                priority: slot.priority,
            })
            .collect();
        targeting.handle(&ready, &query::enemy_view(&world), &mut current_targets);
        assignments.push(current_targets.clone());
    }

    ReplayOutcome {
        events,
        assignments,
    }
}

fn scripted_commands() -> Vec<Command> {
    let spawn = |tier: &str, lane: u32| Command::SpawnEnemy {
        tier: TierId::from(tier),
        lane,
        options: SpawnOptions::default(),
    };
    vec![
        Command::PlaceTurret {
            slot: SlotId::new(1),
            kind: TurretKindId::from("arrow"),
        },
        spawn("grunt", 0),
        spawn("brute", 0),
        spawn("runner", 1),
        Command::Advance { dt: 0.1 },
        Command::SetTargetPriority {
            slot: SlotId::new(1),
            priority: TargetPriority::Strongest,
        },
        Command::SetTargetPriority {
            slot: SlotId::new(1),
            priority: TargetPriority::Weakest,
        },
    ]
}
