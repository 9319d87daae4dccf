use keyboard_defence_core::{
    config::{
        DynamicEventDescriptor, EvacuationDescriptor, GameConfig, HazardDefinition,
        WaveDefinition,
    },
    RngState, Seed, SpawnKind, TierId,
};
use keyboard_defence_system_wave_scheduling::{EvacuationSchedule, WavePlan, WaveScheduler};

fn config(lanes: u32) -> GameConfig {
    GameConfig {
        lanes,
        ..GameConfig::default()
    }
}

fn hazard(lane: u32, start: f64, duration: f64) -> HazardDefinition {
    HazardDefinition {
        lane,
        start,
        duration,
        fire_rate_multiplier: 0.5,
        speed_multiplier: 1.0,
    }
}

fn evacuation_wave(hazards: Vec<HazardDefinition>) -> WaveDefinition {
    WaveDefinition {
        duration: 40.0,
        spawns: Vec::new(),
        hazards,
        dynamic_events: Some(DynamicEventDescriptor {
            min_count: 2,
            max_count: 5,
            window_start: 0.0,
            window_end: 30.0,
            tiers: vec![TierId::from("grunt"), TierId::from("runner")],
        }),
        evacuation: Some(EvacuationDescriptor {
            window_start: 4.0,
            window_end: 20.0,
            countdown: Some(8.0),
        }),
        bonus_vocabulary: Vec::new(),
    }
}

fn plan(scheduler: &WaveScheduler, definition: &WaveDefinition, seed: u64) -> WavePlan {
    let mut rng = Seed::from(seed).to_state();
    scheduler.plan(0, definition, &mut rng)
}

#[test]
fn evacuation_avoids_hazard_lanes() {
    let scheduler = WaveScheduler::new(&config(2));
    let definition = evacuation_wave(vec![hazard(0, 0.0, 40.0)]);

    for seed in 0..200 {
        match plan(&scheduler, &definition, seed).evacuation() {
            EvacuationSchedule::Planned(evacuation) => assert_eq!(evacuation.lane, 1),
            EvacuationSchedule::Skipped => {}
            EvacuationSchedule::None => panic!("evacuation should have been considered"),
        }
    }
}

#[test]
fn evacuation_never_shares_a_lane_with_a_dynamic_event_in_its_window() {
    let scheduler = WaveScheduler::new(&config(3));
    let definition = evacuation_wave(Vec::new());

    let mut planned = 0;
    for seed in 0..500 {
        let plan = plan(&scheduler, &definition, seed);
        let EvacuationSchedule::Planned(evacuation) = plan.evacuation() else {
            continue;
        };
        planned += 1;
        let until = evacuation.at + evacuation.countdown;
        for entry in plan.upcoming(plan.len()) {
            if entry.kind != SpawnKind::Dynamic {
                continue;
            }
            let inside = entry.at >= evacuation.at && entry.at <= until;
            assert!(
                !(inside && entry.lane == evacuation.lane),
                "seed {seed}: dynamic event at {} shares lane {}",
                entry.at,
                entry.lane
            );
        }
    }
    assert!(planned > 0, "expected at least one planned evacuation");
}

#[test]
fn fully_reserved_lanes_skip_the_evacuation() {
    let scheduler = WaveScheduler::new(&config(1));
    let mut definition = evacuation_wave(vec![hazard(0, 0.0, 40.0)]);
    definition.dynamic_events = None;

    let plan = plan(&scheduler, &definition, 9);
    assert_eq!(plan.evacuation(), EvacuationSchedule::Skipped);
    assert!(plan
        .upcoming(plan.len())
        .iter()
        .all(|entry| entry.kind != SpawnKind::Evacuation));
}

#[test]
fn evacuation_entry_uses_transport_tier_and_window() {
    let scheduler = WaveScheduler::new(&config(3));
    let mut definition = evacuation_wave(Vec::new());
    definition.dynamic_events = None;

    let plan = plan(&scheduler, &definition, 42);
    let EvacuationSchedule::Planned(evacuation) = plan.evacuation() else {
        panic!("three free lanes must allow an evacuation");
    };
    assert!((4.0..=20.0).contains(&evacuation.at));
    assert_eq!(evacuation.countdown, 8.0);

    let entry = plan
        .upcoming(plan.len())
        .iter()
        .find(|entry| entry.kind == SpawnKind::Evacuation)
        .expect("evacuation entry");
    assert_eq!(entry.tier, TierId::from("transport"));
    assert_eq!(entry.lane, evacuation.lane);
}

#[test]
fn identical_seeds_produce_identical_plans() {
    let scheduler = WaveScheduler::new(&config(3));
    let definition = evacuation_wave(vec![hazard(2, 5.0, 4.0)]);

    let mut first_rng = RngState::new(2024);
    let mut second_rng = RngState::new(2024);
    let first = scheduler.plan(1, &definition, &mut first_rng);
    let second = scheduler.plan(1, &definition, &mut second_rng);

    assert_eq!(first, second);
    assert_eq!(first_rng, second_rng);
}
