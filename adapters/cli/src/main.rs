#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Keyboard Defence sessions headlessly.
//!
//! A session is driven by an optional replay script followed by a number of
//! idle ticks. The final state is printed as a short summary or, with
//! `--json`, as the complete snapshot.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use keyboard_defence_core::{Event, GameConfig, ReplayScript, Seed};
use keyboard_defence_world::{self as world, query, World};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LOG_TARGET: &str = "keyboard_defence::cli";

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Keyboard Defence simulation runner", long_about = None)]
struct Args {
    /// Game configuration JSON (defaults to the built-in configuration)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay script JSON holding a seed and the exact command sequence
    #[arg(long)]
    script: Option<PathBuf>,

    /// Seed override; numbers are used as-is, any other text is hashed
    #[arg(long)]
    seed: Option<String>,

    /// Idle ticks to run after the script
    #[arg(long, default_value_t = 0)]
    ticks: u32,

    /// Seconds advanced by each idle tick
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

/// Entry point for the Keyboard Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let script = args.script.as_deref().map(load_script).transpose()?;
    let seed = resolve_seed(args.seed.as_deref(), script.as_ref());
    info!(target: LOG_TARGET, ?seed, "session.starting");

    let mut world = World::new(config, seed).context("game configuration failed validation")?;
    if !args.json {
        println!("{}", query::welcome_banner(&world));
    }

    let mut events = Vec::new();
    let mut rejected = 0_usize;
    for command in script.map(|script| script.commands).unwrap_or_default() {
        events.clear();
        if world::apply(&mut world, command, &mut events).is_err() {
            rejected += 1;
        }
        trace_events(&events);
    }

    for _ in 0..args.ticks {
        if query::status(&world).is_over() {
            break;
        }
        events.clear();
        world.advance(args.dt, &mut events);
        trace_events(&events);
    }

    if args.json {
        let snapshot = query::snapshot(&world);
        let json =
            serde_json::to_string_pretty(&snapshot).context("failed to encode final snapshot")?;
        println!("{json}");
    } else {
        print_summary(&world, rejected)?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::from_file(path)
            .with_context(|| format!("failed to load game config from {}", path.display())),
        None => GameConfig::builtin().context("built-in game config is invalid"),
    }
}

fn load_script(path: &Path) -> Result<ReplayScript> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read replay script at {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse replay script at {}", path.display()))
}

/// Picks the seed from the flag, then the script, then a random draw.
fn resolve_seed(flag: Option<&str>, script: Option<&ReplayScript>) -> Seed {
    if let Some(text) = flag {
        return parse_seed(text);
    }
    if let Some(script) = script {
        return script.seed.clone();
    }
    Seed::from(rand::random::<u64>())
}

fn parse_seed(text: &str) -> Seed {
    text.trim()
        .parse::<u64>()
        .map_or_else(|_| Seed::from(text), Seed::from)
}

fn trace_events(events: &[Event]) {
    for event in events {
        if !matches!(event, Event::TimeAdvanced { .. }) {
            debug!(target: LOG_TARGET, ?event, "event");
        }
    }
}

fn print_summary(world: &World, rejected: usize) -> Result<()> {
    let snapshot = query::snapshot(world);
    let analytics = &snapshot.analytics;
    println!("status:     {:?}", snapshot.status);
    println!("time:       {:.2}s", snapshot.time);
    println!(
        "wave:       {} of {} (cycle {})",
        snapshot.wave.index + 1,
        snapshot.wave.total,
        snapshot.wave.cycle
    );
    println!(
        "structure:  {:.1}/{:.1} (level {})",
        snapshot.structure.health, snapshot.structure.max_health, snapshot.structure.level
    );
    println!("currency:   {}", snapshot.currency);
    println!("score:      {}", snapshot.score);
    println!(
        "kills:      {} typed, {} by turrets, {} breaches",
        analytics.typing_kills, analytics.turret_kills, analytics.breaches
    );
    println!("rejected:   {rejected} commands");
    let fingerprint = query::fingerprint(world).context("failed to fingerprint final state")?;
    println!("fingerprint {fingerprint}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_seeds_are_not_hashed() {
        assert_eq!(parse_seed("123"), Seed::from(123));
        assert_eq!(parse_seed("sunrise"), Seed::from("sunrise"));
    }

    #[test]
    fn flag_overrides_script_seed() {
        let script = ReplayScript {
            seed: Seed::from(5),
            commands: Vec::new(),
        };
        assert_eq!(resolve_seed(Some("9"), Some(&script)), Seed::from(9));
        assert_eq!(resolve_seed(None, Some(&script)), Seed::from(5));
    }
}
