//! Headless Battle Runner
//!
//! Runs a battle described by a setup TOML to completion and prints a
//! summary. Player-controlled combatants are answered with legacy responses,
//! so the input gate gets exercised without a UI.

use std::path::PathBuf;

use battle_core::battle::{BattleScheduler, BattleSetup, InputResponse, StepOutcome};
use battle_core::core::error::Result;
use battle_core::core::types::Team;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless Battle Runner - play out a battle setup file
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run a turn-based battle from a setup file and print the result")]
struct Args {
    /// Battle setup TOML
    #[arg(long, default_value = "data/battles/skirmish.toml")]
    setup: PathBuf,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every battle event to stderr as it happens
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
struct Survivor {
    name: String,
    team: Team,
    hp: u32,
    max_hp: u32,
}

/// JSON output structure
#[derive(Serialize)]
struct RunSummary {
    outcome: String,
    turns: u32,
    rounds: u32,
    events: usize,
    survivors: Vec<Survivor>,
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "battle_core=debug"
    } else {
        "battle_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    let (config, roster) = BattleSetup::load(&args.setup)?.build()?;
    let max_turns = config.max_turns;

    let mut scheduler = BattleScheduler::new(roster, config, seed)?;
    scheduler.start()?;

    let mut printed = 0;
    while !scheduler.is_finished() && scheduler.turn() < max_turns {
        let outcome = scheduler.run_until_blocked()?;
        if let StepOutcome::AwaitingInput(ticket) = outcome {
            tracing::debug!("Answering input request {:?}", ticket);
            scheduler.submit_response(InputResponse::default())?;
        }

        if args.verbose {
            for event in scheduler.battle_log().iter().skip(printed) {
                eprintln!("  [{}] {}", event.turn, event.description);
            }
            printed = scheduler.battle_log().len();
        }
    }

    if !scheduler.is_finished() {
        tracing::warn!("Battle hit the {} turn cap without a winner", max_turns);
    }

    let summary = RunSummary {
        outcome: scheduler
            .outcome()
            .map_or_else(|| "Timeout".to_string(), |o| format!("{:?}", o)),
        turns: scheduler.turn(),
        rounds: scheduler.round(),
        events: scheduler.battle_log().len(),
        survivors: scheduler
            .roster()
            .alive()
            .map(|c| Survivor {
                name: c.name.clone(),
                team: c.team,
                hp: c.current_hp(),
                max_hp: c.max_hp,
            })
            .collect(),
        seed,
    };

    match args.format.as_str() {
        "text" => {
            for event in scheduler.battle_log() {
                println!("[{:>3}] {}", event.turn, event.description);
            }
            println!();
            println!("Battle Result");
            println!("=============");
            println!("Outcome: {}", summary.outcome);
            println!("Turns: {} over {} rounds", summary.turns, summary.rounds);
            for survivor in &summary.survivors {
                println!(
                    "  {:?} {}: {}/{} HP",
                    survivor.team, survivor.name, survivor.hp, survivor.max_hp
                );
            }
            println!("Seed: {}", summary.seed);
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
