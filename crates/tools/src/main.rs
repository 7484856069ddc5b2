use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use undercroft_core::{Action, Level, NodeKind, SchedulerStop};
use undercroft_tools::{LayoutArg, init_tracing, load_config};

#[derive(Parser)]
#[command(author, version, about = "Generate a dungeon level from a seed", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, value_enum, default_value_t = LayoutArg::ThreeRooms)]
    layout: LayoutArg,
    /// Room side for three-rooms; scale factor for scattered
    #[arg(long, default_value_t = 4)]
    size: usize,
    /// TOML generator config
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Avatar turns to simulate, waiting every turn
    #[arg(short, long, default_value_t = 0)]
    turns: u32,
    /// Print a JSON summary instead of the ASCII map
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Summary {
    seed: u64,
    layout: &'static str,
    width: usize,
    height: usize,
    fingerprint: String,
    rooms: usize,
    corridors: usize,
    dead_ends: usize,
    occupants: usize,
    elapsed: u64,
    rows: Vec<String>,
}

fn simulate(level: &mut Level, turns: u32) -> Result<()> {
    if turns == 0 {
        return Ok(());
    }
    let avatar = level.spawn_avatar_at_entry().context("Level has no entry room")?;
    for _ in 0..turns {
        let result = level.run_until_blocked(1_000);
        match result.stop_reason {
            SchedulerStop::AwaitingInput(id) if id == avatar => {
                level.submit_action(Action::wait());
            }
            other => {
                tracing::warn!(?other, "simulation stopped before the avatar's turn");
                break;
            }
        }
    }
    Ok(())
}

fn summarize(args: &Args, level: &Level) -> Summary {
    let map = level.map();
    Summary {
        seed: args.seed,
        layout: args.layout.name(),
        width: map.width(),
        height: map.height(),
        fingerprint: format!("{:016x}", map.fingerprint()),
        rooms: map.rooms().count(),
        corridors: map.nodes().iter().filter(|node| node.kind == NodeKind::Corridor).count(),
        dead_ends: map.dead_ends().count(),
        occupants: level.occupants().count(),
        elapsed: level.elapsed(),
        rows: level.render_ascii().lines().map(str::to_owned).collect(),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let mut level = args.layout.generate(args.size, config, args.seed).with_context(|| {
        format!("Failed to generate {} level for seed {}", args.layout.name(), args.seed)
    })?;
    simulate(&mut level, args.turns)?;

    let summary = summarize(&args, &level);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", level.render_ascii());
        println!(
            "seed {} | {} rooms | {} corridors | {} dead ends | fingerprint {} | elapsed {}",
            summary.seed,
            summary.rooms,
            summary.corridors,
            summary.dead_ends,
            summary.fingerprint,
            summary.elapsed
        );
    }
    Ok(())
}
