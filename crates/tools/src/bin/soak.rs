use std::collections::{BTreeSet, VecDeque};

use anyhow::{Error, Result, bail};
use clap::Parser;
use undercroft_core::grid::neighbors4;
use undercroft_core::{GeneratorConfig, LevelMap, Pos};
use undercroft_tools::{LayoutArg, init_tracing};

#[derive(Parser)]
#[command(author, version, about = "Check level invariants over many seeds", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 0)]
    start: u64,
    #[arg(short = 'n', long, default_value_t = 500)]
    seeds: u64,
    #[arg(short, long, value_enum, default_value_t = LayoutArg::Scattered)]
    layout: LayoutArg,
    #[arg(long, default_value_t = 4)]
    size: usize,
}

fn check(map: &LevelMap) -> Result<()> {
    let rooms: Vec<_> = map.rooms().collect();
    for (index, room) in rooms.iter().enumerate() {
        let overlapping = rooms[index + 1..].iter().find(|other| room.rect.intersects(&other.rect));
        if let Some(other) = overlapping {
            bail!("rooms {:?} and {:?} overlap", room.id, other.id);
        }
    }
    let entries = map.nodes().iter().filter(|node| node.is_entry).count();
    let exits = map.nodes().iter().filter(|node| node.is_exit).count();
    if entries != 1 || exits != 1 {
        bail!("{entries} entries and {exits} exits");
    }

    let Some(entry) = map.entry_room() else {
        bail!("no entry room");
    };
    let start = entry.rect.position();
    let mut seen = BTreeSet::from([start]);
    let mut frontier = VecDeque::from([start]);
    while let Some(pos) = frontier.pop_front() {
        for next in neighbors4(pos) {
            if map.grid().is_node(next) && seen.insert(next) {
                frontier.push_back(next);
            }
        }
    }
    let unreachable: Vec<Pos> =
        rooms.iter().map(|room| room.rect.position()).filter(|pos| !seen.contains(pos)).collect();
    if !unreachable.is_empty() {
        bail!("rooms at {unreachable:?} unreachable from the entry");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    println!(
        "Soaking {} {} levels (size {}) from seed {}...",
        args.seeds,
        args.layout.name(),
        args.size,
        args.start
    );
    let mut failures = 0;
    for seed in args.start..args.start + args.seeds {
        let outcome = args
            .layout
            .build_map(args.size, GeneratorConfig::default(), seed)
            .map_err(Error::from)
            .and_then(|map| check(&map));
        if let Err(err) = outcome {
            failures += 1;
            println!("seed {seed}: {err:#}");
        }
    }

    if failures > 0 {
        bail!("{failures} of {} seeds failed", args.seeds);
    }
    println!("All {} seeds passed.", args.seeds);
    Ok(())
}
