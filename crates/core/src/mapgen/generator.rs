//! Level generation orchestration: placement, connection selection, carving, cleanup.

use std::collections::BTreeSet;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::geom::Point;
use crate::grid::{TileGrid, neighbors8};
use crate::level::Level;
use crate::types::{NodeId, Pos};

use super::config::GeneratorConfig;
use super::corridors::carve_corridors;
use super::error::GenerationError;
use super::layout::{RoomLayout, RoomPlacer};
use super::model::{LevelMap, Node};
use super::spanning::{Site, dead_end_rooms, select_connections};

pub struct Generator<L> {
    layout: L,
    config: GeneratorConfig,
}

impl<L: RoomLayout> Generator<L> {
    pub fn new(layout: L, config: GeneratorConfig) -> Self {
        Self { layout, config }
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Builds the level and runs the layout's population hook. The level keeps drawing from
    /// the same random stream.
    pub fn generate(&self, mut rng: ChaCha8Rng) -> Result<Level, GenerationError> {
        let map = self.build_map(&mut rng)?;
        let mut level = Level::new(map, rng);
        self.layout.populate(&mut level);
        Ok(level)
    }

    /// Runs the generation pipeline without populating occupants.
    pub fn build_map(&self, rng: &mut ChaCha8Rng) -> Result<LevelMap, GenerationError> {
        self.config.validate()?;
        let (width, height) = self.layout.dimensions();
        let mut grid = TileGrid::new(width, height);

        let mut placer = RoomPlacer::new(&mut grid, &self.config);
        self.layout.place_rooms(&mut placer, rng)?;
        let mut nodes = placer.into_nodes();
        debug!(layout = self.layout.name(), width, height, rooms = nodes.len(), "placed rooms");

        let sites = self.sites(&nodes, rng);
        let ratio = self.config.additional_connection_ratio.unwrap_or(self.layout.connection_ratio());
        let selection =
            select_connections(&sites, ratio, self.config.extra_connection_retries, rng);

        let dead_ends = dead_end_rooms(&sites, &selection.connections);
        for node in nodes.iter_mut() {
            node.is_dead_end = dead_ends.contains(&node.id);
        }

        let pairs: Vec<(NodeId, NodeId)> = selection
            .connections
            .iter()
            .map(|edge| (sites[edge.a].room, sites[edge.b].room))
            .collect();
        carve_corridors(&mut grid, &mut nodes, &pairs, rng)?;

        if sites.len() > 1 {
            let used: BTreeSet<NodeId> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
            prune_unused_rooms(&mut grid, &mut nodes, &used);
        }
        add_missing_walls(&mut grid);
        self.layout.add_features(&mut grid);

        let graph = selection.graph.iter().map(|edge| edge.segment(&sites)).collect();
        let connections = selection.connections.iter().map(|edge| edge.segment(&sites)).collect();
        let map = LevelMap::assemble(grid, nodes, graph, connections);
        map.validate()?;
        debug!(
            nodes = map.nodes().len(),
            rooms = map.rooms().count(),
            dead_ends = map.dead_ends().count(),
            fingerprint = map.fingerprint(),
            "level map ready"
        );
        Ok(map)
    }

    fn sites(&self, nodes: &[Node], rng: &mut ChaCha8Rng) -> Vec<Site> {
        let jitter = self.config.site_jitter;
        nodes
            .iter()
            .filter(|node| node.is_room())
            .map(|node| {
                let mid = node.rect.midpoint();
                let dx = rng.gen_range(0.0..1.0) * jitter;
                let dy = rng.gen_range(0.0..1.0) * jitter;
                Site { point: Point::new(mid.x + dx, mid.y + dy), room: node.id }
            })
            .collect()
    }
}

/// Drops rooms no connection reaches and clears walls that no longer border a node.
fn prune_unused_rooms(grid: &mut TileGrid, nodes: &mut Vec<Node>, used: &BTreeSet<NodeId>) {
    let before = nodes.len();
    nodes.retain(|node| {
        if !node.is_room() || used.contains(&node.id) {
            return true;
        }
        for pos in node.rect.cells() {
            grid.reset(pos);
        }
        false
    });
    if nodes.len() == before {
        return;
    }
    debug!(pruned = before - nodes.len(), "pruned unused rooms");
    let orphaned: Vec<Pos> = grid
        .positions()
        .filter(|&pos| grid.is_wall(pos) && !neighbors8(pos).iter().any(|&n| grid.is_node(n)))
        .collect();
    for pos in orphaned {
        grid.reset(pos);
    }
}

/// Every Void cell touching a Node cell, diagonals included, becomes Wall.
fn add_missing_walls(grid: &mut TileGrid) {
    let missing: Vec<Pos> = grid
        .positions()
        .filter(|&pos| grid.is_void(pos) && neighbors8(pos).iter().any(|&n| grid.is_node(n)))
        .collect();
    for pos in missing {
        grid.set_wall(pos);
    }
}
