//! Room placement strategies.
//! A layout decides the level region and where rooms go; the shared pipeline in the generator
//! handles everything after placement. Layouts may also populate the finished level.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::{debug, warn};

use crate::geom::Rect;
use crate::grid::TileGrid;
use crate::level::Level;
use crate::occupant::Occupant;
use crate::types::{AgentState, Allegiance, NodeId, NodeKind, Pos};

use super::config::GeneratorConfig;
use super::error::GenerationError;
use super::model::Node;

pub const DEFAULT_CONNECTION_RATIO: f64 = 0.15;
const MIN_ASPECT_RATIO: f64 = 0.65;

pub trait RoomLayout {
    fn name(&self) -> &'static str;

    /// Level region as `(width, height)`.
    fn dimensions(&self) -> (usize, usize);

    fn connection_ratio(&self) -> f64 {
        DEFAULT_CONNECTION_RATIO
    }

    /// Places every room, flagging exactly one entry and one exit.
    fn place_rooms(
        &self,
        placer: &mut RoomPlacer<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), GenerationError>;

    /// Runs after wall inference, before the map is assembled.
    fn add_features(&self, _grid: &mut TileGrid) {}

    /// Runs once against the finished level.
    fn populate(&self, _level: &mut Level) {}
}

/// Stamps accepted rooms into the tile grid and hands out room ids in acceptance order.
pub struct RoomPlacer<'a> {
    grid: &'a mut TileGrid,
    nodes: Vec<Node>,
    config: &'a GeneratorConfig,
}

impl<'a> RoomPlacer<'a> {
    pub(super) fn new(grid: &'a mut TileGrid, config: &'a GeneratorConfig) -> Self {
        Self { grid, nodes: Vec::new(), config }
    }

    pub fn region(&self) -> Rect {
        self.grid.region()
    }

    pub fn config(&self) -> &GeneratorConfig {
        self.config
    }

    pub fn room_count(&self) -> usize {
        self.nodes.len()
    }

    /// A room fits when its wall ring stays inside the region, its interior is Void and its
    /// ring holds no Node cell.
    pub fn fits(&self, rect: Rect) -> bool {
        if rect.width <= 0 || rect.height <= 0 {
            return false;
        }
        let ring = rect.expanded(1);
        if !(self.grid.in_bounds(ring.position())
            && self.grid.in_bounds(Pos::new(ring.right(), ring.bottom())))
        {
            warn!(?rect, "room is out of bounds");
            return false;
        }
        self.grid.is_region_void(rect) && ring.cells().all(|pos| !self.grid.is_node(pos))
    }

    /// Stamps the room if it fits. Interior cells become Node, the ring becomes Wall.
    pub fn place(&mut self, rect: Rect) -> Option<NodeId> {
        if !self.fits(rect) {
            return None;
        }
        let id = NodeId(self.nodes.len() as u32);
        for pos in rect.expanded(1).cells() {
            if !rect.contains(pos) {
                self.grid.set_wall(pos);
            }
        }
        for pos in rect.cells() {
            self.grid.set_node(pos, id);
        }
        self.nodes.push(Node::room(id, rect));
        Some(id)
    }

    pub fn place_entry(&mut self, rect: Rect) -> Result<NodeId, GenerationError> {
        let id = self.place(rect).ok_or(GenerationError::RoomPlacement { role: "entry", rect })?;
        self.flag(id, |node| node.is_entry = true);
        Ok(id)
    }

    pub fn place_exit(&mut self, rect: Rect) -> Result<NodeId, GenerationError> {
        let id = self.place(rect).ok_or(GenerationError::RoomPlacement { role: "exit", rect })?;
        self.flag(id, |node| node.is_exit = true);
        Ok(id)
    }

    fn flag(&mut self, id: NodeId, apply: impl FnOnce(&mut Node)) {
        if let Some(node) = self.nodes.get_mut(id.0 as usize) {
            apply(node);
        }
    }

    pub(super) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

/// Three `size`×`size` rooms in a row sharing wall columns; left is the entry, right the exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThreeRoomsLayout {
    pub size: usize,
}

impl ThreeRoomsLayout {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    fn room(&self, index: i32) -> Rect {
        let size = self.size as i32;
        Rect::new((size + 1) * index + 1, 1, size, size)
    }
}

impl RoomLayout for ThreeRoomsLayout {
    fn name(&self) -> &'static str {
        "three-rooms"
    }

    fn dimensions(&self) -> (usize, usize) {
        ((self.size + 1) * 3 + 1, self.size + 2)
    }

    fn place_rooms(
        &self,
        placer: &mut RoomPlacer<'_>,
        _rng: &mut ChaCha8Rng,
    ) -> Result<(), GenerationError> {
        let (width, height) = self.dimensions();
        if self.size < 2 {
            return Err(GenerationError::RegionTooSmall { layout: self.name(), width, height });
        }
        placer.place_entry(self.room(0))?;
        let middle = self.room(1);
        placer
            .place(middle)
            .ok_or(GenerationError::RoomPlacement { role: "middle", rect: middle })?;
        placer.place_exit(self.room(2))?;
        Ok(())
    }

    /// Two diagonal pillars in the middle room; smaller rooms would be cut in two.
    fn add_features(&self, grid: &mut TileGrid) {
        if self.size < 4 {
            return;
        }
        let middle = self.room(1);
        grid.set_wall(Pos::new(middle.x + 1, middle.y + 2));
        grid.set_wall(Pos::new(middle.x + 2, middle.y + 1));
    }

    /// A closed door on the first doorway and a wandering agent somewhere in the exit room.
    fn populate(&self, level: &mut Level) {
        let doorway_x = self.size as i32 + 1;
        let doorway = level
            .map()
            .nodes()
            .iter()
            .find(|node| node.kind == NodeKind::Corridor && node.rect.x == doorway_x)
            .map(|node| node.rect.position());
        if let Some(pos) = doorway {
            let door = level.insert_occupant(Occupant::door(pos));
            level.toggle_door(door);
        }

        let Some(room) = level.map().exit_room().map(|node| node.rect) else {
            return;
        };
        let rng = level.rng_mut();
        let pos = Pos::new(
            room.x + rng.gen_range(0..room.width),
            room.y + rng.gen_range(0..room.height),
        );
        level.insert_occupant(Occupant::agent(pos, Allegiance::Dungeon, AgentState::Wandering));
    }
}

/// Open layout: entry at the left edge, exit at the right edge, a band of rooms between them
/// and extra rooms scattered over the region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScatteredLayout {
    pub size: usize,
}

impl ScatteredLayout {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    fn min_side(&self) -> i32 {
        (self.size as i32 / 2).max(2)
    }
}

fn sample_normal(rng: &mut ChaCha8Rng, mean: f64, deviation: f64) -> f64 {
    Normal::new(mean, deviation).map_or(mean, |normal| normal.sample(rng))
}

struct RoomSampler<'a> {
    layout: &'a ScatteredLayout,
    region: Rect,
    retries: u32,
}

impl RoomSampler<'_> {
    fn side(&self, rng: &mut ChaCha8Rng, mean: f64, deviation: f64, max: i32) -> i32 {
        let side = sample_normal(rng, mean, deviation).abs().round() as i32;
        side.clamp(self.layout.size as i32, max.max(self.layout.size as i32))
    }

    /// Samples a room size with an aspect ratio of at least 0.65; squares it off when the
    /// retry budget runs out.
    fn size(&self, rng: &mut ChaCha8Rng, mean: f64, max_width: i32) -> (i32, i32) {
        let deviation = self.layout.size as f64;
        let max_height = self.region.height - 2;
        let mut last = (self.layout.size as i32, self.layout.size as i32);
        for _ in 0..=self.retries {
            let width = self.side(rng, mean, deviation, max_width);
            let height = self.side(rng, mean, deviation, max_height);
            last = (width, height);
            if f64::from(width.min(height)) / f64::from(width.max(height)) >= MIN_ASPECT_RATIO {
                return last;
            }
        }
        let side = last.0.min(last.1);
        (side, side)
    }

    fn y(&self, rng: &mut ChaCha8Rng, height: i32, mean: f64, deviation: f64) -> i32 {
        let free = (self.region.height - height - 2).max(0);
        (sample_normal(rng, mean, deviation).clamp(0.0, 1.0) * f64::from(free)) as i32 + 1
    }
}

impl RoomLayout for ScatteredLayout {
    fn name(&self) -> &'static str {
        "scattered"
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.size * self.size * 5, self.size * self.size * 2)
    }

    fn connection_ratio(&self) -> f64 {
        0.1
    }

    fn place_rooms(
        &self,
        placer: &mut RoomPlacer<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Result<(), GenerationError> {
        let (width, height) = self.dimensions();
        if self.size < 2 {
            return Err(GenerationError::RegionTooSmall { layout: self.name(), width, height });
        }
        let size = self.size as i32;
        let min_side = self.min_side();
        let big_mean = f64::from(size);
        let small_mean = f64::from(size) * 0.65 + f64::from(min_side);
        let region = placer.region();
        let sampler =
            RoomSampler { layout: self, region, retries: placer.config().placement_retries };
        let edge_room_max = (region.width - 3) / 2;

        let (entry_w, entry_h) = sampler.size(rng, big_mean, edge_room_max);
        let entry = Rect::new(1, sampler.y(rng, entry_h, 0.5, 0.1), entry_w, entry_h);
        let (exit_w, exit_h) = sampler.size(rng, big_mean, edge_room_max);
        let exit =
            Rect::new(region.width - exit_w - 1, sampler.y(rng, exit_h, 0.5, 0.1), exit_w, exit_h);
        placer.place_entry(entry)?;
        placer.place_exit(exit)?;

        let mut free_space = region.width - entry_w - exit_w - 2;
        let mut cursor = entry_w + 2;
        let mut attempts = placer.config().placement_retries;
        while f64::from(free_space) > small_mean && attempts > 0 {
            attempts -= 1;
            let (w, h) = sampler.size(rng, small_mean, region.width - 2);
            if w + 1 >= free_space {
                continue;
            }
            let rect = Rect::new(cursor, sampler.y(rng, h, 0.5, 0.1), w, h);
            let gap = (sample_normal(rng, f64::from(min_side), f64::from(size) / 2.0).abs() as i32)
                .clamp(1, size);
            cursor += w + gap;
            free_space -= w + gap;
            if placer.place(rect).is_none() {
                debug!(?rect, "band room rejected");
            }
        }

        if free_space - 2 >= min_side {
            let w = free_space - 2;
            let h = ((f64::from(free_space) * rng.gen_range(0.0..1.0) + f64::from(free_space) * 0.5)
                as i32)
                .clamp(min_side, region.height - 2);
            let rect = Rect::new(cursor, sampler.y(rng, h, 0.5, 0.15), w, h);
            if placer.place(rect).is_none() {
                debug!(?rect, "closing band room rejected");
            }
        }

        let mut extra = sample_normal(rng, f64::from(size) * 2.0, f64::from(size) / 2.0)
            .clamp(f64::from(size), f64::from(size) * 3.0) as u32;
        let mut retries = placer.config().placement_retries;
        while extra > 0 && retries > 0 {
            retries -= 1;
            let (w, h) = sampler.size(rng, small_mean, region.width - 2);
            let low = f64::from(region.width) * 0.2;
            let high = f64::from(region.width - w) * 0.8;
            let x = if low < high { rng.gen_range(low..high) as i32 } else { low as i32 };
            let mean = if rng.gen_bool(0.5) { 0.0 } else { 1.0 };
            let rect = Rect::new(x, sampler.y(rng, h, mean, 0.15), w, h);
            if placer.place(rect).is_some() {
                extra -= 1;
            }
        }
        debug!(rooms = placer.room_count(), "scattered rooms placed");
        Ok(())
    }
}
