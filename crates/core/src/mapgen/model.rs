//! Generated level data: nodes, edge lists, the tile grid and the runtime path grid.

use xxhash_rust::xxh3::xxh3_64;

use crate::geom::{Rect, Segment};
use crate::grid::{FLOOR_MODEL, TileGrid, WALL_MODEL};
use crate::pathing::{DiagonalMode, Heuristic, PathGrid};
use crate::types::{NodeId, NodeKind, Pos, TileKind};

use super::error::GenerationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub rect: Rect,
    pub kind: NodeKind,
    pub is_entry: bool,
    pub is_exit: bool,
    pub is_dead_end: bool,
}

impl Node {
    pub fn room(id: NodeId, rect: Rect) -> Self {
        Self { id, rect, kind: NodeKind::Room, is_entry: false, is_exit: false, is_dead_end: false }
    }

    pub fn corridor(id: NodeId, pos: Pos) -> Self {
        Self {
            id,
            rect: Rect::new(pos.x, pos.y, 1, 1),
            kind: NodeKind::Corridor,
            is_entry: false,
            is_exit: false,
            is_dead_end: false,
        }
    }

    pub fn is_room(&self) -> bool {
        self.kind == NodeKind::Room
    }
}

#[derive(Clone, Debug)]
pub struct LevelMap {
    grid: TileGrid,
    nodes: Vec<Node>,
    graph: Vec<Segment>,
    connections: Vec<Segment>,
    pathing: PathGrid,
    entry_room: Option<NodeId>,
    exit_room: Option<NodeId>,
    rooms: Vec<NodeId>,
    dead_ends: Vec<NodeId>,
}

impl LevelMap {
    /// Finalizes a carved grid: builds the runtime path grid, stamps render metadata and
    /// caches the room lists. Does not validate entry and exit rooms.
    pub(crate) fn assemble(
        mut grid: TileGrid,
        mut nodes: Vec<Node>,
        graph: Vec<Segment>,
        connections: Vec<Segment>,
    ) -> Self {
        nodes.sort_by_key(|node| node.id);

        let mut pathing = PathGrid::new(
            grid.width(),
            grid.height(),
            DiagonalMode::AtLeastOneWalkable,
            Heuristic::Octile,
        );
        pathing.fill_solid_region(grid.region(), true);
        for node in &nodes {
            for pos in node.rect.cells() {
                if grid.node_at(pos) == Some(node.id) {
                    pathing.set_solid(pos, false);
                }
            }
        }

        for pos in grid.positions() {
            match grid.kind(pos) {
                TileKind::Node => grid.set_render(pos, FLOOR_MODEL, 0),
                TileKind::Wall => grid.set_render(pos, WALL_MODEL, 0),
                TileKind::Void => {}
            }
        }

        let mut entry_room = None;
        let mut exit_room = None;
        let mut rooms = Vec::new();
        let mut dead_ends = Vec::new();
        for node in nodes.iter().filter(|node| node.is_room()) {
            if node.is_entry {
                entry_room = Some(node.id);
            }
            if node.is_exit {
                exit_room = Some(node.id);
            }
            if node.is_dead_end {
                dead_ends.push(node.id);
            }
            rooms.push(node.id);
        }

        Self { grid, nodes, graph, connections, pathing, entry_room, exit_room, rooms, dead_ends }
    }

    /// Checks that exactly one room is flagged entry and exactly one exit.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let entries = self.nodes.iter().filter(|node| node.is_entry).count();
        let exits = self.nodes.iter().filter(|node| node.is_exit).count();
        match entries {
            0 => return Err(GenerationError::MissingEntry),
            1 => {}
            count => return Err(GenerationError::DuplicateEntry { count }),
        }
        match exits {
            0 => Err(GenerationError::MissingExit),
            1 => Ok(()),
            count => Err(GenerationError::DuplicateExit { count }),
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.binary_search_by_key(&id, |node| node.id).ok().map(|idx| &self.nodes[idx])
    }

    pub fn node_at(&self, pos: Pos) -> Option<&Node> {
        self.grid.node_at(pos).and_then(|id| self.node(id))
    }

    pub fn graph(&self) -> &[Segment] {
        &self.graph
    }

    pub fn connections(&self) -> &[Segment] {
        &self.connections
    }

    pub fn pathing(&self) -> &PathGrid {
        &self.pathing
    }

    pub fn entry_room(&self) -> Option<&Node> {
        self.entry_room.and_then(|id| self.node(id))
    }

    pub fn exit_room(&self) -> Option<&Node> {
        self.exit_room.and_then(|id| self.node(id))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Node> {
        self.rooms.iter().filter_map(|&id| self.node(id))
    }

    pub fn dead_ends(&self) -> impl Iterator<Item = &Node> {
        self.dead_ends.iter().filter_map(|&id| self.node(id))
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.grid.is_node(pos)
    }

    /// Shortest walkable path, both ends included. Empty if unreachable or out of bounds.
    pub fn shortest_path(&self, from: Pos, to: Pos) -> Vec<Pos> {
        self.pathing.find_path(from, to)
    }

    pub fn render_ascii(&self) -> String {
        let mut text = String::with_capacity((self.width() + 1) * self.height());
        for y in 0..self.height() as i32 {
            for x in 0..self.width() as i32 {
                text.push(tile_glyph(self.grid.kind(Pos { y, x })));
            }
            text.push('\n');
        }
        text
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend((self.width() as u32).to_le_bytes());
        bytes.extend((self.height() as u32).to_le_bytes());
        for cell in self.grid.cells() {
            bytes.push(match cell.kind {
                TileKind::Void => 0,
                TileKind::Node => 1,
                TileKind::Wall => 2,
            });
            bytes.extend(cell.node.map_or(u32::MAX, |id| id.0).to_le_bytes());
        }

        bytes.extend((self.nodes.len() as u32).to_le_bytes());
        for node in &self.nodes {
            bytes.extend(node.id.0.to_le_bytes());
            bytes.extend(node.rect.x.to_le_bytes());
            bytes.extend(node.rect.y.to_le_bytes());
            bytes.extend(node.rect.width.to_le_bytes());
            bytes.extend(node.rect.height.to_le_bytes());
            bytes.push(match node.kind {
                NodeKind::Room => 0,
                NodeKind::Corridor => 1,
            });
            bytes.push(
                u8::from(node.is_entry)
                    | (u8::from(node.is_exit) << 1)
                    | (u8::from(node.is_dead_end) << 2),
            );
        }

        for segments in [&self.graph, &self.connections] {
            bytes.extend((segments.len() as u32).to_le_bytes());
            for segment in segments.iter() {
                for value in [segment.a.x, segment.a.y, segment.b.x, segment.b.y] {
                    bytes.extend(value.to_bits().to_le_bytes());
                }
            }
        }
        bytes
    }

    pub fn fingerprint(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}

pub(crate) fn tile_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Void => ' ',
        TileKind::Node => '.',
        TileKind::Wall => '#',
    }
}
