//! Addressable tile grid for a level.
//! Out-of-bounds reads return [`Cell::INVALID`] instead of failing, since visibility and
//! pathing reach past the edges while scanning. Out-of-bounds writes are ignored.

use crate::geom::Rect;
use crate::types::{NodeId, Pos, TileKind};

pub const INVALID_MODEL: i32 = -1;
pub const FLOOR_MODEL: i32 = 0;
pub const WALL_MODEL: i32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub kind: TileKind,
    pub node: Option<NodeId>,
    pub model: i32,
    /// Discrete rotation/reflection code in `0..24`.
    pub orientation: u8,
    pub pos: Pos,
}

impl Cell {
    pub const INVALID: Cell = Cell {
        kind: TileKind::Void,
        node: None,
        model: INVALID_MODEL,
        orientation: 0,
        pos: Pos { y: -1, x: -1 },
    };

    fn empty(pos: Pos) -> Self {
        Self { pos, ..Self::INVALID }
    }

    fn set_wall(&mut self) {
        self.kind = TileKind::Wall;
        self.node = None;
        self.model = INVALID_MODEL;
    }

    fn set_node(&mut self, node: NodeId) {
        self.kind = TileKind::Node;
        self.node = Some(node);
        self.model = INVALID_MODEL;
    }

    fn reset(&mut self) {
        *self = Self::empty(self.pos);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::empty(Pos { y: y as i32, x: x as i32 }));
            }
        }
        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn region(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn cell(&self, pos: Pos) -> Cell {
        self.index(pos).map_or(Cell::INVALID, |idx| self.cells[idx])
    }

    pub fn kind(&self, pos: Pos) -> TileKind {
        self.cell(pos).kind
    }

    pub fn node_at(&self, pos: Pos) -> Option<NodeId> {
        self.cell(pos).node
    }

    pub fn is_void(&self, pos: Pos) -> bool {
        self.kind(pos) == TileKind::Void
    }

    pub fn is_node(&self, pos: Pos) -> bool {
        self.kind(pos) == TileKind::Node
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.kind(pos) == TileKind::Wall
    }

    /// True when every cell of `region` is inside the grid and Void.
    pub fn is_region_void(&self, region: Rect) -> bool {
        region.cells().all(|pos| self.in_bounds(pos) && self.is_void(pos))
    }

    pub fn set_wall(&mut self, pos: Pos) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx].set_wall();
        }
    }

    pub fn set_node(&mut self, pos: Pos, node: NodeId) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx].set_node(node);
        }
    }

    pub fn reset(&mut self, pos: Pos) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx].reset();
        }
    }

    pub fn set_render(&mut self, pos: Pos, model: i32, orientation: u8) {
        if let Some(idx) = self.index(pos) {
            self.cells[idx].model = model;
            self.cells[idx].orientation = orientation % 24;
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos { y, x }))
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| (pos.y as usize) * self.width + (pos.x as usize))
    }
}

pub fn neighbors4(p: Pos) -> [Pos; 4] {
    [
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y, x: p.x - 1 },
    ]
}

pub fn neighbors8(p: Pos) -> [Pos; 8] {
    [
        Pos { y: p.y - 1, x: p.x - 1 },
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y - 1, x: p.x + 1 },
        Pos { y: p.y, x: p.x - 1 },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x - 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y + 1, x: p.x + 1 },
    ]
}
