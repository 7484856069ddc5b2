//! Shared fixtures for the unit test suites.
//! This module exists to avoid repeating hand-drawn level setup across many tests.
//! It does not own production generation logic.

use crate::grid::TileGrid;
use crate::mapgen::{LevelMap, Node};
use crate::types::{NodeId, Pos};

/// Builds a map from rows of `.` (one-cell corridor node), `#` (wall) and space (void).
/// Rows must share one width. The map carries no entry or exit room.
pub(crate) fn map_from_ascii(rows: &[&str]) -> LevelMap {
    let width = rows.first().map_or(0, |row| row.len());
    let mut grid = TileGrid::new(width, rows.len());
    let mut nodes = Vec::new();
    for (y, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), width, "ragged fixture row {y}");
        for (x, glyph) in row.chars().enumerate() {
            let pos = Pos::new(x as i32, y as i32);
            match glyph {
                '.' => {
                    let id = NodeId(nodes.len() as u32);
                    grid.set_node(pos, id);
                    nodes.push(Node::corridor(id, pos));
                }
                '#' => grid.set_wall(pos),
                ' ' => {}
                other => panic!("unknown fixture glyph {other:?}"),
            }
        }
    }
    LevelMap::assemble(grid, nodes, Vec::new(), Vec::new())
}
