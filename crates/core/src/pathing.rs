//! Weighted A* over a rectangular grid.
//! This module exists so corridor carving and runtime movement share one search.
//! It does not know about tile kinds or occupants; callers mark cells solid and weighted.

use std::collections::BTreeSet;

use crate::geom::Rect;
use crate::types::Pos;

const ORTHOGONAL_STEP: u32 = 10;
const DIAGONAL_STEP: u32 = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagonalMode {
    Never,
    /// Diagonal steps are allowed when at least one of the two orthogonal cells they cut past
    /// is walkable.
    AtLeastOneWalkable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heuristic {
    Manhattan,
    Octile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathGrid {
    width: usize,
    height: usize,
    solid: Vec<bool>,
    weight: Vec<u32>,
    diagonal: DiagonalMode,
    heuristic: Heuristic,
}

impl PathGrid {
    pub fn new(width: usize, height: usize, diagonal: DiagonalMode, heuristic: Heuristic) -> Self {
        Self {
            width,
            height,
            solid: vec![false; width * height],
            weight: vec![1; width * height],
            diagonal,
            heuristic,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Out-of-bounds cells count as solid.
    pub fn is_solid(&self, pos: Pos) -> bool {
        self.index(pos).is_none_or(|idx| self.solid[idx])
    }

    pub fn set_solid(&mut self, pos: Pos, solid: bool) {
        if let Some(idx) = self.index(pos) {
            self.solid[idx] = solid;
        }
    }

    pub fn fill_solid_region(&mut self, region: Rect, solid: bool) {
        for pos in region.cells() {
            self.set_solid(pos, solid);
        }
    }

    pub fn weight_scale(&self, pos: Pos) -> u32 {
        self.index(pos).map_or(1, |idx| self.weight[idx])
    }

    pub fn set_weight_scale(&mut self, pos: Pos, weight: u32) {
        if let Some(idx) = self.index(pos) {
            self.weight[idx] = weight.max(1);
        }
    }

    /// Cheapest path from `start` to `goal`, both ends included.
    /// Empty when either end is solid, out of bounds, or the goal is unreachable.
    pub fn find_path(&self, start: Pos, goal: Pos) -> Vec<Pos> {
        if self.is_solid(start) || self.is_solid(goal) {
            return Vec::new();
        }
        if start == goal {
            return vec![start];
        }

        let cells = self.width * self.height;
        let mut g_score = vec![u32::MAX; cells];
        let mut came_from: Vec<Option<Pos>> = vec![None; cells];
        let mut closed = vec![false; cells];
        let mut open_set = BTreeSet::new();

        let start_idx = self.cell_index(start);
        g_score[start_idx] = 0;
        let h = self.estimate(start, goal);
        open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });

        while let Some(curr) = open_set.pop_first() {
            let p = Pos { y: curr.y, x: curr.x };
            let idx = self.cell_index(p);
            if closed[idx] {
                continue;
            }
            if p == goal {
                return reconstruct_path(self, &came_from, start, goal);
            }
            closed[idx] = true;
            let cur_g = g_score[idx];
            for (next, step) in self.steps(p) {
                let next_idx = self.cell_index(next);
                if closed[next_idx] {
                    continue;
                }
                let tentative = cur_g.saturating_add(step * self.weight[next_idx]);
                if tentative < g_score[next_idx] {
                    g_score[next_idx] = tentative;
                    came_from[next_idx] = Some(p);
                    let h = self.estimate(next, goal);
                    open_set.insert(OpenNode { f: tentative.saturating_add(h), h, y: next.y, x: next.x });
                }
            }
        }
        Vec::new()
    }

    fn steps(&self, p: Pos) -> Vec<(Pos, u32)> {
        let mut out = Vec::with_capacity(8);
        for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
            let next = p.offset(dx, dy);
            if !self.is_solid(next) {
                out.push((next, ORTHOGONAL_STEP));
            }
        }
        if self.diagonal == DiagonalMode::AtLeastOneWalkable {
            for (dx, dy) in [(-1, -1), (1, -1), (1, 1), (-1, 1)] {
                let next = p.offset(dx, dy);
                if self.is_solid(next) {
                    continue;
                }
                if !self.is_solid(p.offset(dx, 0)) || !self.is_solid(p.offset(0, dy)) {
                    out.push((next, DIAGONAL_STEP));
                }
            }
        }
        out
    }

    fn estimate(&self, from: Pos, to: Pos) -> u32 {
        let dx = from.x.abs_diff(to.x);
        let dy = from.y.abs_diff(to.y);
        match self.heuristic {
            Heuristic::Manhattan => ORTHOGONAL_STEP * (dx + dy),
            Heuristic::Octile => {
                ORTHOGONAL_STEP * dx.max(dy) + (DIAGONAL_STEP - ORTHOGONAL_STEP) * dx.min(dy)
            }
        }
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| self.cell_index(pos))
    }

    fn cell_index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }
}

fn reconstruct_path(grid: &PathGrid, came: &[Option<Pos>], start: Pos, goal: Pos) -> Vec<Pos> {
    let mut p = goal;
    let mut result = vec![p];
    while p != start {
        match came[grid.cell_index(p)] {
            Some(prev) => {
                p = prev;
                result.push(p);
            }
            None => return Vec::new(),
        }
    }
    result.reverse();
    result
}
