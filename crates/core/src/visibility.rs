//! Field-of-view through recursive symmetric shadowcasting.
//! This module exists to keep sight rules deterministic and independent of level storage:
//! callers supply the blocking predicate and receive visible cells through a callback.
//! It does not own which cells an occupant remembers.

use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Cardinal {
    North,
    East,
    South,
    West,
}

const CARDINALS: [Cardinal; 4] = [Cardinal::North, Cardinal::East, Cardinal::South, Cardinal::West];

#[derive(Clone, Copy, Debug)]
struct Quadrant {
    cardinal: Cardinal,
    origin: Pos,
}

impl Quadrant {
    fn transform(&self, depth: i32, col: i32) -> Pos {
        let o = self.origin;
        match self.cardinal {
            Cardinal::North => Pos { y: o.y - depth, x: o.x + col },
            Cardinal::South => Pos { y: o.y + depth, x: o.x + col },
            Cardinal::East => Pos { y: o.y + col, x: o.x + depth },
            Cardinal::West => Pos { y: o.y + col, x: o.x - depth },
        }
    }
}

/// Exact slope `num / den` with `den > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slope {
    num: i32,
    den: i32,
}

impl Slope {
    const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Slope of the edge a tile shares with the previous column.
    fn of_tile(depth: i32, col: i32) -> Self {
        Self::new(2 * col - 1, 2 * depth)
    }
}

#[derive(Clone, Copy, Debug)]
struct Row {
    depth: i32,
    start: Slope,
    end: Slope,
}

impl Row {
    fn next(&self) -> Self {
        Self { depth: self.depth + 1, ..*self }
    }

    /// `floor(depth * start + 1/2)`
    fn min_col(&self) -> i32 {
        let Slope { num, den } = self.start;
        (2 * self.depth * num + den).div_euclid(2 * den)
    }

    /// `ceil(depth * end - 1/2)`
    fn max_col(&self) -> i32 {
        let Slope { num, den } = self.end;
        -(den - 2 * self.depth * num).div_euclid(2 * den)
    }

    fn is_symmetric(&self, col: i32) -> bool {
        col * self.start.den >= self.depth * self.start.num
            && col * self.end.den <= self.depth * self.end.num
    }
}

struct Shadowcaster<'a, B, V> {
    quadrant: Quadrant,
    range: i32,
    is_blocking: &'a B,
    mark_visible: &'a mut V,
}

impl<B, V> Shadowcaster<'_, B, V>
where
    B: Fn(Pos) -> bool,
    V: FnMut(Pos),
{
    fn scan(&mut self, mut row: Row) {
        if row.depth > self.range {
            return;
        }

        let mut prev_wall: Option<bool> = None;
        for col in row.min_col()..=row.max_col() {
            let pos = self.quadrant.transform(row.depth, col);
            let is_wall = (self.is_blocking)(pos);
            if is_wall || row.is_symmetric(col) {
                (self.mark_visible)(pos);
            }
            match (prev_wall, is_wall) {
                (Some(true), false) => row.start = Slope::of_tile(row.depth, col),
                (Some(false), true) => {
                    let mut next = row.next();
                    next.end = Slope::of_tile(row.depth, col);
                    self.scan(next);
                }
                _ => {}
            }
            prev_wall = Some(is_wall);
        }
        if prev_wall == Some(false) {
            self.scan(row.next());
        }
    }
}

/// Reports every cell visible from `origin` within `range` rows of each quadrant.
/// The origin is reported first. Blocking cells are reported when lit but hide what lies
/// behind them; floor cells are reported only when the origin is visible from them too.
pub fn compute_fov<B, V>(origin: Pos, range: i32, is_blocking: B, mut mark_visible: V)
where
    B: Fn(Pos) -> bool,
    V: FnMut(Pos),
{
    mark_visible(origin);
    for cardinal in CARDINALS {
        let mut caster = Shadowcaster {
            quadrant: Quadrant { cardinal, origin },
            range,
            is_blocking: &is_blocking,
            mark_visible: &mut mark_visible,
        };
        caster.scan(Row { depth: 1, start: Slope::new(-1, 1), end: Slope::new(1, 1) });
    }
}
