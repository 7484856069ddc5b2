//! Geometry primitives shared by the tile grid, room placement, and the triangulation.

use crate::types::Pos;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn distance_squared_to(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Grid cell containing this point.
    pub fn to_cell(self) -> Pos {
        Pos { y: self.y.floor() as i32, x: self.x.floor() as i32 }
    }
}

/// Integer axis-aligned rectangle; `x..x + width` by `y..y + height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(self) -> i32 {
        self.x + self.width - 1
    }

    pub fn bottom(self) -> i32 {
        self.y + self.height - 1
    }

    pub fn area(self) -> i32 {
        self.width * self.height
    }

    pub fn position(self) -> Pos {
        Pos { y: self.y, x: self.x }
    }

    pub fn midpoint(self) -> Point {
        Point::new(self.x as f64 + self.width as f64 / 2.0, self.y as f64 + self.height as f64 / 2.0)
    }

    pub fn expanded(self, margin: i32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2,
            height: self.height + margin * 2,
        }
    }

    pub fn intersects(self, other: &Self) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    pub fn contains(self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x <= self.right() && pos.y >= self.y && pos.y <= self.bottom()
    }

    /// The four cells diagonally outside the corners of this rectangle.
    pub fn outer_corners(self) -> [Pos; 4] {
        [
            Pos { y: self.y - 1, x: self.x - 1 },
            Pos { y: self.y - 1, x: self.x + self.width },
            Pos { y: self.y + self.height, x: self.x - 1 },
            Pos { y: self.y + self.height, x: self.x + self.width },
        ]
    }

    pub fn cells(self) -> impl Iterator<Item = Pos> {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| Pos { y, x }))
    }
}

/// Undirected edge between two points. Equality ignores endpoint order.
#[derive(Clone, Copy, Debug)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
    pub length: f64,
}

impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b, length: a.distance_to(b) }
    }

    pub fn has(&self, point: Point) -> bool {
        point == self.a || point == self.b
    }

    pub fn equivalent(&self, other: &Segment) -> bool {
        (other.a == self.a && other.b == self.b) || (other.a == self.b && other.b == self.a)
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.equivalent(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_equivalence_ignores_endpoint_order() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(4.5, 6.0);
        let forward = Segment::new(a, b);
        let backward = Segment::new(b, a);

        assert_eq!(forward, backward);
        assert!(forward.has(a) && forward.has(b));
        assert!(!forward.has(Point::new(1.0, 2.5)));
        assert!((forward.length - 5.315_072_906_367_325).abs() < 1e-9);
    }

    #[test]
    fn rect_outer_corners_sit_diagonally_outside() {
        let rect = Rect::new(2, 3, 4, 2);
        assert_eq!(
            rect.outer_corners(),
            [Pos::new(1, 2), Pos::new(6, 2), Pos::new(1, 5), Pos::new(6, 5)]
        );
        assert_eq!(rect.cells().count(), 8);
        assert!(rect.contains(Pos::new(5, 4)));
        assert!(!rect.contains(Pos::new(6, 4)));
    }

    #[test]
    fn touching_rects_intersect_once_expanded() {
        let left = Rect::new(1, 1, 3, 3);
        let right = Rect::new(5, 1, 3, 3);
        assert!(!left.intersects(&right));
        assert!(left.expanded(1).intersects(&right.expanded(1)));
    }
}
