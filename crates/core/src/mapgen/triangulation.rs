//! Bowyer-Watson Delaunay triangulation over room sites.

use std::collections::BTreeMap;

use crate::geom::Point;

const DEGENERATE_EPSILON: f64 = 1e-12;

#[derive(Clone, Copy, Debug)]
struct Triangle {
    vertices: [usize; 3],
    center: Point,
    radius_squared: f64,
}

impl Triangle {
    fn new(vertices: [usize; 3], points: &[Point]) -> Option<Self> {
        let [a, b, c] = vertices.map(|idx| points[idx]);
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if d.abs() < DEGENERATE_EPSILON {
            return None;
        }
        let a2 = a.x * a.x + a.y * a.y;
        let b2 = b.x * b.x + b.y * b.y;
        let c2 = c.x * c.x + c.y * c.y;
        let center = Point::new(
            (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
            (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
        );
        Some(Self { vertices, center, radius_squared: center.distance_squared_to(a) })
    }

    fn circumcircle_contains(&self, point: Point) -> bool {
        self.center.distance_squared_to(point) < self.radius_squared
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [edge_key(a, b), edge_key(b, c), edge_key(c, a)]
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Triangles as index triples into `sites`. Fewer than three sites produce no triangles.
/// Degenerate (collinear) triangles are skipped, so near-collinear input may not span every
/// site; callers fall back to another connectivity source in that case.
pub(super) fn triangulate(sites: &[Point]) -> Vec<[usize; 3]> {
    if sites.len() < 3 {
        return Vec::new();
    }

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for site in sites {
        min_x = min_x.min(site.x);
        min_y = min_y.min(site.y);
        max_x = max_x.max(site.x);
        max_y = max_y.max(site.y);
    }
    let extent = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

    let mut points = sites.to_vec();
    let super_start = points.len();
    points.push(Point::new(mid.x - 20.0 * extent, mid.y - extent));
    points.push(Point::new(mid.x, mid.y + 20.0 * extent));
    points.push(Point::new(mid.x + 20.0 * extent, mid.y - extent));

    let mut triangles: Vec<Triangle> =
        Triangle::new([super_start, super_start + 1, super_start + 2], &points)
            .into_iter()
            .collect();

    for (idx, &site) in sites.iter().enumerate() {
        let mut boundary: BTreeMap<(usize, usize), u32> = BTreeMap::new();
        triangles.retain(|triangle| {
            if !triangle.circumcircle_contains(site) {
                return true;
            }
            for edge in triangle.edges() {
                *boundary.entry(edge).or_default() += 1;
            }
            false
        });
        for ((a, b), count) in boundary {
            if count != 1 {
                continue;
            }
            if let Some(triangle) = Triangle::new([a, b, idx], &points) {
                triangles.push(triangle);
            }
        }
    }

    triangles
        .into_iter()
        .filter(|triangle| triangle.vertices.iter().all(|&v| v < super_start))
        .map(|triangle| triangle.vertices)
        .collect()
}
