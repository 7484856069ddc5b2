//! Corridor carving between connected rooms over a weighted, orthogonal-only search grid.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::geom::Rect;
use crate::grid::TileGrid;
use crate::pathing::{DiagonalMode, Heuristic, PathGrid};
use crate::types::{NodeId, Pos, TileKind};

use super::error::GenerationError;
use super::model::Node;

const VOID_WEIGHT: u32 = 3;
const NODE_WEIGHT: u32 = 4;
const WALL_WEIGHT: u32 = 12;
const CORRIDOR_WEIGHT: u32 = 1;

/// Span shared by two rooms along one axis, or the gap between them when they do not overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct AxisSpan {
    pub(super) start: i32,
    pub(super) len: i32,
    pub(super) overlaps: bool,
}

fn axis_span(a_start: i32, a_len: i32, b_start: i32, b_len: i32) -> AxisSpan {
    let start = a_start.max(b_start);
    let len = (a_start + a_len).min(b_start + b_len) - start;
    if len > 0 {
        AxisSpan { start, len, overlaps: true }
    } else {
        AxisSpan { start: start + len, len: -len, overlaps: false }
    }
}

pub(super) fn horizontal_space(a: Rect, b: Rect) -> AxisSpan {
    axis_span(a.x, a.width, b.x, b.width)
}

pub(super) fn vertical_space(a: Rect, b: Rect) -> AxisSpan {
    axis_span(a.y, a.height, b.y, b.height)
}

/// Interior cells on the facing edges of two rooms that a corridor should join.
pub(super) fn corridor_endpoints(a: Rect, b: Rect, rng: &mut ChaCha8Rng) -> (Pos, Pos) {
    let h = horizontal_space(a, b);
    let v = vertical_space(a, b);
    if v.overlaps {
        let from_y = v.start + rng.gen_range(0..v.len);
        let to_y = if h.len < 3 { from_y } else { v.start + rng.gen_range(0..v.len) };
        (Pos::new(h.start - 1, from_y), Pos::new(h.start + h.len, to_y))
    } else if h.overlaps {
        let from_x = h.start + rng.gen_range(0..h.len);
        let to_x = if v.len < 3 { from_x } else { h.start + rng.gen_range(0..h.len) };
        (Pos::new(from_x, v.start - 1), Pos::new(to_x, v.start + v.len))
    } else {
        let (left, right) = if a.x < b.x { (a, b) } else { (b, a) };
        let descending = left.y < right.y;
        let from = Pos::new(h.start - 1, if descending { v.start - 1 } else { v.start + v.len });
        let to = Pos::new(h.start + h.len, if descending { v.start + v.len } else { v.start - 1 });
        (from, to)
    }
}

fn weight_for(kind: TileKind) -> u32 {
    match kind {
        TileKind::Void => VOID_WEIGHT,
        TileKind::Node => NODE_WEIGHT,
        TileKind::Wall => WALL_WEIGHT,
    }
}

/// Carves a corridor for every connection, appending one corridor node per carved cell.
/// Ids continue after the highest existing node id.
pub(super) fn carve_corridors(
    grid: &mut TileGrid,
    nodes: &mut Vec<Node>,
    connections: &[(NodeId, NodeId)],
    rng: &mut ChaCha8Rng,
) -> Result<(), GenerationError> {
    let mut pathing =
        PathGrid::new(grid.width(), grid.height(), DiagonalMode::Never, Heuristic::Manhattan);
    solidify_border(&mut pathing, grid.region());
    for node in nodes.iter() {
        for corner in node.rect.outer_corners() {
            pathing.set_solid(corner, true);
        }
    }
    for pos in grid.positions() {
        pathing.set_weight_scale(pos, weight_for(grid.kind(pos)));
    }

    let mut next_id = nodes.iter().map(|node| node.id.0 + 1).max().unwrap_or(0);
    for &(from_room, to_room) in connections {
        let (Some(from_rect), Some(to_rect)) = (room_rect(nodes, from_room), room_rect(nodes, to_room))
        else {
            continue;
        };
        let (from, to) = corridor_endpoints(from_rect, to_rect, rng);

        let mut path = pathing.find_path(from, to);
        if path.is_empty() {
            warn!(?from_room, ?to_room, "corridor blocked by room corners; retrying without them");
            let mut relaxed = pathing.clone();
            relaxed.fill_solid_region(grid.region(), false);
            solidify_border(&mut relaxed, grid.region());
            path = relaxed.find_path(from, to);
        }
        // Placed rooms keep their interiors off the border, so only an endpoint on the border
        // itself ends up here.
        if path.is_empty() {
            return Err(GenerationError::CorridorUnreachable { from: from_room, to: to_room });
        }

        for step in path {
            if grid.is_node(step) {
                continue;
            }
            let id = NodeId(next_id);
            next_id += 1;
            grid.set_node(step, id);
            nodes.push(Node::corridor(id, step));
            pathing.set_weight_scale(step, CORRIDOR_WEIGHT);
        }
    }
    debug!(nodes = nodes.len(), "carved corridors");
    Ok(())
}

/// Corridors never run along the region edge, so wall inference can always close them.
fn solidify_border(pathing: &mut PathGrid, region: Rect) {
    pathing.fill_solid_region(Rect::new(region.x, region.y, region.width, 1), true);
    pathing.fill_solid_region(Rect::new(region.x, region.bottom(), region.width, 1), true);
    pathing.fill_solid_region(Rect::new(region.x, region.y, 1, region.height), true);
    pathing.fill_solid_region(Rect::new(region.right(), region.y, 1, region.height), true);
}

fn room_rect(nodes: &[Node], id: NodeId) -> Option<Rect> {
    nodes.iter().find(|node| node.id == id).map(|node| node.rect)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn spans_report_overlap_or_gap() {
        let left = Rect::new(1, 1, 4, 4);
        let right = Rect::new(6, 2, 4, 4);
        assert_eq!(horizontal_space(left, right), AxisSpan { start: 5, len: 1, overlaps: false });
        assert_eq!(vertical_space(left, right), AxisSpan { start: 2, len: 3, overlaps: true });
    }

    #[test]
    fn side_by_side_rooms_join_through_the_shared_wall() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let (from, to) = corridor_endpoints(Rect::new(1, 1, 4, 4), Rect::new(6, 1, 4, 4), &mut rng);
        assert_eq!(from.x, 4);
        assert_eq!(to.x, 6);
        assert_eq!(from.y, to.y);
        assert!((1..5).contains(&from.y));
    }

    #[test]
    fn stacked_rooms_join_vertically() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let (from, to) = corridor_endpoints(Rect::new(2, 1, 5, 3), Rect::new(3, 8, 5, 3), &mut rng);
        assert_eq!(from.y, 3);
        assert_eq!(to.y, 8);
        assert!((3..7).contains(&from.x) && (3..7).contains(&to.x));
    }

    #[test]
    fn diagonal_rooms_join_at_facing_corners() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let upper_left = Rect::new(1, 1, 3, 3);
        let lower_right = Rect::new(8, 7, 3, 3);
        let (from, to) = corridor_endpoints(upper_left, lower_right, &mut rng);
        assert_eq!(from, Pos::new(3, 3));
        assert_eq!(to, Pos::new(8, 7));
    }

    fn strip_with_rooms(rooms: &[Rect]) -> (TileGrid, Vec<Node>) {
        let mut grid = TileGrid::new(10, 3);
        let mut nodes = Vec::new();
        for (idx, &rect) in rooms.iter().enumerate() {
            let id = NodeId(idx as u32);
            for pos in rect.cells() {
                grid.set_node(pos, id);
            }
            nodes.push(Node::room(id, rect));
        }
        (grid, nodes)
    }

    #[test]
    fn corner_solids_are_dropped_when_they_cut_the_only_route() {
        let rooms = [Rect::new(1, 1, 2, 1), Rect::new(7, 1, 2, 1)];
        let (mut grid, mut nodes) = strip_with_rooms(&rooms);
        // A room below the strip whose upper corners land on (4, 1) and (6, 1).
        nodes.push(Node::room(NodeId(2), Rect::new(5, 2, 1, 1)));
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        carve_corridors(&mut grid, &mut nodes, &[(NodeId(0), NodeId(1))], &mut rng)
            .expect("relaxed search carves");

        let corridors: Vec<&Node> = nodes.iter().filter(|node| !node.is_room()).collect();
        assert_eq!(corridors.len(), 4);
        assert_eq!(corridors[0].id, NodeId(3));
        assert!(corridors.iter().all(|node| node.rect.y == 1));
        assert!((2..=7).all(|x| grid.is_node(Pos::new(x, 1))));
    }

    #[test]
    fn endpoints_on_the_border_are_unreachable() {
        let rooms = [Rect::new(1, 0, 2, 1), Rect::new(7, 0, 2, 1)];
        let (mut grid, mut nodes) = strip_with_rooms(&rooms);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        assert_eq!(
            carve_corridors(&mut grid, &mut nodes, &[(NodeId(0), NodeId(1))], &mut rng),
            Err(GenerationError::CorridorUnreachable { from: NodeId(0), to: NodeId(1) })
        );
        assert!(nodes.iter().all(|node| node.is_room()));
    }

    #[test]
    fn carving_links_two_rooms_with_fresh_ids() {
        let mut grid = TileGrid::new(12, 6);
        let mut nodes = Vec::new();
        for (idx, x) in [1, 7].into_iter().enumerate() {
            let rect = Rect::new(x, 1, 4, 4);
            let id = NodeId(idx as u32);
            for pos in rect.expanded(1).cells() {
                grid.set_wall(pos);
            }
            for pos in rect.cells() {
                grid.set_node(pos, id);
            }
            nodes.push(Node::room(id, rect));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        carve_corridors(&mut grid, &mut nodes, &[(NodeId(0), NodeId(1))], &mut rng)
            .expect("corridor carves");

        let corridors: Vec<&Node> = nodes.iter().filter(|node| !node.is_room()).collect();
        assert_eq!(corridors.len(), 2);
        assert_eq!(corridors[0].id, NodeId(2));
        assert_eq!(corridors[1].id, NodeId(3));
        assert!(corridors.iter().all(|node| node.rect.x == 5 || node.rect.x == 6));
        assert!(corridors.iter().all(|node| grid.node_at(node.rect.position()) == Some(node.id)));
    }
}
