//! Connection selection: triangulation graph, Kruskal spanning tree, bonus loops, dead ends.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::geom::{Point, Segment};
use crate::types::NodeId;

use super::triangulation::triangulate;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Site {
    pub(super) point: Point,
    pub(super) room: NodeId,
}

/// Undirected edge between two sites, by index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Edge {
    pub(super) a: usize,
    pub(super) b: usize,
    pub(super) length: f64,
}

impl Edge {
    fn new(sites: &[Site], a: usize, b: usize) -> Self {
        Self { a, b, length: sites[a].point.distance_to(sites[b].point) }
    }

    pub(super) fn segment(&self, sites: &[Site]) -> Segment {
        Segment::new(sites[self.a].point, sites[self.b].point)
    }

    fn key(&self) -> (usize, usize) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

pub(super) struct Selection {
    pub(super) graph: Vec<Edge>,
    pub(super) connections: Vec<Edge>,
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u32>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect(), rank: vec![0; len] }
    }

    fn find(&mut self, node: usize) -> usize {
        let parent = self.parent[node];
        if parent != node {
            let root = self.find(parent);
            self.parent[node] = root;
        }
        self.parent[node]
    }

    /// Returns false when both nodes already share a root.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            Ordering::Greater => self.parent[root_b] = root_a,
            Ordering::Less => self.parent[root_a] = root_b,
            Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
        true
    }
}

/// Deduplicated undirected edges of the triangles, in first-seen order.
pub(super) fn graph_edges(sites: &[Site], triangles: &[[usize; 3]]) -> Vec<Edge> {
    let mut seen = BTreeSet::new();
    let mut edges = Vec::new();
    for &[a, b, c] in triangles {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            let edge = Edge::new(sites, from, to);
            if seen.insert(edge.key()) {
                edges.push(edge);
            }
        }
    }
    edges
}

fn complete_graph(sites: &[Site]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for a in 0..sites.len() {
        for b in a + 1..sites.len() {
            edges.push(Edge::new(sites, a, b));
        }
    }
    edges
}

/// Kruskal over `edges`, shortest first. Ties keep input order.
pub(super) fn minimum_spanning_tree(site_count: usize, edges: &[Edge]) -> Vec<Edge> {
    let mut sorted = edges.to_vec();
    sorted.sort_by(|left, right| left.length.total_cmp(&right.length));

    let mut sets = UnionFind::new(site_count);
    let mut tree = Vec::with_capacity(site_count.saturating_sub(1));
    for edge in sorted {
        if tree.len() + 1 >= site_count.max(1) {
            break;
        }
        if sets.union(edge.a, edge.b) {
            tree.push(edge);
        }
    }
    tree
}

/// Picks the connections to carve: a spanning tree over the sites plus
/// `floor(tree_len * ratio)` random extra edges from the triangulation graph.
pub(super) fn select_connections(
    sites: &[Site],
    ratio: f64,
    retries: u32,
    rng: &mut ChaCha8Rng,
) -> Selection {
    let points: Vec<Point> = sites.iter().map(|site| site.point).collect();
    let mut graph = if sites.len() < 3 {
        complete_graph(sites)
    } else {
        graph_edges(sites, &triangulate(&points))
    };

    let mut connections = minimum_spanning_tree(sites.len(), &graph);
    if connections.len() + 1 < sites.len() {
        warn!(
            sites = sites.len(),
            tree_edges = connections.len(),
            "triangulation does not span every room; using the complete site graph"
        );
        graph = complete_graph(sites);
        connections = minimum_spanning_tree(sites.len(), &graph);
    }

    let mut additional = (connections.len() as f64 * ratio) as usize;
    let mut retries_left = retries;
    while additional > 0 && !graph.is_empty() {
        let candidate = graph[rng.gen_range(0..graph.len())];
        if !connections.iter().any(|edge| edge.key() == candidate.key()) {
            connections.push(candidate);
            additional -= 1;
        }
        if retries_left == 0 {
            break;
        }
        retries_left -= 1;
    }

    debug!(graph_edges = graph.len(), connections = connections.len(), "selected connections");
    Selection { graph, connections }
}

/// Rooms at connection endpoints that no other connection touches.
pub(super) fn dead_end_rooms(sites: &[Site], connections: &[Edge]) -> BTreeSet<NodeId> {
    let segments: Vec<Segment> = connections.iter().map(|edge| edge.segment(sites)).collect();
    let mut dead_ends = BTreeSet::new();
    for (edge, segment) in connections.iter().zip(&segments) {
        let touched = |point: Point| {
            segments.iter().any(|other| !other.equivalent(segment) && other.has(point))
        };
        if !touched(segment.a) {
            dead_ends.insert(sites[edge.a].room);
        }
        if !touched(segment.b) {
            dead_ends.insert(sites[edge.b].room);
        }
    }
    dead_ends
}
