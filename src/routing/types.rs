//! Core data types shared across the graph loader, spatial index, CH engine, and facade.

use crate::geo::Coordinate;

/// A road-graph vertex. The position of a `Vertex` in `GraphData::vertices` is its
/// routing-internal node id; `id` is the id carried in the source CSV for provenance only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub id: i64,
    pub lat: f64,
    pub lng: f64,
    pub order_pos: i64,
    pub importance: i64,
}

impl Vertex {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A directed graph edge or CH shortcut, already resolved to internal node indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
    pub via_node: Option<usize>,
}

/// Provenance and counts carried alongside a loaded graph.
#[derive(Debug, Clone, Default)]
pub struct RoutingMetadata {
    pub version: String,
    pub region: String,
    pub generated_at: i64,
    pub vertices_count: i64,
    pub edges_count: i64,
    pub shortcuts_count: i64,
    pub profile: String,
}

impl RoutingMetadata {
    /// §6.1 validation rules. The graph still loads on failure; only queries are gated.
    pub fn is_valid(&self) -> bool {
        !self.version.is_empty()
            && !self.region.is_empty()
            && self.generated_at != 0
            && self.vertices_count > 0
            && self.edges_count > 0
    }
}

/// In-memory road graph: a flat vertex array plus a merged out-adjacency list per vertex
/// (primary edges and shortcuts treated uniformly, per §4.1/§4.3).
pub struct GraphData {
    pub vertices: Vec<Vertex>,
    pub adjacency: Vec<Vec<(usize, f64)>>,
    pub metadata: RoutingMetadata,
}

impl GraphData {
    pub fn new(vertices: Vec<Vertex>, edges: &[Edge], metadata: RoutingMetadata) -> Self {
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); vertices.len()];
        for e in edges {
            if e.from < vertices.len() && e.to < vertices.len() {
                adjacency[e.from].push((e.to, e.weight));
            }
        }
        Self { vertices, adjacency, metadata }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Outcome of snapping a coordinate to the nearest graph vertex (§4.3 "Snap").
#[derive(Debug, Clone, Copy)]
pub struct SnapOutcome {
    pub node_index: usize,
    pub snap_distance_m: f64,
    pub within_range: bool,
}

/// One target of a `one_to_many` query. `radius_m` is the caller's own notification/search
/// radius for this target, used to widen the engine's pre-filter envelope (§4.3 step 2, §9 OQ2)
/// so a large-radius subscriber is never silently excluded.
#[derive(Debug, Clone, Copy)]
pub struct OneToManyTarget {
    pub coordinate: Coordinate,
    pub radius_m: Option<f64>,
}

/// Result of a shortest-path (or Haversine fallback) query between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteResult {
    pub source: Coordinate,
    pub target: Coordinate,
    pub distance_m: f64,
    pub duration_s: f64,
    pub is_reachable: bool,
}

impl RouteResult {
    pub fn unreachable(source: Coordinate, target: Coordinate) -> Self {
        Self { source, target, distance_m: 0.0, duration_s: 0.0, is_reachable: false }
    }
}
