//! C2 — Spatial Index. Grid-hash nearest-neighbor lookup for coordinate -> vertex snapping
//! (§4.2). Distance within the grid is squared Euclidean in degrees, which is only valid
//! for argmin comparisons — callers must re-derive true distance via Haversine.

use std::collections::HashMap;

use super::types::Vertex;
use crate::geo::Coordinate;

/// Degrees-per-kilometer approximations adequate for mid-latitude regions (documented
/// approximation, not a geodesic model).
const LAT_DEG_PER_KM: f64 = 1.0 / 111.0;
const LNG_DEG_PER_KM: f64 = 1.0 / 101.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    lat_cell: i64,
    lng_cell: i64,
}

pub struct SpatialIndex {
    cell_size_lat_deg: f64,
    cell_size_lng_deg: f64,
    cells: HashMap<CellKey, Vec<usize>>,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
    max_ring: i64,
}

impl SpatialIndex {
    /// Builds an index over `vertices` with a grid cell sized `cell_size_km` kilometers.
    /// Idempotent: calling this again on the same inputs produces an equivalent index.
    pub fn build(vertices: &[Vertex], cell_size_km: f64) -> Self {
        let cell_size_km = cell_size_km.max(1e-6);
        let cell_size_lat_deg = cell_size_km * LAT_DEG_PER_KM;
        let cell_size_lng_deg = cell_size_km * LNG_DEG_PER_KM;

        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lng = f64::INFINITY;
        let mut max_lng = f64::NEG_INFINITY;

        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (idx, v) in vertices.iter().enumerate() {
            min_lat = min_lat.min(v.lat);
            max_lat = max_lat.max(v.lat);
            min_lng = min_lng.min(v.lng);
            max_lng = max_lng.max(v.lng);
            let key = cell_key(v.lat, v.lng, cell_size_lat_deg, cell_size_lng_deg);
            cells.entry(key).or_default().push(idx);
        }

        if vertices.is_empty() {
            min_lat = 0.0;
            max_lat = 0.0;
            min_lng = 0.0;
            max_lng = 0.0;
        }

        let lat_span_cells = ((max_lat - min_lat) / cell_size_lat_deg).ceil() as i64;
        let lng_span_cells = ((max_lng - min_lng) / cell_size_lng_deg).ceil() as i64;
        let max_ring = lat_span_cells.max(lng_span_cells).max(0) + 1;

        Self {
            cell_size_lat_deg,
            cell_size_lng_deg,
            cells,
            min_lat,
            max_lat,
            min_lng,
            max_lng,
            max_ring,
        }
    }

    /// Finds the vertex index nearest (in squared-degree distance) to `query`, or `None`
    /// if the index holds no vertices.
    pub fn nearest(&self, vertices: &[Vertex], query: Coordinate) -> Option<usize> {
        if vertices.is_empty() {
            return None;
        }
        let origin = cell_key(query.lat, query.lng, self.cell_size_lat_deg, self.cell_size_lng_deg);

        let mut best: Option<(usize, f64)> = None;
        for ring in 0..=self.max_ring {
            let ring_min_possible = if ring == 0 {
                0.0
            } else {
                let d_lat = (ring - 1) as f64 * self.cell_size_lat_deg;
                let d_lng = (ring - 1) as f64 * self.cell_size_lng_deg;
                (d_lat.min(d_lng)).powi(2)
            };
            if let Some((_, best_d2)) = best {
                if ring_min_possible > best_d2 {
                    break;
                }
            }

            for (lat_cell, lng_cell) in ring_cells(origin, ring) {
                if let Some(indices) = self.cells.get(&CellKey { lat_cell, lng_cell }) {
                    for &idx in indices {
                        let v = &vertices[idx];
                        let dlat = v.lat - query.lat;
                        let dlng = v.lng - query.lng;
                        let d2 = dlat * dlat + dlng * dlng;
                        if best.map(|(_, bd2)| d2 < bd2).unwrap_or(true) {
                            best = Some((idx, d2));
                        }
                    }
                }
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.min_lat, self.max_lat, self.min_lng, self.max_lng)
    }
}

fn cell_key(lat: f64, lng: f64, cell_lat_deg: f64, cell_lng_deg: f64) -> CellKey {
    CellKey { lat_cell: (lat / cell_lat_deg).floor() as i64, lng_cell: (lng / cell_lng_deg).floor() as i64 }
}

/// Perimeter cells of the square ring `ring` around `origin` (ring 0 is just the origin cell).
fn ring_cells(origin: CellKey, ring: i64) -> Vec<(i64, i64)> {
    if ring == 0 {
        return vec![(origin.lat_cell, origin.lng_cell)];
    }
    let mut out = Vec::with_capacity((8 * ring) as usize);
    for d_lat in -ring..=ring {
        for d_lng in -ring..=ring {
            if d_lat.abs() == ring || d_lng.abs() == ring {
                out.push((origin.lat_cell + d_lat, origin.lng_cell + d_lng));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(id: i64, lat: f64, lng: f64) -> Vertex {
        Vertex { id, lat, lng, order_pos: id, importance: 1 }
    }

    #[test]
    fn finds_exact_match() {
        let vertices = vec![v(0, 25.0, 121.0), v(1, 25.1, 121.1), v(2, 26.0, 122.0)];
        let idx = SpatialIndex::build(&vertices, 1.0);
        let found = idx.nearest(&vertices, Coordinate::new(25.1, 121.1)).unwrap();
        assert_eq!(found, 1);
    }

    #[test]
    fn finds_nearest_among_sparse_far_apart_points() {
        let vertices = vec![v(0, 0.0, 0.0), v(1, 10.0, 10.0), v(2, -10.0, -10.0)];
        let idx = SpatialIndex::build(&vertices, 1.0);
        let found = idx.nearest(&vertices, Coordinate::new(9.9, 9.9)).unwrap();
        assert_eq!(found, 1);
    }

    #[test]
    fn empty_index_returns_none() {
        let vertices: Vec<Vertex> = vec![];
        let idx = SpatialIndex::build(&vertices, 1.0);
        assert_eq!(idx.nearest(&vertices, Coordinate::new(0.0, 0.0)), None);
    }

    #[test]
    fn ring_expansion_terminates_for_single_point_far_from_query() {
        let vertices = vec![v(0, 50.0, 50.0)];
        let idx = SpatialIndex::build(&vertices, 1.0);
        let found = idx.nearest(&vertices, Coordinate::new(0.0, 0.0)).unwrap();
        assert_eq!(found, 0);
    }
}
