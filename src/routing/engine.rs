//! C3 — CH Routing Engine. Snapping, single-pair shortest path, and worker-pool
//! One-to-Many over the merged edge/shortcut graph (§4.3).
//!
//! State is guarded by a `parking_lot::RwLock`: readers (queries) hold shared access for
//! the duration of a query; `load_data` takes exclusive access and swaps in a freshly built
//! instance rather than mutating the live graph, so in-flight queries see a consistent view
//! (§9 "Engine hot-swap").

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::mpsc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::graph::load_graph_dir;
use super::spatial_index::SpatialIndex;
use super::types::{GraphData, OneToManyTarget, RouteResult, SnapOutcome};
use crate::cancel::CancellationToken;
use crate::config::RoutingConfig;
use crate::error::{AppError, AppResult};
use crate::geo::{duration_seconds, haversine_meters, Coordinate};

struct EngineState {
    graph: GraphData,
    spatial: SpatialIndex,
    metadata_valid: bool,
}

pub struct ChEngine {
    state: RwLock<Option<EngineState>>,
    config: RoutingConfig,
}

impl ChEngine {
    pub fn new(config: RoutingConfig) -> Self {
        Self { state: RwLock::new(None), config }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state.read().as_ref(), Some(state) if state.metadata_valid)
    }

    /// Loads a graph directory and atomically publishes it. The previous graph (if any)
    /// keeps serving queries from any readers already in flight until they finish; new
    /// queries observe the new graph as soon as this returns.
    pub fn load_data(&self, dir: &str) -> AppResult<()> {
        let graph = load_graph_dir(dir).map_err(|e| AppError::internal(format!("{e:#}")))?;
        let metadata_valid = graph.metadata.is_valid();
        if !metadata_valid {
            warn!(
                target: "nomnom_radar::routing",
                "graph metadata at {dir} failed validation (vertices={}, edges={}, generated_at={}); \
                 graph loads but queries will be refused until a valid graph is loaded",
                graph.metadata.vertices_count, graph.metadata.edges_count, graph.metadata.generated_at
            );
        }
        let spatial = SpatialIndex::build(&graph.vertices, self.config.grid_cell_size_km);
        let vertex_count = graph.len();
        *self.state.write() = Some(EngineState { graph, spatial, metadata_valid });
        info!(target: "nomnom_radar::routing", "engine loaded graph from {dir}: {vertex_count} vertices");
        Ok(())
    }

    pub fn find_nearest_node(&self, coord: Coordinate) -> AppResult<SnapOutcome> {
        let guard = self.state.read();
        let state = ready_state(guard.as_ref())?;
        snap(state, &self.config, coord)
    }

    pub fn shortest_path(&self, from: Coordinate, to: Coordinate) -> AppResult<RouteResult> {
        let guard = self.state.read();
        let state = ready_state(guard.as_ref())?;

        let from_snap = snap(state, &self.config, from);
        let to_snap = snap(state, &self.config, to);
        let (from_snap, to_snap) = match (from_snap, to_snap) {
            (Ok(f), Ok(t)) if f.within_range && t.within_range => (f, t),
            _ => return Ok(RouteResult::unreachable(from, to)),
        };

        if from_snap.node_index == to_snap.node_index {
            return Ok(RouteResult { source: from, target: to, distance_m: 0.0, duration_s: 0.0, is_reachable: true });
        }

        // A single-pair query has no caller-supplied cancellation token; this one never fires.
        let no_cancel = CancellationToken::new();
        match dijkstra(&state.graph, from_snap.node_index, to_snap.node_index, &no_cancel) {
            DijkstraOutcome::Distance(distance_m) => Ok(RouteResult {
                source: from,
                target: to,
                distance_m,
                duration_s: duration_seconds(distance_m, self.config.default_speed_kmh),
                is_reachable: true,
            }),
            DijkstraOutcome::Unreachable | DijkstraOutcome::Canceled => Ok(RouteResult::unreachable(from, to)),
        }
    }

    /// One-to-Many shortest path (§4.3). `targets` is index-aligned with the returned
    /// vector. A snap failure on `source` is surfaced as an error (the facade falls back
    /// to Haversine on any such error per §4.4).
    pub fn one_to_many(
        &self,
        source: Coordinate,
        targets: &[OneToManyTarget],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<RouteResult>> {
        let guard = self.state.read();
        let state = ready_state(guard.as_ref())?;

        let source_snap = snap(state, &self.config, source)?;
        if !source_snap.within_range {
            return Err(AppError::snap_distance_exceeded(format!(
                "source snap distance {:.1}m exceeds max",
                source_snap.snap_distance_m
            )));
        }

        let prefilter_radius_m = self.prefilter_radius_meters(targets);

        let mut results: Vec<RouteResult> =
            targets.iter().map(|t| RouteResult::unreachable(source, t.coordinate)).collect();
        let mut jobs: Vec<(usize, usize)> = Vec::new(); // (target_idx, snapped_node)

        for (i, t) in targets.iter().enumerate() {
            if haversine_meters(source, t.coordinate) > prefilter_radius_m {
                continue; // pre-filtered: outside coarse envelope, not routed
            }
            match snap(state, &self.config, t.coordinate) {
                Ok(s) if s.within_range => jobs.push((i, s.node_index)),
                _ => continue, // snap failure degrades to unreachable, not an error, in one-to-many
            }
        }

        if jobs.is_empty() || cancel.is_canceled() {
            if cancel.is_canceled() {
                return Err(AppError::canceled("one_to_many canceled before dispatch"));
            }
            return Ok(results);
        }

        let worker_count = self.config.one_to_many_workers.max(1).min(jobs.len());
        let graph = &state.graph;
        let source_node = source_snap.node_index;
        let speed_kmh = self.config.default_speed_kmh;

        let (job_tx, job_rx) = mpsc::sync_channel::<(usize, usize)>(jobs.len());
        for job in jobs {
            job_tx.send(job).expect("job channel sized to job count");
        }
        drop(job_tx);
        let job_rx = std::sync::Mutex::new(job_rx);

        let (result_tx, result_rx) = mpsc::channel::<(usize, Option<f64>)>();

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                let job_rx = &job_rx;
                let result_tx = result_tx.clone();
                scope.spawn(move || loop {
                    if cancel.is_canceled() {
                        break;
                    }
                    let job = { job_rx.lock().unwrap().recv() };
                    let Ok((target_idx, target_node)) = job else { break };
                    if target_node == source_node {
                        let _ = result_tx.send((target_idx, Some(0.0)));
                        continue;
                    }
                    match dijkstra(graph, source_node, target_node, cancel) {
                        DijkstraOutcome::Distance(d) => {
                            let _ = result_tx.send((target_idx, Some(d)));
                        }
                        DijkstraOutcome::Unreachable => {
                            let _ = result_tx.send((target_idx, None));
                        }
                        DijkstraOutcome::Canceled => break,
                    }
                });
            }
            drop(result_tx);
            for (target_idx, distance) in result_rx {
                if let Some(distance_m) = distance {
                    results[target_idx] = RouteResult {
                        source,
                        target: targets[target_idx].coordinate,
                        distance_m,
                        duration_s: duration_seconds(distance_m, speed_kmh),
                        is_reachable: true,
                    };
                }
            }
        });

        if cancel.is_canceled() {
            return Err(AppError::canceled("one_to_many canceled during dispatch"));
        }

        Ok(results)
    }

    /// Resolved pre-filter envelope (§9 OQ2): the larger of the configured max query
    /// radius and the largest per-target radius actually requested, times the multiplier.
    fn prefilter_radius_meters(&self, targets: &[OneToManyTarget]) -> f64 {
        let max_target_radius_m =
            targets.iter().filter_map(|t| t.radius_m).fold(0.0_f64, f64::max);
        let base_m = self.config.max_query_radius_meters().max(max_target_radius_m);
        base_m * self.config.pre_filter_radius_multiplier
    }
}

/// Rejects both "no graph loaded yet" and "graph loaded but metadata failed validation"
/// (§6.1 invariant: the engine refuses to serve queries in either case).
fn ready_state(state: Option<&EngineState>) -> AppResult<&EngineState> {
    let state = state.ok_or_else(|| AppError::engine_not_ready("graph not loaded"))?;
    if !state.metadata_valid {
        return Err(AppError::engine_not_ready("graph metadata failed validation"));
    }
    Ok(state)
}

fn snap(state: &EngineState, config: &RoutingConfig, coord: Coordinate) -> AppResult<SnapOutcome> {
    let idx = state
        .spatial
        .nearest(&state.graph.vertices, coord)
        .ok_or_else(|| AppError::not_found("NO_VERTICES", "graph has no vertices to snap to"))?;
    let d = haversine_meters(coord, state.graph.vertices[idx].coordinate());
    let within_range = d <= config.max_snap_distance_meters();
    Ok(SnapOutcome { node_index: idx, snap_distance_m: d, within_range })
}

#[derive(PartialEq)]
struct HeapItem {
    cost: f64,
    node: usize,
}
impl Eq for HeapItem {}
impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the smallest cost first.
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}
impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum DijkstraOutcome {
    Distance(f64),
    Unreachable,
    Canceled,
}

/// Workers poll `cancel` between jobs; this is the "between Dijkstra iterations" half of
/// that contract (§5) — checked every `CANCEL_CHECK_INTERVAL` pops so a run on a large
/// graph can still be aborted within bounded work instead of running to completion.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Single-pair Dijkstra over the merged adjacency. Terminates as soon as `target` is
/// popped from the frontier.
fn dijkstra(graph: &GraphData, source: usize, target: usize, cancel: &CancellationToken) -> DijkstraOutcome {
    let mut dist = vec![f64::INFINITY; graph.len()];
    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    heap.push(HeapItem { cost: 0.0, node: source });

    let mut pops = 0usize;
    while let Some(HeapItem { cost, node }) = heap.pop() {
        pops += 1;
        if pops % CANCEL_CHECK_INTERVAL == 0 && cancel.is_canceled() {
            return DijkstraOutcome::Canceled;
        }
        if node == target {
            return DijkstraOutcome::Distance(cost);
        }
        if cost > dist[node] {
            continue;
        }
        for &(to, weight) in &graph.adjacency[node] {
            let next_cost = cost + weight;
            if next_cost < dist[to] {
                dist[to] = next_cost;
                heap.push(HeapItem { cost: next_cost, node: to });
            }
        }
    }
    DijkstraOutcome::Unreachable
}
