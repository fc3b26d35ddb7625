//! C4 — Routing Facade. The public routing contract the orchestrator depends on:
//! selects the CH engine when ready, falls back to parallel Haversine otherwise
//! (§4.4). Grounded on the fallback-on-failure shape of
//! `other_examples/.../dpapukchiev-ride-hailing-simulation` `CachedRouteProvider`.

use std::sync::mpsc;

use tracing::warn;

use super::engine::ChEngine;
use super::types::{OneToManyTarget, RouteResult};
use crate::cancel::CancellationToken;
use crate::config::RoutingConfig;
use crate::error::{AppError, AppResult};
use crate::geo::{duration_seconds, haversine_meters, Coordinate};

const HAVERSINE_WORKER_CAP: usize = 10;

pub struct RoutingFacade {
    engine: ChEngine,
    config: RoutingConfig,
}

impl RoutingFacade {
    pub fn new(engine: ChEngine, config: RoutingConfig) -> Self {
        Self { engine, config }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    pub fn load_data(&self, dir: &str) -> AppResult<()> {
        self.engine.load_data(dir)
    }

    /// Coordinate validity is enforced here, before any CH/Haversine call (§4.4).
    pub fn find_nearest_node(&self, coord: Coordinate) -> AppResult<(usize, bool)> {
        if !coord.is_valid() {
            return Err(AppError::invalid_input("INVALID_COORDINATE", "coordinate out of range or non-finite"));
        }
        let snap = self.engine.find_nearest_node(coord)?;
        Ok((snap.node_index, snap.within_range))
    }

    /// Straight single-pair distance. Invalid coordinates degrade to `reachable:false`
    /// rather than erroring, so batch flows don't abort on one bad point (§4.4).
    pub fn calculate_distance(&self, source: Coordinate, target: Coordinate) -> RouteResult {
        if !source.is_valid() || !target.is_valid() {
            return RouteResult::unreachable(source, target);
        }
        if self.engine.is_ready() {
            match self.engine.shortest_path(source, target) {
                Ok(result) => return result,
                Err(e) => warn!(target: "nomnom_radar::routing", "CH engine errored, falling back to haversine: {e}"),
            }
        }
        self.haversine_distance(source, target)
    }

    fn haversine_distance(&self, source: Coordinate, target: Coordinate) -> RouteResult {
        let distance_m = haversine_meters(source, target);
        RouteResult {
            source,
            target,
            distance_m,
            duration_s: duration_seconds(distance_m, self.config.default_speed_kmh),
            is_reachable: true,
        }
    }

    /// One-to-Many (§4.3/§4.4). Falls back to parallel Haversine whenever the CH engine
    /// is not ready or a CH call errors; the result shape is identical either way so the
    /// orchestrator is agnostic to which path ran (§9 "Fallback is first-class").
    pub fn one_to_many(
        &self,
        source: Coordinate,
        targets: &[OneToManyTarget],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<RouteResult>> {
        if !source.is_valid() {
            return Err(AppError::invalid_input("INVALID_COORDINATE", "source coordinate invalid"));
        }
        for t in targets {
            if !t.coordinate.is_valid() {
                return Err(AppError::invalid_input("INVALID_COORDINATE", "target coordinate invalid"));
            }
        }

        if self.engine.is_ready() {
            match self.engine.one_to_many(source, targets, cancel) {
                Ok(results) => return Ok(results),
                Err(AppError::Canceled { .. }) => {
                    return Err(AppError::canceled("one_to_many canceled"));
                }
                Err(e) => {
                    warn!(target: "nomnom_radar::routing", "CH one_to_many errored, falling back to haversine: {e}");
                }
            }
        }

        self.haversine_one_to_many(source, targets, cancel)
    }

    fn haversine_one_to_many(
        &self,
        source: Coordinate,
        targets: &[OneToManyTarget],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<RouteResult>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let worker_count = HAVERSINE_WORKER_CAP.min(targets.len());
        let speed_kmh = self.config.default_speed_kmh;

        let (job_tx, job_rx) = mpsc::sync_channel::<usize>(targets.len());
        for i in 0..targets.len() {
            job_tx.send(i).expect("job channel sized to target count");
        }
        drop(job_tx);
        let job_rx = std::sync::Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<(usize, f64)>();

        let mut results: Vec<RouteResult> =
            targets.iter().map(|t| RouteResult::unreachable(source, t.coordinate)).collect();

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                let job_rx = &job_rx;
                let result_tx = result_tx.clone();
                scope.spawn(move || loop {
                    if cancel.is_canceled() {
                        break;
                    }
                    let job = { job_rx.lock().unwrap().recv() };
                    let Ok(idx) = job else { break };
                    let distance_m = haversine_meters(source, targets[idx].coordinate);
                    let _ = result_tx.send((idx, distance_m));
                });
            }
            drop(result_tx);
            for (idx, distance_m) in result_rx {
                results[idx] = RouteResult {
                    source,
                    target: targets[idx].coordinate,
                    distance_m,
                    duration_s: duration_seconds(distance_m, speed_kmh),
                    is_reachable: true,
                };
            }
        });

        if cancel.is_canceled() {
            return Err(AppError::canceled("haversine one_to_many canceled"));
        }
        Ok(results)
    }
}
