use std::fs::File;
use std::io::Write;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode, Throughput};

use nomnom_radar::cancel::CancellationToken;
use nomnom_radar::config::RoutingConfig;
use nomnom_radar::geo::Coordinate;
use nomnom_radar::routing::{ChEngine, OneToManyTarget};

/// Writes a `side x side` grid graph (4-connected, unit-weight edges) as a graph directory
/// the engine's loader understands, and returns the engine plus the vertex count.
fn build_grid_engine(side: usize) -> (ChEngine, usize) {
    let tmp = tempfile::tempdir().unwrap();
    let mut vertices = String::from("id,lat,lng,order_pos,importance\n");
    let mut edges = String::from("from,to,weight\n");

    let step_deg = 0.001;
    for row in 0..side {
        for col in 0..side {
            let id = row * side + col;
            let lat = 25.0 + row as f64 * step_deg;
            let lng = 121.0 + col as f64 * step_deg;
            vertices.push_str(&format!("{id},{lat},{lng},{id},1\n"));
            if col + 1 < side {
                let right = id + 1;
                edges.push_str(&format!("{id},{right},100.0\n{right},{id},100.0\n"));
            }
            if row + 1 < side {
                let down = id + side;
                edges.push_str(&format!("{id},{down},100.0\n{down},{id},100.0\n"));
            }
        }
    }

    File::create(tmp.path().join("vertices.csv")).unwrap().write_all(vertices.as_bytes()).unwrap();
    File::create(tmp.path().join("edges.csv")).unwrap().write_all(edges.as_bytes()).unwrap();
    let metadata = format!(
        r#"{{"version":"1.0","source":{{"region":"grid"}},"processing":{{"generated_at":1700000000}},
           "output":{{"vertices_count":{},"edges_count":1,"shortcuts_count":0}}}}"#,
        side * side
    );
    File::create(tmp.path().join("metadata.json")).unwrap().write_all(metadata.as_bytes()).unwrap();

    let config = RoutingConfig { max_snap_distance_km: 50.0, ..RoutingConfig::default() };
    let engine = ChEngine::new(config);
    engine.load_data(tmp.path().to_str().unwrap()).unwrap();
    // tmp is dropped here; the engine has already read everything it needs into memory.
    (engine, side * side)
}

fn corner_coordinate(side: usize, step_deg: f64) -> Coordinate {
    let last = side.saturating_sub(1) as f64;
    Coordinate::new(25.0 + last * step_deg, 121.0 + last * step_deg)
}

fn bench_shortest_path(c: &mut Criterion) {
    let sides = [20usize, 60usize];
    let mut group = c.benchmark_group("shortest_path_grid");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(20);

    for &side in &sides {
        let (engine, vertex_count) = build_grid_engine(side);
        let origin = Coordinate::new(25.0, 121.0);
        let far_corner = corner_coordinate(side, 0.001);
        group.throughput(Throughput::Elements(vertex_count as u64));
        group.bench_with_input(BenchmarkId::new("corner_to_corner", vertex_count), &vertex_count, |b, _| {
            b.iter(|| {
                let result = engine.shortest_path(origin, far_corner).unwrap();
                criterion::black_box(result.distance_m);
            });
        });
    }

    group.finish();
}

fn bench_one_to_many(c: &mut Criterion) {
    let sides = [20usize, 60usize];
    let mut group = c.benchmark_group("one_to_many_grid");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);

    for &side in &sides {
        let (engine, vertex_count) = build_grid_engine(side);
        let origin = Coordinate::new(25.0, 121.0);
        let step_deg = 0.001;
        let targets: Vec<OneToManyTarget> = (0..side)
            .map(|i| OneToManyTarget {
                coordinate: Coordinate::new(25.0 + i as f64 * step_deg, 121.0 + i as f64 * step_deg),
                radius_m: Some(50_000.0),
            })
            .collect();
        group.throughput(Throughput::Elements(targets.len() as u64));
        group.bench_with_input(BenchmarkId::new("diagonal_targets", vertex_count), &vertex_count, |b, _| {
            b.iter(|| {
                let cancel = CancellationToken::new();
                let results = engine.one_to_many(origin, &targets, &cancel).unwrap();
                criterion::black_box(results.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shortest_path, bench_one_to_many);
criterion_main!(benches);
