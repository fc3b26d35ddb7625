//! C1 — Graph Loader. Reads `vertices.csv`, `edges.csv`, an optional `shortcuts.csv`, and
//! `metadata.json` from a directory into in-memory `GraphData` (§4.1, §6.1).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

use super::types::{Edge, GraphData, RoutingMetadata, Vertex};

#[derive(Debug, Deserialize, Default)]
struct MetadataSource {
    region: String,
}

#[derive(Debug, Deserialize, Default)]
struct MetadataProcessing {
    generated_at: i64,
    profile: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct MetadataOutput {
    vertices_count: i64,
    edges_count: i64,
    shortcuts_count: i64,
}

#[derive(Debug, Deserialize, Default)]
struct MetadataFile {
    version: String,
    #[serde(default)]
    source: MetadataSource,
    #[serde(default)]
    processing: MetadataProcessing,
    #[serde(default)]
    output: MetadataOutput,
}

/// Loads a full graph from a data directory. `shortcuts.csv` may be absent (empty list,
/// not fatal); a missing/malformed `metadata.json` is tolerated — the graph still loads,
/// but `RoutingMetadata::is_valid()` will report false and the engine refuses queries.
pub fn load_graph_dir(dir: impl AsRef<Path>) -> Result<GraphData> {
    let dir = dir.as_ref();
    let vertices = parse_vertices_csv(&dir.join("vertices.csv"))
        .with_context(|| format!("loading vertices.csv from {}", dir.display()))?;
    let mut edges = parse_edge_like_csv(&dir.join("edges.csv"), false)
        .with_context(|| format!("loading edges.csv from {}", dir.display()))?;
    let shortcuts_path = dir.join("shortcuts.csv");
    if shortcuts_path.exists() {
        let mut shortcuts = parse_edge_like_csv(&shortcuts_path, true)
            .with_context(|| format!("loading shortcuts.csv from {}", shortcuts_path.display()))?;
        edges.append(&mut shortcuts);
    }

    let edges = drop_out_of_range_edges(edges, vertices.len());

    let metadata = load_metadata(&dir.join("metadata.json"));

    Ok(GraphData::new(vertices, &edges, metadata))
}

fn drop_out_of_range_edges(edges: Vec<Edge>, vertex_count: usize) -> Vec<Edge> {
    edges.into_iter().filter(|e| e.from < vertex_count && e.to < vertex_count).collect()
}

fn parse_vertices_csv(path: &Path) -> Result<Vec<Vertex>> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut vertices = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if lineno == 0 {
            continue; // header
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 5 {
            bail!("vertices.csv:{}: expected 5 fields, got {}", lineno + 1, fields.len());
        }
        let id: i64 = fields[0]
            .trim()
            .parse()
            .with_context(|| format!("vertices.csv:{}: bad id", lineno + 1))?;
        let lat: f64 = fields[1]
            .trim()
            .parse()
            .with_context(|| format!("vertices.csv:{}: bad lat", lineno + 1))?;
        let lng: f64 = fields[2]
            .trim()
            .parse()
            .with_context(|| format!("vertices.csv:{}: bad lng", lineno + 1))?;
        let order_pos: i64 = fields[3]
            .trim()
            .parse()
            .with_context(|| format!("vertices.csv:{}: bad order_pos", lineno + 1))?;
        let importance: i64 = fields[4]
            .trim()
            .parse()
            .with_context(|| format!("vertices.csv:{}: bad importance", lineno + 1))?;
        vertices.push(Vertex { id, lat, lng, order_pos, importance });
    }
    Ok(vertices)
}

/// Parses `edges.csv` (`from,to,weight`) or `shortcuts.csv` (`from,to,weight,via_node`).
fn parse_edge_like_csv(path: &Path, has_via_node: bool) -> Result<Vec<Edge>> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let expected_fields = if has_via_node { 4 } else { 3 };
    let mut edges = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if lineno == 0 {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != expected_fields {
            bail!(
                "{}:{}: expected {} fields, got {}",
                path.display(),
                lineno + 1,
                expected_fields,
                fields.len()
            );
        }
        let from: i64 = fields[0]
            .trim()
            .parse()
            .with_context(|| format!("{}:{}: bad from", path.display(), lineno + 1))?;
        let to: i64 = fields[1]
            .trim()
            .parse()
            .with_context(|| format!("{}:{}: bad to", path.display(), lineno + 1))?;
        let weight: f64 = fields[2]
            .trim()
            .parse()
            .with_context(|| format!("{}:{}: bad weight", path.display(), lineno + 1))?;
        if from < 0 || to < 0 {
            bail!("{}:{}: negative vertex index", path.display(), lineno + 1);
        }
        let via_node = if has_via_node {
            let v: i64 = fields[3]
                .trim()
                .parse()
                .with_context(|| format!("{}:{}: bad via_node", path.display(), lineno + 1))?;
            Some(v as usize)
        } else {
            None
        };
        edges.push(Edge { from: from as usize, to: to as usize, weight, via_node });
    }
    Ok(edges)
}

fn load_metadata(path: &Path) -> RoutingMetadata {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(target: "nomnom_radar::routing", "metadata.json missing or unreadable at {}: {e}", path.display());
            return RoutingMetadata::default();
        }
    };
    match serde_json::from_str::<MetadataFile>(&contents) {
        Ok(m) => RoutingMetadata {
            version: m.version,
            region: m.source.region,
            generated_at: m.processing.generated_at,
            vertices_count: m.output.vertices_count,
            edges_count: m.output.edges_count,
            shortcuts_count: m.output.shortcuts_count,
            profile: m.processing.profile.unwrap_or_default(),
        },
        Err(e) => {
            warn!(target: "nomnom_radar::routing", "metadata.json malformed at {}: {e}", path.display());
            RoutingMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn loads_minimal_graph_without_shortcuts_or_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "vertices.csv",
            "id,lat,lng,order_pos,importance\n0,25.0330,121.5654,0,1\n1,25.0335,121.5660,1,2\n",
        );
        write_file(tmp.path(), "edges.csv", "from,to,weight\n0,1,100.0\n");

        let graph = load_graph_dir(tmp.path()).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.adjacency[0], vec![(1, 100.0)]);
        assert!(!graph.metadata.is_valid());
    }

    #[test]
    fn loads_shortcuts_when_present_and_merges_into_adjacency() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(
            tmp.path(),
            "vertices.csv",
            "id,lat,lng,order_pos,importance\n0,0.0,0.0,0,1\n1,0.0,0.0,1,2\n2,0.0,0.0,2,3\n",
        );
        write_file(tmp.path(), "edges.csv", "from,to,weight\n0,1,5.0\n");
        write_file(tmp.path(), "shortcuts.csv", "from,to,weight,via_node\n0,2,8.0,1\n");

        let graph = load_graph_dir(tmp.path()).unwrap();
        assert_eq!(graph.adjacency[0].len(), 2);
    }

    #[test]
    fn out_of_range_edges_are_dropped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "vertices.csv", "id,lat,lng,order_pos,importance\n0,0.0,0.0,0,1\n");
        write_file(tmp.path(), "edges.csv", "from,to,weight\n0,99,1.0\n");

        let graph = load_graph_dir(tmp.path()).unwrap();
        assert!(graph.adjacency[0].is_empty());
    }

    #[test]
    fn valid_metadata_is_recognized() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "vertices.csv", "id,lat,lng,order_pos,importance\n0,0.0,0.0,0,1\n1,0.0,0.0,1,2\n");
        write_file(tmp.path(), "edges.csv", "from,to,weight\n0,1,1.0\n");
        write_file(
            tmp.path(),
            "metadata.json",
            r#"{"version":"1.0","source":{"region":"taipei"},"processing":{"generated_at":1700000000},"output":{"vertices_count":2,"edges_count":1,"shortcuts_count":0}}"#,
        );

        let graph = load_graph_dir(tmp.path()).unwrap();
        assert!(graph.metadata.is_valid());
        assert_eq!(graph.metadata.region, "taipei");
    }

    #[test]
    fn malformed_vertex_line_fails_load_with_line_number() {
        let tmp = tempfile::tempdir().unwrap();
        write_file(tmp.path(), "vertices.csv", "id,lat,lng,order_pos,importance\nnot_a_number,0.0,0.0,0,1\n");
        write_file(tmp.path(), "edges.csv", "from,to,weight\n");

        let err = load_graph_dir(tmp.path()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("vertices.csv:2"), "{msg}");
    }
}
