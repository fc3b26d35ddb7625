//! Routing subsystem: graph loading (C1), spatial indexing (C2), the CH engine (C3),
//! and the public facade (C4) the notification orchestrator depends on.

pub mod engine;
pub mod facade;
pub mod graph;
pub mod spatial_index;
pub mod types;

pub use engine::ChEngine;
pub use facade::RoutingFacade;
pub use types::{Edge, GraphData, OneToManyTarget, RouteResult, RoutingMetadata, SnapOutcome, Vertex};
