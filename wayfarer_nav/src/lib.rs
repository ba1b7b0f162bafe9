// wayfarer_nav — tile navmesh construction and path search.
//
// This crate holds all navigation logic for Wayfarer: the tile-world
// capability, the pluggable movement rules, navmesh construction, A*,
// reachability and path planning. It spawns no threads of its own (the
// optional parallel adjacency build borrows the rayon pool) and knows
// nothing about handles, queues or callbacks; `wayfarer_runtime` layers the
// asynchronous request processing on top.
//
// Module overview:
// - `types.rs`:        TilePoint, Vec2, Hitbox, NodeId, EdgeTypeId, TILE_SIZE.
// - `world.rs`:        TileWorld trait, TileShape, dense TileGrid.
// - `cancel.rs`:       CancelToken / CancelSignal and the `Cancelled` error.
// - `config.rs`:       NavMeshParams, NavigatorParams and their serde forms.
// - `presets.rs`:      Stock validity, jump-velocity and end-selection functions.
// - `edge.rs`:         Edge, PathEdge, ExpandContext, the EdgeBehavior trait.
// - `edge_types.rs`:   Built-in Walk, Fall and Jump rules.
// - `registry.rs`:     EdgeTypeRegistry, id assignment for movement rules.
// - `navmesh.rs`:      NavGraph + NavMesh::build (region scan, adjacency).
// - `pathfinding.rs`:  A* with admissible or edge-scaled heuristic.
// - `reachability.rs`: BFS over the graph for goal selection.
// - `planner.rs`:      Start/goal selection feeding A*.
// - `path_result.rs`:  Steppable PathResult handed to navigators.
// - `debug.rs`:        Edge lists and jump arcs for host debug drawing.
//
// **Determinism.** For a fixed world snapshot, registry and parameters, a
// build produces the same nodes, the same edges in the same order, and A*
// returns the same path. Hash maps use `rustc-hash` (fixed hasher) and every
// iteration that affects output goes through an explicit order.
//
// Coordinates follow the host world: `+y` is down, tiles are 16 pixels.

pub mod cancel;
pub mod config;
pub mod debug;
pub mod edge;
pub mod edge_types;
pub mod navmesh;
pub mod path_result;
pub mod pathfinding;
pub mod planner;
pub mod presets;
pub mod reachability;
pub mod registry;
pub mod types;
pub mod world;

pub use cancel::{CancelSignal, CancelToken, Cancelled};
pub use config::{HeuristicMode, JumpRange, NavMeshParams, NavigatorConfig, NavigatorParams};
pub use edge::{Edge, EdgeBehavior, ExpandContext, PathEdge};
pub use edge_types::{Fall, Jump, Walk};
pub use navmesh::{AdjacencyMode, NavGraph, NavMesh, ScanRegion};
pub use path_result::PathResult;
pub use pathfinding::{Heuristic, astar};
pub use planner::plan_path;
pub use reachability::reachable;
pub use registry::{EdgeTypeRegistry, RegistryError};
pub use types::{EdgeTypeId, Hitbox, NodeId, TILE_SIZE, TilePoint, Vec2};
pub use world::{TileGrid, TileShape, TileWorld, WorldBounds};
