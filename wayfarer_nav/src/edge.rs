// Edge records and the pluggable movement-rule trait.
//
// An edge type is a movement rule: given a standing tile it names every tile
// the navigator can reach in one move of that kind, and it prices each move.
// The navmesh builder asks every registered rule about every node; the
// results become `Edge`s in the adjacency map.
//
// `ExpandContext` bundles what a rule may look at: the world, the navigator
// parameters and the set of valid standing tiles. Rules are pure functions of
// this context and must not retain it.
//
// See also: `edge_types.rs` for the built-in Walk/Fall/Jump rules,
// `registry.rs` for id assignment, `navmesh.rs` for the builder.

use crate::config::NavigatorParams;
use crate::types::{EdgeTypeId, NodeId, TilePoint};
use crate::world::TileWorld;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// One directed, typed, weighted connection between two nodes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub edge_type: EdgeTypeId,
    pub cost: f32,
}

/// A step of a path in tile coordinates, as handed to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathEdge {
    pub from: TilePoint,
    pub to: TilePoint,
    pub edge_type: EdgeTypeId,
}

/// Read-only inputs available to a movement rule while the navmesh is built.
#[derive(Clone, Copy)]
pub struct ExpandContext<'a> {
    pub world: &'a dyn TileWorld,
    pub navigator: &'a NavigatorParams,
    pub valid: &'a FxHashSet<TilePoint>,
}

impl ExpandContext<'_> {
    pub fn is_valid(&self, tile: TilePoint) -> bool {
        self.valid.contains(&tile)
    }
}

/// A movement rule. Implementations must be deterministic in their inputs.
pub trait EdgeBehavior: Send + Sync + 'static {
    /// Human-readable name for logs and debug output.
    fn name(&self) -> &str;

    /// Cost of moving from `start` to `end` with this rule. Must be positive.
    fn cost(&self, start: TilePoint, end: TilePoint) -> f32;

    /// Push every tile reachable from `node` with this rule onto `out`.
    /// Duplicates and non-nodes are filtered by the builder.
    fn expand_reachable(&self, ctx: &ExpandContext<'_>, node: TilePoint, out: &mut Vec<TilePoint>);

    /// Lower bound of `cost(a, b) / manhattan(a, b)` over every edge this
    /// rule can emit for `navigator`. Feeds the admissible A* heuristic.
    fn min_cost_per_tile(&self, navigator: &NavigatorParams) -> f32;
}
