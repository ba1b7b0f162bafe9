// A* search over a `NavGraph`.
//
// Textbook A* with a binary heap and lazy deletion: improving a node's
// g-score pushes a fresh heap entry, and entries whose recorded g no longer
// matches the best known g are skipped when popped. Nodes may be expanded
// again if a cheaper route to them turns up later (only possible with the
// edge-scaled heuristic, which is not consistent).
//
// Heap order is f-score ascending, ties broken by node id ascending, so the
// search is deterministic for a given graph.
//
// Two heuristics are available:
// - `Admissible(k)`: `k * manhattan(node, goal)`. With `k` at most the
//   smallest cost per tile of any edge in the graph this never
//   overestimates, so the returned path is a cheapest one.
// - `EdgeScaled`: `manhattan(node, goal) * cost of the edge just relaxed`.
//   Faster on open terrain but may return a more expensive path.
//
// See also: `reachability.rs` for the plain BFS used for goal selection,
// `planner.rs` which drives both.

use crate::cancel::{CancelSignal, Cancelled};
use crate::config::{HeuristicMode, NavigatorParams};
use crate::edge::{Edge, PathEdge};
use crate::navmesh::NavGraph;
use crate::registry::EdgeTypeRegistry;
use crate::types::{NodeId, TilePoint};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Estimate of the remaining cost from a node to the goal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Heuristic {
    /// `k * manhattan`. Optimal when `k` is a lower bound on cost per tile.
    Admissible(f32),
    /// `manhattan * cost of the relaxed edge`.
    EdgeScaled,
}

impl Heuristic {
    /// Heuristic for `mode`, with the admissible factor taken from the
    /// registry's cheapest rule for this navigator.
    pub fn for_mode(mode: HeuristicMode, registry: &EdgeTypeRegistry, navigator: &NavigatorParams) -> Self {
        match mode {
            HeuristicMode::Admissible => Heuristic::Admissible(registry.min_cost_per_tile(navigator)),
            HeuristicMode::EdgeScaled => Heuristic::EdgeScaled,
        }
    }

    fn estimate(self, node: TilePoint, goal: TilePoint, edge_cost: f32) -> f32 {
        let distance = node.manhattan_distance(goal) as f32;
        match self {
            Heuristic::Admissible(k) => k * distance,
            Heuristic::EdgeScaled => distance * edge_cost,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f32,
    g: f32,
    node: NodeId,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` pops the smallest f (then smallest id).
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// Cheapest path from `start` to `goal` as tile-space edges.
///
/// `Ok(None)` when the goal is unreachable or either endpoint is not in the
/// graph. `Ok(Some(vec![]))` when `start == goal`.
pub fn astar(
    graph: &NavGraph,
    start: NodeId,
    goal: NodeId,
    heuristic: Heuristic,
    cancel: &CancelSignal,
) -> Result<Option<Vec<PathEdge>>, Cancelled> {
    let (Some(start_point), Some(goal_point)) = (graph.point(start), graph.point(goal)) else {
        return Ok(None);
    };
    if start == goal {
        return Ok(Some(Vec::new()));
    }

    let mut g_score: FxHashMap<NodeId, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<NodeId, Edge> = FxHashMap::default();
    let mut open = BinaryHeap::new();

    g_score.insert(start, 0.0);
    open.push(OpenEntry {
        f: heuristic.estimate(start_point, goal_point, 1.0),
        g: 0.0,
        node: start,
    });

    let mut expanded = 0usize;
    while let Some(OpenEntry { g, node, .. }) = open.pop() {
        if g > g_score.get(&node).copied().unwrap_or(f32::INFINITY) {
            continue;
        }
        cancel.check()?;
        expanded += 1;

        if node == goal {
            tracing::trace!(expanded, cost = g, "path found");
            return Ok(Some(reconstruct(graph, &came_from, start, goal)));
        }

        for edge in graph.edges(node) {
            let tentative = g + edge.cost;
            if tentative >= g_score.get(&edge.to).copied().unwrap_or(f32::INFINITY) {
                continue;
            }
            let Some(to_point) = graph.point(edge.to) else {
                continue;
            };
            g_score.insert(edge.to, tentative);
            came_from.insert(edge.to, *edge);
            open.push(OpenEntry {
                f: tentative + heuristic.estimate(to_point, goal_point, edge.cost),
                g: tentative,
                node: edge.to,
            });
        }
    }

    tracing::trace!(expanded, "goal unreachable");
    Ok(None)
}

fn reconstruct(graph: &NavGraph, came_from: &FxHashMap<NodeId, Edge>, start: NodeId, goal: NodeId) -> Vec<PathEdge> {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        let Some(edge) = came_from.get(&current) else {
            break;
        };
        if let (Some(from), Some(to)) = (graph.point(edge.from), graph.point(edge.to)) {
            path.push(PathEdge {
                from,
                to,
                edge_type: edge.edge_type,
            });
        }
        current = edge.from;
        // Positive edge costs rule out cycles; stay bounded regardless.
        if path.len() > came_from.len() {
            break;
        }
    }
    path.reverse();
    path
}
