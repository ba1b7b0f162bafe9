// Breadth-first reachability over a navmesh graph.
//
// Used by the planner to hand the end-selection policy every tile the
// navigator could get to from its start, so the policy never picks a goal
// A* cannot reach.

use crate::cancel::{CancelSignal, Cancelled};
use crate::navmesh::NavGraph;
use crate::types::TilePoint;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Every tile reachable from `start` (inclusive) along graph edges, limited
/// to members of `valid`. Empty when `start` is not a node.
pub fn reachable(
    graph: &NavGraph,
    valid: &FxHashSet<TilePoint>,
    start: TilePoint,
    cancel: &CancelSignal,
) -> Result<FxHashSet<TilePoint>, Cancelled> {
    let mut found = FxHashSet::default();
    let Some(start_id) = graph.node_id(start) else {
        return Ok(found);
    };

    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::new();
    seen.insert(start_id);
    queue.push_back(start_id);

    while let Some(id) = queue.pop_front() {
        cancel.check()?;
        if let Some(point) = graph.point(id).filter(|p| valid.contains(p)) {
            found.insert(point);
        }
        for edge in graph.edges(id) {
            if seen.insert(edge.to) {
                queue.push_back(edge.to);
            }
        }
    }
    Ok(found)
}
