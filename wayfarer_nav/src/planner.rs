// Path planning: start selection, goal selection, then A*.
//
// A navigator may offer several candidate start tiles (for instance the
// tiles under each foot). They are tried in order; the first one that is a
// navmesh node and for which the end-selection policy picks a goal from the
// reachable set wins. If the chosen goal is the start itself, the result is
// "already at goal" with no edges.

use crate::cancel::{CancelSignal, Cancelled};
use crate::navmesh::NavMesh;
use crate::path_result::PathResult;
use crate::pathfinding::{Heuristic, astar};
use crate::reachability::reachable;
use crate::types::TilePoint;
use rustc_hash::FxHashSet;

/// Plan a path on `mesh` from the first usable start in `starts`.
///
/// `Ok(None)` when no start is usable, the policy declines every start, or
/// A* finds no path.
pub fn plan_path(
    mesh: &NavMesh,
    starts: &[TilePoint],
    select_end: &dyn Fn(&FxHashSet<TilePoint>) -> Option<TilePoint>,
    heuristic: Heuristic,
    cancel: &CancelSignal,
) -> Result<Option<PathResult>, Cancelled> {
    let graph = mesh.graph();

    let mut chosen = None;
    for &start in starts {
        if !mesh.is_valid_node(start) {
            continue;
        }
        let area = reachable(graph, mesh.valid_nodes(), start, cancel)?;
        let Some(end) = select_end(&area) else {
            continue;
        };
        match (graph.node_id(start), graph.node_id(end)) {
            (Some(start_id), Some(end_id)) => {
                chosen = Some((start_id, end_id));
                break;
            }
            _ => tracing::trace!(%start, %end, "end selector picked a tile outside the navmesh"),
        }
    }

    let Some((start_id, end_id)) = chosen else {
        tracing::trace!(starts = starts.len(), "no usable start tile");
        return Ok(None);
    };
    if start_id == end_id {
        return Ok(Some(PathResult::already_at_goal()));
    }

    match astar(graph, start_id, end_id, heuristic, cancel)? {
        Some(edges) if !edges.is_empty() => Ok(Some(PathResult::new(edges))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NavMeshParams, NavigatorConfig, NavigatorParams};
    use crate::presets::closest_to;
    use crate::registry::EdgeTypeRegistry;
    use crate::types::Hitbox;
    use crate::world::TileGrid;

    fn mesh(map: &str) -> NavMesh {
        let grid = TileGrid::from_ascii(map);
        let nav = NavigatorParams::from_config(
            &NavigatorConfig {
                hitbox: Hitbox::new(16, 16),
                ..NavigatorConfig::default()
            },
            |_| None,
        );
        let center = TilePoint::new(grid.width as i32 / 2, grid.height as i32 / 2);
        NavMesh::build(
            &grid,
            &EdgeTypeRegistry::with_builtins(),
            NavMeshParams::new(center, 32),
            &nav,
            &CancelSignal::never(),
        )
        .unwrap()
    }

    const FLOOR: &str = "........\n........\n########\n";

    #[test]
    fn walks_to_the_closest_tile() {
        let mesh = mesh(FLOOR);
        let goal = TilePoint::new(6, 2);
        let result = plan_path(
            &mesh,
            &[TilePoint::new(1, 2)],
            &closest_to(goal),
            Heuristic::Admissible(0.5),
            &CancelSignal::never(),
        )
        .unwrap()
        .unwrap();
        assert!(!result.is_already_at_goal());
        assert_eq!(result.edges().first().map(|e| e.from), Some(TilePoint::new(1, 2)));
        assert_eq!(result.edges().last().map(|e| e.to), Some(goal));
    }

    #[test]
    fn start_on_goal_is_already_at_goal() {
        let mesh = mesh(FLOOR);
        let here = TilePoint::new(3, 2);
        let result = plan_path(&mesh, &[here], &closest_to(here), Heuristic::EdgeScaled, &CancelSignal::never())
            .unwrap()
            .unwrap();
        assert!(result.is_already_at_goal());
        assert!(result.edges().is_empty());
    }

    #[test]
    fn invalid_starts_are_skipped() {
        let mesh = mesh(FLOOR);
        let goal = TilePoint::new(5, 2);
        // (1, 1) is air; (2, 2) is the first real node.
        let result = plan_path(
            &mesh,
            &[TilePoint::new(1, 1), TilePoint::new(2, 2)],
            &closest_to(goal),
            Heuristic::Admissible(0.5),
            &CancelSignal::never(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(result.edges()[0].from, TilePoint::new(2, 2));
    }

    #[test]
    fn no_usable_start_is_none() {
        let mesh = mesh(FLOOR);
        let none = plan_path(
            &mesh,
            &[TilePoint::new(0, 0)],
            &closest_to(TilePoint::new(5, 2)),
            Heuristic::Admissible(0.5),
            &CancelSignal::never(),
        );
        assert_eq!(none, Ok(None));

        let declined = plan_path(
            &mesh,
            &[TilePoint::new(2, 2)],
            &|_| None,
            Heuristic::Admissible(0.5),
            &CancelSignal::never(),
        );
        assert_eq!(declined, Ok(None));
    }
}
