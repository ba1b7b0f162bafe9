// Geometry for host-side debug drawing.
//
// Nothing here draws. These functions turn a navmesh or path into line
// segments and polylines in pixel space; the host renders them however it
// likes. Jump edges are shown as a quadratic Bezier arc, which is cheaper
// and easier to read than the true ballistic curve.

use crate::edge::PathEdge;
use crate::navmesh::NavMesh;
use crate::types::{TILE_SIZE, TilePoint, Vec2};

/// Pixels of arc length per Bezier sample.
const ARC_SAMPLE_SPACING: f32 = 8.0;

/// Every edge of the navmesh in tile space, nodes in scan order and edges
/// in adjacency order.
pub fn navmesh_edges(mesh: &NavMesh) -> Vec<PathEdge> {
    let graph = mesh.graph();
    graph
        .nodes()
        .flat_map(|(id, from)| {
            graph.edges(id).iter().filter_map(move |edge| {
                graph.point(edge.to).map(|to| PathEdge {
                    from,
                    to,
                    edge_type: edge.edge_type,
                })
            })
        })
        .collect()
}

/// The subset of `edges` whose endpoints are both nodes of `mesh`. Paths
/// planned on an older navmesh may reference tiles that are gone.
pub fn drawable_edges<'a>(mesh: &'a NavMesh, edges: &'a [PathEdge]) -> impl Iterator<Item = &'a PathEdge> + 'a {
    edges
        .iter()
        .filter(|e| mesh.is_valid_node(e.from) && mesh.is_valid_node(e.to))
}

/// Pixel-space center of a tile.
pub fn tile_center(tile: TilePoint) -> Vec2 {
    tile.to_pixels() + Vec2::new(TILE_SIZE / 2.0, TILE_SIZE / 2.0)
}

/// Polyline approximating a jump from `start` to `end` (pixel positions).
///
/// Steep upward jumps (two or more tiles up, at most two across) bend
/// through a control point above the start; everything else arcs over
/// the midpoint, lifted by the horizontal distance capped at
/// `max_jump_tiles` tiles.
pub fn jump_arc(start: Vec2, end: Vec2, max_jump_tiles: u32) -> Vec<Vec2> {
    let rise = (start.y - end.y) / TILE_SIZE;
    let run = (end.x - start.x).abs() / TILE_SIZE;

    let control = if rise >= 2.0 && run <= 2.0 {
        Vec2::new(start.x, end.y)
    } else {
        let lift = (start.x - end.x).abs().min(max_jump_tiles as f32 * TILE_SIZE);
        Vec2::new((start.x + end.x) / 2.0, start.y - lift)
    };

    let samples = ((start.distance(end) / ARC_SAMPLE_SPACING) as usize).max(1);
    (0..=samples)
        .map(|i| quadratic_bezier(start, control, end, i as f32 / samples as f32))
        .collect()
}

fn quadratic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let a = p0.lerp(p1, t);
    let b = p1.lerp(p2, t);
    a.lerp(b, t)
}
