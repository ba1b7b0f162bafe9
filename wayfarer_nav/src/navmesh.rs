// Navigation graph and navmesh construction.
//
// `NavGraph` is the bare directed graph: a two-way node id <-> tile mapping,
// per-node outgoing edge lists, and the node insertion order (so iteration is
// deterministic regardless of hash order). It can be built by hand, which the
// search tests do.
//
// `NavMesh::build` fills a `NavGraph` from a square region of the world:
//
// 1. Clamp `[center - r, center + r]` (inclusive, both axes) to the world.
// 2. Scan the region row by row. Each tile accepted by the validity
//    predicate becomes a node whose id is the world's tile identity.
// 3. For each node in scan order and each edge type in registry order, ask
//    the rule for destinations. Destinations that are nodes, are not the
//    node itself, and were not already produced by the same rule for this
//    node become edges with the rule's cost.
//
// Step 3 can run on the rayon pool (`AdjacencyMode::Parallel`). Each rayon
// worker owns its scratch buffer and results are collected in scan order, so
// both modes produce identical graphs.
//
// Cancellation is polled once per scanned row and once per node during
// adjacency construction. A cancelled build returns `Err(Cancelled)`; no
// partial navmesh ever escapes.
//
// A built `NavMesh` is immutable. The runtime shares it as `Arc<NavMesh>`
// and replaces it wholesale on rebuild.

use crate::cancel::{CancelSignal, Cancelled};
use crate::config::{NavMeshParams, NavigatorParams};
use crate::edge::{Edge, ExpandContext};
use crate::registry::EdgeTypeRegistry;
use crate::types::{EdgeTypeId, NodeId, TilePoint};
use crate::world::TileWorld;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::time::Instant;

/// Outgoing edges of one node. Most nodes have a handful.
pub type EdgeList = SmallVec<[Edge; 8]>;

// ---------------------------------------------------------------------------
// NavGraph
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct NavGraph {
    id_to_point: FxHashMap<NodeId, TilePoint>,
    point_to_id: FxHashMap<TilePoint, NodeId>,
    adjacency: FxHashMap<NodeId, EdgeList>,
    order: Vec<NodeId>,
}

impl NavGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns false (and changes nothing) if either the id or
    /// the tile is already present.
    pub fn add_node(&mut self, id: NodeId, point: TilePoint) -> bool {
        if self.id_to_point.contains_key(&id) || self.point_to_id.contains_key(&point) {
            return false;
        }
        self.id_to_point.insert(id, point);
        self.point_to_id.insert(point, id);
        self.adjacency.insert(id, EdgeList::new());
        self.order.push(id);
        true
    }

    /// Append an edge. Both endpoints must already be nodes; returns false
    /// otherwise.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge_type: EdgeTypeId, cost: f32) -> bool {
        if !self.id_to_point.contains_key(&to) {
            return false;
        }
        match self.adjacency.get_mut(&from) {
            Some(edges) => {
                edges.push(Edge {
                    from,
                    to,
                    edge_type,
                    cost,
                });
                true
            }
            None => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|e| e.len()).sum()
    }

    pub fn node_id(&self, point: TilePoint) -> Option<NodeId> {
        self.point_to_id.get(&point).copied()
    }

    pub fn point(&self, id: NodeId) -> Option<TilePoint> {
        self.id_to_point.get(&id).copied()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_to_point.contains_key(&id)
    }

    /// Outgoing edges of `id`, empty for unknown nodes.
    pub fn edges(&self, id: NodeId) -> &[Edge] {
        self.adjacency.get(&id).map(|e| e.as_slice()).unwrap_or(&[])
    }

    /// `(id, tile)` for every node, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, TilePoint)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| self.id_to_point.get(&id).map(|&point| (id, point)))
    }
}

// ---------------------------------------------------------------------------
// Scan region
// ---------------------------------------------------------------------------

/// Inclusive tile rectangle covered by a navmesh. Empty when `min > max` on
/// either axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanRegion {
    pub min: TilePoint,
    pub max: TilePoint,
}

impl ScanRegion {
    /// `[center - radius, center + radius]` clamped to the world.
    pub fn around(world: &dyn TileWorld, center: TilePoint, radius: u32) -> Self {
        let bounds = world.bounds();
        let r = i64::from(radius);
        let clamp = |lo: i64, hi: i64, extent: u32| {
            let limit = i64::from(extent) - 1;
            (lo.max(0), hi.min(limit))
        };
        let (min_x, max_x) = clamp(i64::from(center.x) - r, i64::from(center.x) + r, bounds.width);
        let (min_y, max_y) = clamp(i64::from(center.y) - r, i64::from(center.y) + r, bounds.height);
        // Saturate into i32 range; an inverted pair stays inverted.
        let to_i32 = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        Self {
            min: TilePoint::new(to_i32(min_x), to_i32(min_y)),
            max: TilePoint::new(to_i32(max_x), to_i32(max_y)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, tile: TilePoint) -> bool {
        (self.min.x..=self.max.x).contains(&tile.x) && (self.min.y..=self.max.y).contains(&tile.y)
    }
}

// ---------------------------------------------------------------------------
// NavMesh
// ---------------------------------------------------------------------------

/// How adjacency lists are computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdjacencyMode {
    #[default]
    Sequential,
    /// Spread nodes over the rayon pool.
    Parallel,
}

#[derive(Clone, Debug)]
pub struct NavMesh {
    graph: NavGraph,
    valid: FxHashSet<TilePoint>,
    region: ScanRegion,
    params: NavMeshParams,
}

impl NavMesh {
    /// Build a navmesh sequentially.
    pub fn build(
        world: &dyn TileWorld,
        registry: &EdgeTypeRegistry,
        params: NavMeshParams,
        navigator: &NavigatorParams,
        cancel: &CancelSignal,
    ) -> Result<Self, Cancelled> {
        Self::build_with(world, registry, params, navigator, cancel, AdjacencyMode::Sequential)
    }

    pub fn build_with(
        world: &dyn TileWorld,
        registry: &EdgeTypeRegistry,
        params: NavMeshParams,
        navigator: &NavigatorParams,
        cancel: &CancelSignal,
        mode: AdjacencyMode,
    ) -> Result<Self, Cancelled> {
        let started = Instant::now();
        let region = ScanRegion::around(world, params.center, params.radius);

        let mut graph = NavGraph::new();
        let mut valid = FxHashSet::default();
        if !region.is_empty() {
            for y in region.min.y..=region.max.y {
                cancel.check()?;
                for x in region.min.x..=region.max.x {
                    let tile = TilePoint::new(x, y);
                    if !(params.is_valid)(world, tile, navigator.hitbox) {
                        continue;
                    }
                    let id = world.tile_id(tile);
                    if graph.add_node(id, tile) {
                        valid.insert(tile);
                    } else {
                        tracing::warn!(%tile, id = id.0, "duplicate tile identity, node skipped");
                    }
                }
            }
        }

        let ctx = ExpandContext {
            world,
            navigator,
            valid: &valid,
        };
        let nodes: Vec<(NodeId, TilePoint)> = graph.nodes().collect();
        let adjacency: Vec<EdgeList> = match mode {
            AdjacencyMode::Sequential => {
                let mut scratch = Vec::new();
                nodes
                    .iter()
                    .map(|&(id, tile)| {
                        cancel.check()?;
                        Ok(expand_node(&ctx, registry, &graph, id, tile, &mut scratch))
                    })
                    .collect::<Result<_, Cancelled>>()?
            }
            AdjacencyMode::Parallel => nodes
                .par_iter()
                .map_init(Vec::new, |scratch, &(id, tile)| {
                    cancel.check()?;
                    Ok(expand_node(&ctx, registry, &graph, id, tile, scratch))
                })
                .collect::<Result<_, Cancelled>>()?,
        };
        for ((id, _), edges) in nodes.iter().zip(adjacency) {
            graph.adjacency.insert(*id, edges);
        }

        tracing::debug!(
            center = %params.center,
            radius = params.radius,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "navmesh built"
        );

        Ok(Self {
            graph,
            valid,
            region,
            params,
        })
    }

    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    pub fn valid_nodes(&self) -> &FxHashSet<TilePoint> {
        &self.valid
    }

    pub fn is_valid_node(&self, tile: TilePoint) -> bool {
        self.valid.contains(&tile)
    }

    pub fn node_id(&self, tile: TilePoint) -> Option<NodeId> {
        self.graph.node_id(tile)
    }

    pub fn region(&self) -> ScanRegion {
        self.region
    }

    pub fn params(&self) -> &NavMeshParams {
        &self.params
    }

    pub fn center(&self) -> TilePoint {
        self.params.center
    }
}

/// All outgoing edges of one node, rules in registry order.
fn expand_node(
    ctx: &ExpandContext<'_>,
    registry: &EdgeTypeRegistry,
    graph: &NavGraph,
    from_id: NodeId,
    from: TilePoint,
    scratch: &mut Vec<TilePoint>,
) -> EdgeList {
    let mut edges = EdgeList::new();
    for (edge_type, behavior) in registry.iter() {
        scratch.clear();
        behavior.expand_reachable(ctx, from, scratch);
        let first = edges.len();
        for &to in scratch.iter() {
            if to == from {
                continue;
            }
            let Some(to_id) = graph.node_id(to) else {
                continue;
            };
            if edges[first..].iter().any(|e| e.to == to_id) {
                continue;
            }
            edges.push(Edge {
                from: from_id,
                to: to_id,
                edge_type,
                cost: behavior.cost(from, to),
            });
        }
    }
    edges
}
