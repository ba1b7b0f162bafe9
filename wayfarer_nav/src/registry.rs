// Edge-type registry.
//
// Maps `EdgeTypeId` (a dense index assigned in registration order) to a
// boxed `EdgeBehavior`. Registration order is the order in which the
// navmesh builder evaluates rules for each node, so it shapes the order of
// edges in adjacency lists, but never path cost.
//
// Each concrete behavior type may be registered once; duplicates are
// detected by `TypeId`. The registry is built at startup and then frozen
// behind an `Arc` by whoever owns the navmeshes.

use crate::config::NavigatorParams;
use crate::edge::EdgeBehavior;
use crate::edge_types::{Fall, Jump, Walk};
use crate::types::EdgeTypeId;
use std::any::TypeId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("edge type `{name}` is already registered")]
    DuplicateRegistration { name: String },
    #[error("no edge type ids left")]
    Full,
}

struct Entry {
    id: EdgeTypeId,
    type_id: TypeId,
    behavior: Box<dyn EdgeBehavior>,
}

#[derive(Default)]
pub struct EdgeTypeRegistry {
    entries: Vec<Entry>,
}

impl EdgeTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with Walk (0), Fall (1) and Jump (2).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.entries.push(Entry::of(EdgeTypeId(0), Walk));
        registry.entries.push(Entry::of(EdgeTypeId(1), Fall));
        registry.entries.push(Entry::of(EdgeTypeId(2), Jump));
        registry
    }

    /// Add a behavior and return its id.
    pub fn register<B: EdgeBehavior>(&mut self, behavior: B) -> Result<EdgeTypeId, RegistryError> {
        if self.id_of::<B>().is_some() {
            return Err(RegistryError::DuplicateRegistration {
                name: behavior.name().to_owned(),
            });
        }
        let id = u32::try_from(self.entries.len())
            .map(EdgeTypeId)
            .map_err(|_| RegistryError::Full)?;
        tracing::debug!(%id, name = behavior.name(), "registered edge type");
        self.entries.push(Entry::of(id, behavior));
        Ok(id)
    }

    /// Id under which `B` was registered.
    pub fn id_of<B: EdgeBehavior>(&self) -> Option<EdgeTypeId> {
        let wanted = TypeId::of::<B>();
        self.entries.iter().find(|e| e.type_id == wanted).map(|e| e.id)
    }

    pub fn get(&self, id: EdgeTypeId) -> Option<&dyn EdgeBehavior> {
        self.entries.get(id.0 as usize).map(|e| e.behavior.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(id, behavior)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (EdgeTypeId, &dyn EdgeBehavior)> + '_ {
        self.entries.iter().map(|e| (e.id, e.behavior.as_ref()))
    }

    /// Smallest per-tile cost any registered rule can produce. Scales the
    /// admissible heuristic; 0 for an empty registry (plain Dijkstra).
    pub fn min_cost_per_tile(&self, navigator: &NavigatorParams) -> f32 {
        self.iter()
            .map(|(_, b)| b.min_cost_per_tile(navigator))
            .reduce(f32::min)
            .unwrap_or(0.0)
            .max(0.0)
    }
}

impl Entry {
    fn of<B: EdgeBehavior>(id: EdgeTypeId, behavior: B) -> Self {
        Self {
            id,
            type_id: TypeId::of::<B>(),
            behavior: Box::new(behavior),
        }
    }
}

impl std::fmt::Debug for EdgeTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.behavior.name()))
            .finish()
    }
}
