// A finished path query, steppable by the navigator that asked for it.
//
// The edge list is fixed at construction. A cursor tracks which edge the
// navigator is currently following; `advance` moves it and reports whether
// the goal has been reached. Advancing past the end keeps `current` on the
// last edge, so a navigator that overshoots still has a sensible target.
//
// Equality compares the path only, not the cursor.

use crate::edge::PathEdge;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathResult {
    edges: Vec<PathEdge>,
    already_at_goal: bool,
    #[serde(skip)]
    cursor: usize,
}

impl PathResult {
    pub fn new(edges: Vec<PathEdge>) -> Self {
        Self {
            edges,
            already_at_goal: false,
            cursor: 0,
        }
    }

    /// The navigator already stands on its chosen goal. Has no edges.
    pub fn already_at_goal() -> Self {
        Self {
            edges: Vec::new(),
            already_at_goal: true,
            cursor: 0,
        }
    }

    /// Rebuild from decoded parts. An `already_at_goal` result never
    /// carries edges.
    pub fn from_parts(already_at_goal: bool, edges: Vec<PathEdge>) -> Self {
        if already_at_goal {
            Self::already_at_goal()
        } else {
            Self::new(edges)
        }
    }

    pub fn is_already_at_goal(&self) -> bool {
        self.already_at_goal
    }

    pub fn edges(&self) -> &[PathEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// True while there is an edge left to follow.
    pub fn has_path(&self) -> bool {
        !self.already_at_goal && self.cursor < self.edges.len()
    }

    /// The edge being followed. After the path is exhausted this stays on
    /// the last edge; `None` only for an empty path.
    pub fn current(&self) -> Option<&PathEdge> {
        let last = self.edges.len().checked_sub(1)?;
        self.edges.get(self.cursor.min(last))
    }

    /// Zero-based index of `current`.
    pub fn cursor(&self) -> usize {
        self.cursor.min(self.edges.len().saturating_sub(1))
    }

    /// Move to the next edge. Returns true when the goal is reached, i.e.
    /// there is no next edge.
    pub fn advance(&mut self) -> bool {
        if self.edges.is_empty() {
            return true;
        }
        self.cursor = (self.cursor + 1).min(self.edges.len());
        self.cursor == self.edges.len()
    }

    /// Restart from the first edge.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl PartialEq for PathResult {
    fn eq(&self, other: &Self) -> bool {
        self.already_at_goal == other.already_at_goal && self.edges == other.edges
    }
}

impl Eq for PathResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeTypeId, TilePoint};

    fn step(x0: i32, x1: i32) -> PathEdge {
        PathEdge {
            from: TilePoint::new(x0, 0),
            to: TilePoint::new(x1, 0),
            edge_type: EdgeTypeId(0),
        }
    }

    #[test]
    fn advance_walks_to_goal_and_clamps() {
        let mut path = PathResult::new(vec![step(0, 1), step(1, 2), step(2, 3)]);
        assert!(path.has_path());
        assert_eq!(path.current(), Some(&step(0, 1)));
        assert!(!path.advance());
        assert_eq!(path.current(), Some(&step(1, 2)));
        assert!(!path.advance());
        assert!(path.advance());
        assert!(!path.has_path());
        // Overshooting keeps reporting the goal and the last edge.
        assert!(path.advance());
        assert_eq!(path.current(), Some(&step(2, 3)));
        assert_eq!(path.cursor(), 2);
    }

    #[test]
    fn zero_length_path_is_at_goal_immediately() {
        let mut path = PathResult::already_at_goal();
        assert!(path.is_already_at_goal());
        assert!(!path.has_path());
        assert_eq!(path.current(), None);
        assert!(path.advance());
    }

    #[test]
    fn equality_ignores_cursor() {
        let a = PathResult::new(vec![step(0, 1), step(1, 2)]);
        let mut b = a.clone();
        b.advance();
        assert_eq!(a, b);
        assert_ne!(a, PathResult::already_at_goal());
    }

    #[test]
    fn from_parts_drops_edges_when_at_goal() {
        let result = PathResult::from_parts(true, vec![step(0, 1)]);
        assert!(result.is_empty());
        assert!(result.is_already_at_goal());
    }

    #[test]
    fn bincode_round_trip_resets_cursor() {
        let mut path = PathResult::new(vec![step(0, 1), step(1, 2)]);
        path.advance();
        let bytes = bincode::serialize(&path).unwrap();
        let restored: PathResult = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, path);
        assert_eq!(restored.cursor(), 0);
    }
}
