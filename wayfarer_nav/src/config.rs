// Navmesh and navigator parameters.
//
// Two layers:
// - `NavigatorConfig` / `HeuristicMode`: plain data, `serde`-loadable from
//   JSON, every field defaulted, so hosts can tune navigators without
//   recompiling.
// - `NavigatorParams` / `NavMeshParams`: the runtime form, which adds the
//   pluggable collaborator functions (validity predicate, jump velocity,
//   gravity, end selection). These are `Arc<dyn Fn>` so one navigator
//   definition can be shared by many handles and worker threads.
//
// See also: `presets.rs` for the stock collaborator functions,
// `navmesh.rs` which consumes `NavMeshParams`, `edge_types.rs` which reads
// the navigator's hitbox, jump range and gravity.

use crate::presets;
use crate::types::{Hitbox, TilePoint, Vec2};
use crate::world::TileWorld;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Decides whether a tile is a standable node for the given hitbox.
pub type ValidityFn = Arc<dyn Fn(&dyn TileWorld, TilePoint, Hitbox) -> bool + Send + Sync>;

/// Gravity in pixels per tick², positive = down.
pub type GravityFn = Arc<dyn Fn() -> f32 + Send + Sync>;

/// Initial velocity for a jump between two pixel positions.
pub type JumpVelocityFn = Arc<dyn Fn(Vec2, Vec2, &dyn Fn() -> f32) -> Vec2 + Send + Sync>;

/// Chooses the goal tile from the set of tiles reachable from the start.
pub type EndSelectorFn = Arc<dyn Fn(&FxHashSet<TilePoint>) -> Option<TilePoint> + Send + Sync>;

/// Maximum jump offsets in tiles, each axis symmetric around the start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpRange {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Default for JumpRange {
    fn default() -> Self {
        Self {
            horizontal: 6,
            vertical: 5,
        }
    }
}

/// How A* estimates the remaining cost to the goal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeuristicMode {
    /// Manhattan distance times the smallest per-tile cost any registered
    /// edge type can produce. Never overestimates, so paths are optimal.
    #[default]
    Admissible,
    /// Manhattan distance times the cost of the edge being relaxed. Biases
    /// the search toward cheap edge types but can miss the optimum.
    EdgeScaled,
}

/// Serializable navigator description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub hitbox: Hitbox,
    pub max_jump: JumpRange,
    /// Constant gravity used when no custom gravity function is supplied.
    pub gravity: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            hitbox: Hitbox::default(),
            max_jump: JumpRange::default(),
            gravity: 0.3,
        }
    }
}

/// Everything the navmesh needs to know about one kind of navigator.
#[derive(Clone)]
pub struct NavigatorParams {
    pub hitbox: Hitbox,
    pub max_jump: JumpRange,
    pub gravity: GravityFn,
    pub jump_velocity: JumpVelocityFn,
    pub select_end: EndSelectorFn,
}

impl NavigatorParams {
    /// Navigator with the stock jump function and constant gravity from
    /// `config`, picking its goal with `select_end`.
    pub fn from_config(
        config: &NavigatorConfig,
        select_end: impl Fn(&FxHashSet<TilePoint>) -> Option<TilePoint> + Send + Sync + 'static,
    ) -> Self {
        let gravity = config.gravity;
        Self {
            hitbox: config.hitbox,
            max_jump: config.max_jump,
            gravity: Arc::new(move || gravity),
            jump_velocity: Arc::new(presets::default_jump_velocity),
            select_end: Arc::new(select_end),
        }
    }

    pub fn with_gravity(mut self, gravity: impl Fn() -> f32 + Send + Sync + 'static) -> Self {
        self.gravity = Arc::new(gravity);
        self
    }

    pub fn with_jump_velocity(
        mut self,
        jump: impl Fn(Vec2, Vec2, &dyn Fn() -> f32) -> Vec2 + Send + Sync + 'static,
    ) -> Self {
        self.jump_velocity = Arc::new(jump);
        self
    }

    pub fn with_end_selector(
        mut self,
        select_end: impl Fn(&FxHashSet<TilePoint>) -> Option<TilePoint> + Send + Sync + 'static,
    ) -> Self {
        self.select_end = Arc::new(select_end);
        self
    }

    /// Current gravity value.
    pub fn gravity(&self) -> f32 {
        (self.gravity)()
    }

    /// Launch velocity for a jump from `start` to `end` (pixel space).
    pub fn jump_velocity(&self, start: Vec2, end: Vec2) -> Vec2 {
        let gravity = &self.gravity;
        (self.jump_velocity)(start, end, &|| gravity())
    }
}

impl fmt::Debug for NavigatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigatorParams")
            .field("hitbox", &self.hitbox)
            .field("max_jump", &self.max_jump)
            .field("gravity", &self.gravity())
            .finish_non_exhaustive()
    }
}

/// The region a navmesh covers and the predicate that picks its nodes.
#[derive(Clone)]
pub struct NavMeshParams {
    pub center: TilePoint,
    /// Half-size of the scanned square, in tiles. Radius 0 scans one tile.
    pub radius: u32,
    pub is_valid: ValidityFn,
}

impl NavMeshParams {
    /// Region around `center` using the stock validity predicate.
    pub fn new(center: TilePoint, radius: u32) -> Self {
        Self {
            center,
            radius,
            is_valid: Arc::new(presets::default_is_tile_valid),
        }
    }

    pub fn with_validity(
        mut self,
        is_valid: impl Fn(&dyn TileWorld, TilePoint, Hitbox) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_valid = Arc::new(is_valid);
        self
    }

    /// Same predicate and radius around a new center.
    pub fn recentered(&self, center: TilePoint) -> Self {
        Self {
            center,
            ..self.clone()
        }
    }
}

impl fmt::Debug for NavMeshParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavMeshParams")
            .field("center", &self.center)
            .field("radius", &self.radius)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = NavigatorConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: NavigatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn config_loads_partial_json() {
        let json = r#"{ "hitbox": { "width": 16, "height": 32 }, "gravity": 0.5 }"#;
        let config: NavigatorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hitbox, Hitbox::new(16, 32));
        assert_eq!(config.gravity, 0.5);
        assert_eq!(config.max_jump, JumpRange::default());
    }

    #[test]
    fn heuristic_mode_loads_by_name() {
        let mode: HeuristicMode = serde_json::from_str(r#""EdgeScaled""#).unwrap();
        assert_eq!(mode, HeuristicMode::EdgeScaled);
        assert_eq!(HeuristicMode::default(), HeuristicMode::Admissible);
    }

    #[test]
    fn navigator_uses_configured_gravity() {
        let config = NavigatorConfig {
            gravity: 0.4,
            ..NavigatorConfig::default()
        };
        let nav = NavigatorParams::from_config(&config, |_| None);
        assert_eq!(nav.gravity(), 0.4);
        let nav = nav.with_gravity(|| 0.1);
        assert_eq!(nav.gravity(), 0.1);
    }

    #[test]
    fn recentered_keeps_radius() {
        let params = NavMeshParams::new(TilePoint::new(1, 1), 7);
        let moved = params.recentered(TilePoint::new(9, 9));
        assert_eq!(moved.center, TilePoint::new(9, 9));
        assert_eq!(moved.radius, 7);
    }
}
