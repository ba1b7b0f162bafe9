// Core types shared across the navigation library.
//
// Defines tile-space coordinates (`TilePoint`), pixel-space vectors (`Vec2`),
// the navigator hitbox, and the strongly-typed integer IDs used by the graph
// (`NodeId`, `EdgeTypeId`). All types derive `Serialize`/`Deserialize` so
// results and configs can be stored or sent over the wire.
//
// Coordinate convention: tile space matches the host world's screen space.
// - X: right (positive) / left  (negative)
// - Y: down  (positive) / up    (negative)
// One tile is `TILE_SIZE` pixels on each side.
//
// See also: `world.rs` for the tile storage capability, `edge.rs` for the
// edge records built on these types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of one tile, in pixels.
pub const TILE_SIZE: f32 = 16.0;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A tile coordinate. `+y` points down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance between two tiles.
    pub fn manhattan_distance(self, other: Self) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Chebyshev (king-move) distance between two tiles.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    /// Squared Euclidean distance, in tiles².
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx * dx + dy * dy
    }

    /// Pixel position of this tile's top-left corner.
    pub fn to_pixels(self) -> Vec2 {
        Vec2::new(self.x as f32 * TILE_SIZE, self.y as f32 * TILE_SIZE)
    }

    /// Tile containing the given pixel position.
    pub fn from_pixels(pos: Vec2) -> Self {
        Self::new(
            (pos.x / TILE_SIZE).floor() as i32,
            (pos.y / TILE_SIZE).floor() as i32,
        )
    }
}

impl fmt::Display for TilePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2D vector in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Linear interpolation: `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Navigator collision box, in pixels. Only the size matters to the
/// navmesh; the navigator's position is implied by the tile it stands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hitbox {
    pub width: u32,
    pub height: u32,
}

impl Hitbox {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of whole tiles needed to cover the hitbox width.
    pub fn width_in_tiles(self) -> i32 {
        (self.width as f32 / TILE_SIZE).ceil() as i32
    }

    /// Number of whole tiles needed to cover the hitbox height.
    pub fn height_in_tiles(self) -> i32 {
        (self.height as f32 / TILE_SIZE).ceil() as i32
    }
}

impl Default for Hitbox {
    /// Roughly a humanoid: one tile and a bit wide, three tiles tall.
    fn default() -> Self {
        Self::new(18, 40)
    }
}

// ---------------------------------------------------------------------------
// Graph IDs
// ---------------------------------------------------------------------------

/// Identity of a navmesh node. Comes from the world's tile-identity lookup,
/// so it is unique within one navmesh but may change across rebuilds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Registry-assigned identity of an edge type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeTypeId(pub u32);

impl fmt::Display for EdgeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge-type#{}", self.0)
    }
}
