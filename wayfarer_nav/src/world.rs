// Tile storage capability and a dense reference implementation.
//
// The navmesh never owns the world. It reads it through the `TileWorld`
// trait, which reports world bounds, the shape of each tile, and a stable
// per-tile identity used as the node ID. Hosts implement `TileWorld` over
// their own storage; `TileGrid` is a dense implementation used by tests, the
// benchmark and the demo binary.
//
// `TileGrid` is stored as a flat `Vec<TileShape>` indexed by
// `y + x * height` (column-major, so the flat index is also the default tile
// identity). Out-of-bounds reads return `Empty`.
//
// A world that changes while navmeshes are built can be shared as
// `parking_lot::RwLock<TileGrid>`, which also implements `TileWorld`; each
// tile read takes the read lock, so a build sees every individual tile
// consistently but not necessarily one frozen snapshot.
//
// See also: `presets.rs` for the default validity predicate, `edge_types.rs`
// for the Fall/Jump collision queries built on `TileShape`.

use crate::types::{NodeId, TilePoint};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Collision shape of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileShape {
    /// No tile. Navigators pass through freely.
    #[default]
    Empty,
    /// Full solid block.
    Solid,
    /// One-way platform: can be stood on, can be jumped through from below.
    Platform,
}

impl TileShape {
    /// Whether a navigator can stand on top of this tile.
    pub fn can_stand_on(self) -> bool {
        matches!(self, TileShape::Solid | TileShape::Platform)
    }

    /// Whether a navigator's hitbox may overlap this tile mid-air.
    pub fn can_intersect(self) -> bool {
        !matches!(self, TileShape::Solid)
    }

    /// Whether the tile blocks standing room above a floor tile.
    pub fn obstructs_clearance(self) -> bool {
        matches!(self, TileShape::Solid | TileShape::Platform)
    }
}

/// Size of the world in tiles. Valid coordinates are `0..width` × `0..height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: u32,
    pub height: u32,
}

impl WorldBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(self, tile: TilePoint) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as u32) < self.width && (tile.y as u32) < self.height
    }
}

/// Read access to the host world's tiles.
pub trait TileWorld: Send + Sync {
    /// World size in tiles.
    fn bounds(&self) -> WorldBounds;

    /// Shape of the tile at `tile`. Out-of-bounds tiles report `Empty`.
    fn tile(&self, tile: TilePoint) -> TileShape;

    /// Stable identity for the tile, used as its navmesh node ID.
    fn tile_id(&self, tile: TilePoint) -> NodeId {
        let height = self.bounds().height;
        NodeId((tile.y as u32).wrapping_add((tile.x as u32).wrapping_mul(height)))
    }

    fn in_world(&self, tile: TilePoint) -> bool {
        self.bounds().contains(tile)
    }
}

impl<W: TileWorld + ?Sized> TileWorld for Arc<W> {
    fn bounds(&self) -> WorldBounds {
        (**self).bounds()
    }

    fn tile(&self, tile: TilePoint) -> TileShape {
        (**self).tile(tile)
    }

    fn tile_id(&self, tile: TilePoint) -> NodeId {
        (**self).tile_id(tile)
    }
}

impl TileWorld for RwLock<TileGrid> {
    fn bounds(&self) -> WorldBounds {
        self.read().bounds()
    }

    fn tile(&self, tile: TilePoint) -> TileShape {
        self.read().get(tile)
    }
}

/// Dense 2D tile grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Flat storage: index = y + x * height.
    tiles: Vec<TileShape>,
    pub width: u32,
    pub height: u32,
}

impl TileGrid {
    /// Create a grid filled with `Empty`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tiles: vec![TileShape::Empty; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Parse a grid from an ASCII picture, one text line per row (top row
    /// first). `#` is solid, `=` is a platform, anything else is empty.
    /// Rows shorter than the longest one are padded with empty tiles.
    pub fn from_ascii(map: &str) -> Self {
        let rows: Vec<&str> = map
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let shape = match ch {
                    '#' => TileShape::Solid,
                    '=' => TileShape::Platform,
                    _ => TileShape::Empty,
                };
                grid.set(TilePoint::new(x as i32, y as i32), shape);
            }
        }
        grid
    }

    fn index(&self, tile: TilePoint) -> Option<usize> {
        if WorldBounds::new(self.width, self.height).contains(tile) {
            Some(tile.y as usize + tile.x as usize * self.height as usize)
        } else {
            None
        }
    }

    /// Read a tile. Returns `Empty` for out-of-bounds coordinates.
    pub fn get(&self, tile: TilePoint) -> TileShape {
        self.index(tile)
            .map(|i| self.tiles[i])
            .unwrap_or(TileShape::Empty)
    }

    /// Write a tile. No-op for out-of-bounds coordinates.
    pub fn set(&mut self, tile: TilePoint, shape: TileShape) {
        if let Some(i) = self.index(tile) {
            self.tiles[i] = shape;
        }
    }

    /// Fill the inclusive horizontal run `x0..=x1` on row `y`.
    pub fn fill_row(&mut self, y: i32, x0: i32, x1: i32, shape: TileShape) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.set(TilePoint::new(x, y), shape);
        }
    }
}

impl TileWorld for TileGrid {
    fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.width, self.height)
    }

    fn tile(&self, tile: TilePoint) -> TileShape {
        self.get(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_empty() {
        let grid = TileGrid::new(4, 3);
        assert_eq!(grid.get(TilePoint::new(0, 0)), TileShape::Empty);
        assert_eq!(grid.get(TilePoint::new(3, 2)), TileShape::Empty);
    }

    #[test]
    fn out_of_bounds_reads_empty_and_writes_are_ignored() {
        let mut grid = TileGrid::new(2, 2);
        grid.set(TilePoint::new(5, 5), TileShape::Solid);
        grid.set(TilePoint::new(-1, 0), TileShape::Solid);
        assert_eq!(grid.get(TilePoint::new(5, 5)), TileShape::Empty);
        assert_eq!(grid.get(TilePoint::new(-1, 0)), TileShape::Empty);
        assert!(!grid.in_world(TilePoint::new(2, 0)));
        assert!(grid.in_world(TilePoint::new(1, 1)));
    }

    #[test]
    fn from_ascii_parses_shapes_and_pads_rows() {
        let grid = TileGrid::from_ascii("..\n#=.#\n");
        assert_eq!((grid.width, grid.height), (4, 2));
        assert_eq!(grid.get(TilePoint::new(0, 1)), TileShape::Solid);
        assert_eq!(grid.get(TilePoint::new(1, 1)), TileShape::Platform);
        assert_eq!(grid.get(TilePoint::new(2, 1)), TileShape::Empty);
        assert_eq!(grid.get(TilePoint::new(3, 0)), TileShape::Empty);
    }

    #[test]
    fn default_tile_id_is_column_major_index() {
        let grid = TileGrid::new(10, 7);
        assert_eq!(grid.tile_id(TilePoint::new(0, 0)), NodeId(0));
        assert_eq!(grid.tile_id(TilePoint::new(0, 6)), NodeId(6));
        assert_eq!(grid.tile_id(TilePoint::new(2, 3)), NodeId(3 + 2 * 7));
    }

    #[test]
    fn shape_predicates() {
        assert!(TileShape::Solid.can_stand_on());
        assert!(TileShape::Platform.can_stand_on());
        assert!(!TileShape::Empty.can_stand_on());
        assert!(TileShape::Platform.can_intersect());
        assert!(!TileShape::Solid.can_intersect());
        assert!(TileShape::Platform.obstructs_clearance());
        assert!(!TileShape::Empty.obstructs_clearance());
    }

    #[test]
    fn rwlock_grid_reflects_edits() {
        let world = RwLock::new(TileGrid::new(3, 3));
        let tile = TilePoint::new(1, 2);
        assert_eq!(TileWorld::tile(&world, tile), TileShape::Empty);
        world.write().set(tile, TileShape::Solid);
        assert_eq!(TileWorld::tile(&world, tile), TileShape::Solid);
    }
}
