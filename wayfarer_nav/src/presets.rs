// Ready-made collaborator functions for ground navigators.
//
// A navigator is configured with four pluggable functions (see
// `config.rs`). These are the stock versions:
// - `default_is_tile_valid`: a tile is standable when it is solid (or a
//   platform) and the tiles above it leave room for the hitbox height.
//   Horizontal clearance is not checked.
// - `default_jump_velocity`: the minimum-speed launch velocity that reaches
//   the target under the given gravity, with one gravity step subtracted to
//   match a host that applies gravity before moving.
// - `closest_to` / `farthest_from`: end-selection policies over the set of
//   reachable tiles.
//
// All pixel-space math uses the `+y = down` convention of `types.rs`.

use crate::types::{Hitbox, TilePoint, Vec2};
use crate::world::TileWorld;
use rustc_hash::FxHashSet;

/// Solid floor with enough empty tiles above it for the hitbox height.
pub fn default_is_tile_valid(world: &dyn TileWorld, tile: TilePoint, hitbox: Hitbox) -> bool {
    if !world.in_world(tile) || !world.tile(tile).can_stand_on() {
        return false;
    }
    (1..=hitbox.height_in_tiles()).all(|dy| !world.tile(tile.offset(0, -dy)).obstructs_clearance())
}

/// Launch velocity (pixels per tick) for a jump from `start` to `end`.
///
/// Uses the minimum-speed ballistic solution `v0 = sqrt(g (dy + r))` at
/// angle `atan2(dy + r, dx)`, computed with `+y` up and flipped back.
pub fn default_jump_velocity(start: Vec2, end: Vec2, gravity: &dyn Fn() -> f32) -> Vec2 {
    let dx = end.x - start.x;
    // Invert for +y = down.
    let dy = -(end.y - start.y);

    let r = (dx * dx + dy * dy).sqrt();
    let g = gravity();

    let min_speed = (g * (dy + r)).sqrt();
    let theta = (dy + r).atan2(dx);

    let ux = min_speed * theta.cos();
    let uy = -min_speed * theta.sin() - g;

    Vec2::new(ux, uy)
}

/// Pick the reachable tile nearest to `target` (squared Euclidean distance,
/// ties broken by `(y, x)` so the choice is independent of set order).
pub fn closest_to(target: TilePoint) -> impl Fn(&FxHashSet<TilePoint>) -> Option<TilePoint> {
    move |reachable| {
        reachable.iter().copied().min_by(|a, b| {
            a.distance_squared(target)
                .total_cmp(&b.distance_squared(target))
                .then_with(|| (a.y, a.x).cmp(&(b.y, b.x)))
        })
    }
}

/// Pick the reachable tile farthest from `origin`. Useful for fleeing.
pub fn farthest_from(origin: TilePoint) -> impl Fn(&FxHashSet<TilePoint>) -> Option<TilePoint> {
    move |reachable| {
        reachable.iter().copied().max_by(|a, b| {
            a.distance_squared(origin)
                .total_cmp(&b.distance_squared(origin))
                .then_with(|| (b.y, b.x).cmp(&(a.y, a.x)))
        })
    }
}
