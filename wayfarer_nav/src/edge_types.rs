// Built-in movement rules: Walk, Fall and Jump.
//
// Walk: rays in six directions (the four diagonals plus left and right,
// never straight up or down). A ray keeps going while each tile is a valid
// node and emits every tile it passes. Cost is the Chebyshev distance.
//
// Fall: step one tile left or right, then scan straight down. The first
// standable tile ends the scan; it becomes a destination only if the drop is
// at least two tiles and the tile is a valid node. Leaving the world ends
// the scan with nothing. Flat cost of 2.
//
// Jump: every valid node within the navigator's jump range whose horizontal
// offset is at least the hitbox width in tiles. The candidate is accepted
// only if the ballistic arc from the launch velocity reaches it without
// passing through solid tiles, with headroom for the hitbox at each sample
// (relaxed near the landing point). Cost is `max(4, distance²)`.
//
// All three rules push into the caller's scratch buffer and leave
// dedup/self-loop filtering to the builder.

use crate::config::NavigatorParams;
use crate::edge::{EdgeBehavior, ExpandContext};
use crate::types::{TILE_SIZE, TilePoint, Vec2};
use crate::world::TileWorld;

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

const WALK_DIRECTIONS: [(i32, i32); 6] = [(-1, -1), (-1, 1), (1, 1), (1, -1), (1, 0), (-1, 0)];

#[derive(Clone, Copy, Debug, Default)]
pub struct Walk;

impl EdgeBehavior for Walk {
    fn name(&self) -> &str {
        "walk"
    }

    fn cost(&self, start: TilePoint, end: TilePoint) -> f32 {
        start.chebyshev_distance(end) as f32
    }

    fn expand_reachable(&self, ctx: &ExpandContext<'_>, node: TilePoint, out: &mut Vec<TilePoint>) {
        for (dx, dy) in WALK_DIRECTIONS {
            let mut next = node.offset(dx, dy);
            while ctx.is_valid(next) {
                out.push(next);
                next = next.offset(dx, dy);
            }
        }
    }

    fn min_cost_per_tile(&self, _navigator: &NavigatorParams) -> f32 {
        // A diagonal step: Chebyshev 1 over Manhattan 2.
        0.5
    }
}

// ---------------------------------------------------------------------------
// Fall
// ---------------------------------------------------------------------------

const FALL_COST: f32 = 2.0;
const MAX_DROP_TILES: i32 = 64;
const MIN_DROP_TILES: i32 = 2;

#[derive(Clone, Copy, Debug, Default)]
pub struct Fall;

impl EdgeBehavior for Fall {
    fn name(&self) -> &str {
        "fall"
    }

    fn cost(&self, _start: TilePoint, _end: TilePoint) -> f32 {
        FALL_COST
    }

    fn expand_reachable(&self, ctx: &ExpandContext<'_>, node: TilePoint, out: &mut Vec<TilePoint>) {
        for dx in [-1, 1] {
            for drop in 0..MAX_DROP_TILES {
                let below = node.offset(dx, drop);
                if !ctx.world.in_world(below) {
                    break;
                }
                if ctx.world.tile(below).can_stand_on() {
                    if drop >= MIN_DROP_TILES && ctx.is_valid(below) {
                        out.push(below);
                    }
                    break;
                }
            }
        }
    }

    fn min_cost_per_tile(&self, _navigator: &NavigatorParams) -> f32 {
        FALL_COST / (MAX_DROP_TILES + 1) as f32
    }
}

// ---------------------------------------------------------------------------
// Jump
// ---------------------------------------------------------------------------

const MIN_JUMP_COST: f32 = 4.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct Jump;

impl EdgeBehavior for Jump {
    fn name(&self) -> &str {
        "jump"
    }

    fn cost(&self, start: TilePoint, end: TilePoint) -> f32 {
        MIN_JUMP_COST.max(start.distance_squared(end))
    }

    fn expand_reachable(&self, ctx: &ExpandContext<'_>, node: TilePoint, out: &mut Vec<TilePoint>) {
        let range = ctx.navigator.max_jump;
        let max_x = range.horizontal as i32;
        let max_y = range.vertical as i32;
        let min_dx = ctx.navigator.hitbox.width_in_tiles();

        for dy in -max_y..=max_y {
            for dx in -max_x..=max_x {
                if dx.abs() < min_dx {
                    continue;
                }
                let candidate = node.offset(dx, dy);
                if ctx.is_valid(candidate) && is_jump_possible(ctx.world, ctx.navigator, node, candidate) {
                    out.push(candidate);
                }
            }
        }
    }

    fn min_cost_per_tile(&self, _navigator: &NavigatorParams) -> f32 {
        // max(4, d²) / manhattan is smallest where d² = 4 on a diagonal.
        std::f32::consts::SQRT_2
    }
}

/// Launch point of a jump from `tile`: horizontal center, top edge.
fn jump_anchor(tile: TilePoint) -> Vec2 {
    Vec2::new(
        tile.x as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        tile.y as f32 * TILE_SIZE,
    )
}

fn can_intersect(world: &dyn TileWorld, tile: TilePoint) -> bool {
    world.in_world(tile) && world.tile(tile).can_intersect()
}

/// Simulate the arc from `start` to `end` and check it for collisions.
pub fn is_jump_possible(
    world: &dyn TileWorld,
    navigator: &NavigatorParams,
    start: TilePoint,
    end: TilePoint,
) -> bool {
    let hitbox = navigator.hitbox;
    let from = jump_anchor(start);
    let to = jump_anchor(end);

    let u = navigator.jump_velocity(from, to);
    // Launching downward means jumping into the floor.
    if u.y > 0.0 {
        return false;
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    // Steep drops are falls, not jumps.
    if dy > 0.0 && 2.0 * dx.abs() < dy.abs() {
        return false;
    }

    let g = navigator.gravity();
    let speed = u.length();
    if g <= 0.0 || speed == 0.0 {
        return false;
    }

    let discriminant = u.y * u.y + 2.0 * g * dy;
    if discriminant < 0.0 {
        return false;
    }
    let time_of_flight = (-u.y + discriminant.sqrt()) / g;

    let dt = TILE_SIZE / (speed * std::f32::consts::SQRT_2);
    let height_in_tiles = hitbox.height_in_tiles();
    let lenient_radius = hitbox.width as f32 * 2.0;

    let mut t = dt;
    while t <= time_of_flight {
        let pos = Vec2::new(from.x + u.x * t, from.y + u.y * t + 0.5 * g * t * t);
        t += dt;

        let tile = TilePoint::from_pixels(pos);
        if tile == start || tile == end {
            continue;
        }
        if !can_intersect(world, tile) {
            return false;
        }
        if to.distance(pos) < lenient_radius {
            continue;
        }
        // `tile` is the bottom of the hitbox; the body extends upward.
        if (1..=height_in_tiles).any(|up| !can_intersect(world, tile.offset(0, -up))) {
            return false;
        }
    }
    true
}
