// End-to-end tests for the request processor.
//
// Each test starts a real `PathfindingContext` with its own worker threads.
// Tests that need to observe a build while it is still running use
// `GatedWorld`, a tile world whose `tile()` reads block until the test
// opens the gate, so "in flight" is a state the test controls rather than a
// timing accident. Path queries are held the same way by an end selector
// that waits on a `Gate`.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use wayfarer_nav::presets::closest_to;
use wayfarer_nav::{
    EdgeTypeRegistry, Hitbox, NavMeshParams, NavigatorConfig, NavigatorParams, PathResult, TileGrid, TilePoint,
    TileShape, TileWorld, WorldBounds,
};
use wayfarer_runtime::{Handle, PathfindingContext, PathfindingError, RequestError, RuntimeConfig};

/// Flat floor on row 3 with three empty rows above it.
const FLOOR: &str = "\
........
........
........
########
";

const START: TilePoint = TilePoint::new(1, 3);

/// Blocks every caller of `wait` until `open` is called.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
    entered: AtomicBool,
}

impl Gate {
    fn wait(&self) {
        self.entered.store(true, Ordering::SeqCst);
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }

    fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }
}

struct GatedWorld {
    grid: TileGrid,
    gate: Gate,
}

impl GatedWorld {
    fn closed(map: &str) -> Arc<Self> {
        Arc::new(Self {
            grid: TileGrid::from_ascii(map),
            gate: Gate::default(),
        })
    }

    fn open(&self) {
        self.gate.open();
    }
}

impl TileWorld for GatedWorld {
    fn bounds(&self) -> WorldBounds {
        self.grid.bounds()
    }

    fn tile(&self, tile: TilePoint) -> TileShape {
        self.gate.wait();
        self.grid.get(tile)
    }
}

fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        worker_count: Some(2),
        idle_wait_ms: 2,
        ..RuntimeConfig::default()
    }
}

fn context_over(world: Arc<dyn TileWorld>, config: RuntimeConfig) -> PathfindingContext {
    PathfindingContext::new(world, Arc::new(EdgeTypeRegistry::with_builtins()), config).unwrap()
}

fn floor_context() -> PathfindingContext {
    context_over(Arc::new(TileGrid::from_ascii(FLOOR)), test_config())
}

fn navigator(goal: TilePoint) -> NavigatorParams {
    NavigatorParams::from_config(
        &NavigatorConfig {
            hitbox: Hitbox::new(16, 16),
            ..NavigatorConfig::default()
        },
        closest_to(goal),
    )
}

fn spawn(ctx: &PathfindingContext, goal: TilePoint) -> Handle {
    ctx.create_instance(NavMeshParams::new(START, 8), navigator(goal)).unwrap()
}

// ---------------------------------------------------------------------------
// Navmesh track
// ---------------------------------------------------------------------------

#[test]
fn unforced_requests_share_one_build() {
    let world = GatedWorld::closed(FLOOR);
    let ctx = context_over(world.clone(), test_config());
    let handle = spawn(&ctx, START);

    let first = ctx.recalculate_navmesh(handle, None).unwrap();
    let second = ctx.recalculate_navmesh(handle, None).unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(ctx.navmesh(handle).unwrap().map(|_| ()), None);

    world.open();
    let a = first.wait().unwrap();
    let b = second.wait().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    let installed = ctx.navmesh(handle).unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &installed));
}

#[test]
fn forced_rebuild_moves_the_region() {
    let ctx = floor_context();
    let handle = ctx
        .create_instance(NavMeshParams::new(START, 1), navigator(START))
        .unwrap();
    let moved = TilePoint::new(6, 3);
    let rebuilt = ctx.recalculate_navmesh(handle, Some(moved)).unwrap();
    let mesh = rebuilt.wait().unwrap();
    assert_eq!(mesh.center(), moved);
    assert!(mesh.is_valid_node(TilePoint::new(7, 3)));
    assert!(!mesh.is_valid_node(START));

    let installed = ctx.navmesh(handle).unwrap().unwrap();
    assert_eq!(installed.center(), moved);
    assert!(ctx.is_valid_node(handle, TilePoint::new(5, 3)).unwrap());
    assert!(!ctx.is_valid_node(handle, START).unwrap());
}

#[test]
fn disposing_mid_build_cancels_it() {
    let world = GatedWorld::closed(FLOOR);
    let ctx = context_over(world.clone(), test_config());
    let handle = spawn(&ctx, START);
    let pending = ctx.recalculate_navmesh(handle, None).unwrap();

    ctx.dispose_instance(handle);
    world.open();

    assert_eq!(pending.wait().unwrap_err(), RequestError::Cancelled);
    assert_eq!(ctx.navmesh(handle).unwrap_err(), PathfindingError::InvalidHandle(handle));
}

#[test]
fn panicking_validity_fails_only_that_build() {
    let ctx = floor_context();
    let params = NavMeshParams::new(START, 2).with_validity(|_, _, _| panic!("validity exploded"));
    let broken = ctx.create_instance(params, navigator(START)).unwrap();
    match ctx.recalculate_navmesh(broken, None).unwrap().wait() {
        Err(RequestError::Failed(message)) => assert!(message.contains("validity exploded")),
        other => panic!("expected a failed build, got {other:?}"),
    }
    assert!(ctx.navmesh(broken).unwrap().is_none());

    // The pool keeps serving other handles.
    let healthy = spawn(&ctx, START);
    let mesh = ctx.recalculate_navmesh(healthy, None).unwrap().wait().unwrap();
    assert!(mesh.is_valid_node(START));
}

// ---------------------------------------------------------------------------
// Path track
// ---------------------------------------------------------------------------

#[test]
fn path_is_planned_and_callback_dispatched_on_caller_thread() {
    let ctx = floor_context();
    let goal = TilePoint::new(6, 3);
    let handle = spawn(&ctx, goal);

    let delivered: Arc<Mutex<Vec<Option<PathResult>>>> = Arc::default();
    let sink = Arc::clone(&delivered);
    let promise = ctx
        .recalculate_path(handle, vec![START], move |path| sink.lock().push(path))
        .unwrap()
        .unwrap();

    let path = promise.wait().unwrap().unwrap();
    assert!(!path.is_empty());
    assert!(path.edges().windows(2).all(|pair| pair[0].to == pair[1].from));
    assert_eq!(path.edges().first().map(|e| e.from), Some(START));
    assert_eq!(path.edges().last().map(|e| e.to), Some(goal));

    assert!(delivered.lock().is_empty(), "callbacks wait for dispatch");
    assert_eq!(ctx.dispatch_completions(), 1);
    assert_eq!(delivered.lock().as_slice(), &[Some(path)]);
    assert_eq!(ctx.dispatch_completions(), 0);
}

#[test]
fn standing_on_the_goal_reports_already_there() {
    let ctx = floor_context();
    let handle = spawn(&ctx, START);
    let delivered: Arc<Mutex<Option<Option<PathResult>>>> = Arc::default();
    let sink = Arc::clone(&delivered);
    let promise = ctx
        .recalculate_path(handle, vec![START], move |path| *sink.lock() = Some(path))
        .unwrap()
        .unwrap();

    let mut path = promise.wait().unwrap().unwrap();
    assert!(path.is_already_at_goal());
    assert!(!path.has_path());
    assert!(path.advance());

    ctx.dispatch_completions();
    let seen = delivered.lock().clone().unwrap().unwrap();
    assert!(seen.is_already_at_goal());
}

#[test]
fn unusable_starts_resolve_to_no_path() {
    let ctx = floor_context();
    let handle = spawn(&ctx, START);
    let promise = ctx
        .recalculate_path(handle, vec![TilePoint::new(1, 0)], |_| {})
        .unwrap()
        .unwrap();
    assert_eq!(promise.wait(), Ok(None));
}

#[test]
fn second_path_request_is_dropped_while_one_is_in_flight() {
    let world = GatedWorld::closed(FLOOR);
    let ctx = context_over(world.clone(), test_config());
    let goal = TilePoint::new(4, 3);
    let handle = spawn(&ctx, goal);

    let first = ctx
        .recalculate_path(handle, vec![START], |_| {})
        .unwrap()
        .expect("first request is accepted");
    assert!(ctx.is_pathfinding(handle).unwrap());
    assert!(ctx.recalculate_path(handle, vec![START], |_| {}).unwrap().is_none());

    world.open();
    let path = first.wait().unwrap().unwrap();
    assert_eq!(path.edges().last().map(|e| e.to), Some(goal));
    assert!(!ctx.is_pathfinding(handle).unwrap());
    assert!(ctx.recalculate_path(handle, vec![START], |_| {}).unwrap().is_some());
}

#[test]
fn disposing_mid_search_cancels_the_query_and_skips_its_callback() {
    let mut grid = TileGrid::new(64, 16);
    grid.fill_row(15, 0, 63, TileShape::Solid);
    let ctx = context_over(Arc::new(grid), test_config());
    let start = TilePoint::new(1, 15);
    let goal = TilePoint::new(62, 15);

    let gate = Arc::new(Gate::default());
    let held = Arc::clone(&gate);
    let pick = closest_to(goal);
    let navigator = NavigatorParams::from_config(
        &NavigatorConfig {
            hitbox: Hitbox::new(16, 16),
            ..NavigatorConfig::default()
        },
        move |area| {
            held.wait();
            pick(area)
        },
    );
    let handle = ctx.create_instance(NavMeshParams::new(start, 64), navigator).unwrap();
    ctx.recalculate_navmesh(handle, None).unwrap().wait().unwrap();
    assert!(ctx.navmesh(handle).unwrap().is_some());

    let delivered = Arc::new(AtomicBool::new(false));
    let sink = Arc::clone(&delivered);
    let promise = ctx
        .recalculate_path(handle, vec![start], move |_| sink.store(true, Ordering::SeqCst))
        .unwrap()
        .unwrap();

    // The reachability scan is done and the worker is parked in the end
    // selector, with A* still to run.
    while !gate.entered() {
        thread::sleep(Duration::from_millis(1));
    }
    assert!(ctx.is_pathfinding(handle).unwrap());

    ctx.dispose_instance(handle);
    gate.open();

    assert_eq!(promise.wait(), Err(RequestError::Cancelled));
    assert_eq!(ctx.dispatch_completions(), 0);
    assert!(!delivered.load(Ordering::SeqCst));
}

#[test]
fn empty_start_list_is_rejected() {
    let ctx = floor_context();
    let handle = spawn(&ctx, START);
    assert_eq!(
        ctx.recalculate_path(handle, Vec::new(), |_| {}).unwrap_err(),
        PathfindingError::EmptyStarts
    );
    assert!(!ctx.is_pathfinding(handle).unwrap());
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[test]
fn reused_slots_reject_stale_handles() {
    let ctx = floor_context();
    let old = spawn(&ctx, START);
    ctx.dispose_instance(old);
    let new = spawn(&ctx, START);

    assert_eq!(old.index(), new.index());
    assert_ne!(old, new);
    assert_eq!(ctx.is_pathfinding(old).unwrap_err(), PathfindingError::InvalidHandle(old));
    assert!(ctx.is_pathfinding(new).is_ok());
    assert_eq!(
        ctx.is_valid_node(Handle::INVALID, START).unwrap_err(),
        PathfindingError::InvalidHandle(Handle::INVALID)
    );
}

#[test]
fn dispose_is_idempotent() {
    let ctx = floor_context();
    let handle = spawn(&ctx, START);
    ctx.dispose_instance(handle);
    ctx.dispose_instance(handle);
    ctx.dispose_instance(Handle::INVALID);
    assert_eq!(ctx.live_instances(), 0);
}

#[test]
fn pool_exhaustion_is_reported() {
    let ctx = context_over(
        Arc::new(TileGrid::from_ascii(FLOOR)),
        RuntimeConfig {
            max_instances: 2,
            ..test_config()
        },
    );
    let first = spawn(&ctx, START);
    spawn(&ctx, START);
    assert_eq!(
        ctx.create_instance(NavMeshParams::new(START, 8), navigator(START))
            .unwrap_err(),
        PathfindingError::InstancePoolExhausted { max: 2 }
    );
    ctx.dispose_instance(first);
    assert!(ctx.create_instance(NavMeshParams::new(START, 8), navigator(START)).is_ok());
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[test]
fn shutdown_cancels_pending_work_and_rejects_new_calls() {
    let world = GatedWorld::closed(FLOOR);
    let ctx = context_over(world.clone(), test_config());
    let handle = spawn(&ctx, START);
    let pending = ctx.recalculate_navmesh(handle, None).unwrap();
    let path = ctx.recalculate_path(handle, vec![START], |_| {}).unwrap().unwrap();

    thread::scope(|s| {
        // Workers are blocked inside the world; release them only once the
        // context has stopped accepting work.
        s.spawn(|| {
            while !ctx.is_shut_down() {
                thread::sleep(Duration::from_millis(1));
            }
            world.open();
        });
        ctx.shutdown();
    });

    assert_eq!(pending.wait().unwrap_err(), RequestError::Cancelled);
    assert_eq!(path.wait().unwrap_err(), RequestError::Cancelled);
    assert_eq!(ctx.dispatch_completions(), 0);
    assert_eq!(
        ctx.create_instance(NavMeshParams::new(START, 8), navigator(START))
            .unwrap_err(),
        PathfindingError::ShutDown
    );
    assert_eq!(ctx.recalculate_navmesh(handle, None).unwrap_err(), PathfindingError::ShutDown);
    assert_eq!(ctx.live_instances(), 0);

    // A second shutdown (and the one from Drop) is a no-op.
    ctx.shutdown();
}
