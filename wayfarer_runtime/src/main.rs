// Command-line demo for the Wayfarer runtime.
//
// Loads an ASCII tile map, starts a `PathfindingContext`, registers one
// navigator and asks it for a path, then prints the map with the path drawn
// over it. Handy for eyeballing movement rules against a hand-made level.
//
// Usage:
//   wayfarer-demo [OPTIONS]
//     --map <FILE>       ASCII map: '#' solid, '=' platform (default: built-in level)
//     --config <FILE>    JSON with optional "runtime" and "navigator" sections
//     --start <X,Y>      Tile the navigator stands on (default: 1,9)
//     --goal <X,Y>       Tile to head for; the closest reachable tile is used (default: 20,9)
//     --radius <N>       Navmesh half-size in tiles (default: 32)
//     --out <FILE>       Also write the path as one length-prefixed wire frame
//
// Logging goes through `tracing`; set RUST_LOG (e.g. `RUST_LOG=wayfarer=trace`).

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use wayfarer_nav::presets::closest_to;
use wayfarer_nav::{
    EdgeTypeRegistry, NavMeshParams, NavigatorConfig, NavigatorParams, PathResult, TileGrid, TilePoint, TileShape,
    TileWorld,
};
use wayfarer_runtime::{PathfindingContext, RuntimeConfig};

const DEFAULT_MAP: &str = "\
........................
........................
........................
..............#####.....
........................
........................
.....####...............
........................
........................
#########....###########
#########....###########
";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DemoConfig {
    runtime: RuntimeConfig,
    navigator: NavigatorConfig,
}

struct Args {
    map: Option<PathBuf>,
    config: Option<PathBuf>,
    start: TilePoint,
    goal: TilePoint,
    radius: u32,
    out: Option<PathBuf>,
}

fn main() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    let map = match &args.map {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Failed to read map {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => DEFAULT_MAP.to_string(),
    };
    let config = match &args.config {
        Some(path) => load_config(path),
        None => DemoConfig::default(),
    };

    let grid = Arc::new(TileGrid::from_ascii(&map));
    let registry = Arc::new(EdgeTypeRegistry::with_builtins());
    let world: Arc<dyn TileWorld> = grid.clone();
    let context = match PathfindingContext::new(world, Arc::clone(&registry), config.runtime) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Failed to start pathfinding workers: {e}");
            std::process::exit(1);
        }
    };

    let navigator = NavigatorParams::from_config(&config.navigator, closest_to(args.goal));
    let handle = context
        .create_instance(NavMeshParams::new(args.start, args.radius), navigator)
        .unwrap_or_else(|e| {
            eprintln!("Failed to create navigator: {e}");
            std::process::exit(1);
        });

    let promise = match context.recalculate_path(handle, vec![args.start], |path| {
        tracing::info!(found = path.is_some(), "path callback delivered");
    }) {
        Ok(Some(promise)) => promise,
        Ok(None) => {
            eprintln!("A path query is already running for {handle}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Path request rejected: {e}");
            std::process::exit(1);
        }
    };

    let path = match promise.wait() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Path query did not complete: {e}");
            std::process::exit(1);
        }
    };
    context.dispatch_completions();

    if let Ok(Some(mesh)) = context.navmesh(handle) {
        println!(
            "navmesh: {} nodes, {} edges around {:?}",
            mesh.graph().node_count(),
            mesh.graph().edge_count(),
            mesh.center()
        );
    }

    match &path {
        None => println!("no path from {:?} toward {:?}", args.start, args.goal),
        Some(path) if path.is_already_at_goal() => println!("already at the goal"),
        Some(path) => {
            for edge in path.edges() {
                let kind = registry.get(edge.edge_type).map(|b| b.name()).unwrap_or("?");
                println!("  {kind:>5} {:?} -> {:?}", edge.from, edge.to);
            }
        }
    }
    println!();
    print!("{}", render(&grid, &args, path.as_ref()));

    if let (Some(out), Some(path)) = (&args.out, &path) {
        if let Err(e) = write_frame_file(out, path) {
            eprintln!("Failed to write {}: {e}", out.display());
            std::process::exit(1);
        }
        println!("wrote {}", out.display());
    }

    context.dispose_instance(handle);
    context.shutdown();
}

fn load_config(path: &PathBuf) -> DemoConfig {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read config {}: {e}", path.display());
        std::process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Invalid config {}: {e}", path.display());
        std::process::exit(1);
    })
}

fn write_frame_file(path: &PathBuf, result: &PathResult) -> Result<(), wayfarer_protocol::WireError> {
    let mut file = std::fs::File::create(path)?;
    wayfarer_protocol::write_path(&mut file, result)
}

/// The map with `S`/`G` for the endpoints and `*` for every tile the path
/// stands on.
fn render(grid: &TileGrid, args: &Args, path: Option<&PathResult>) -> String {
    let bounds = grid.bounds();
    let on_path: Vec<TilePoint> = path
        .map(|p| p.edges().iter().map(|e| e.to).collect())
        .unwrap_or_default();
    let mut out = String::new();
    for y in 0..bounds.height as i32 {
        for x in 0..bounds.width as i32 {
            let tile = TilePoint::new(x, y);
            let ch = if tile == args.start {
                'S'
            } else if tile == args.goal {
                'G'
            } else if on_path.contains(&tile) {
                '*'
            } else {
                match grid.get(tile) {
                    TileShape::Solid => '#',
                    TileShape::Platform => '=',
                    _ => '.',
                }
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

fn parse_point(value: Option<&String>, flag: &str) -> TilePoint {
    let parsed = value.and_then(|s| {
        let (x, y) = s.split_once(',')?;
        Some(TilePoint::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    });
    parsed.unwrap_or_else(|| {
        eprintln!("{flag} requires a tile as X,Y");
        std::process::exit(1);
    })
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let mut parsed = Args {
        map: None,
        config: None,
        start: TilePoint::new(1, 9),
        goal: TilePoint::new(20, 9),
        radius: 32,
        out: None,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--map" => {
                i += 1;
                parsed.map = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--map requires a file path");
                    std::process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                parsed.config = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--config requires a file path");
                    std::process::exit(1);
                });
            }
            "--start" => {
                i += 1;
                parsed.start = parse_point(args.get(i), "--start");
            }
            "--goal" => {
                i += 1;
                parsed.goal = parse_point(args.get(i), "--goal");
            }
            "--radius" => {
                i += 1;
                parsed.radius = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--radius requires a non-negative integer");
                    std::process::exit(1);
                });
            }
            "--out" => {
                i += 1;
                parsed.out = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--out requires a file path");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                println!(
                    "Usage: wayfarer-demo [--map FILE] [--config FILE] [--start X,Y] [--goal X,Y] [--radius N] [--out FILE]"
                );
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    parsed
}
