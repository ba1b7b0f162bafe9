// Runtime tuning parameters.
//
// Every field has a default, and `#[serde(default)]` lets a JSON file
// override any subset of them, so a host can ship a partial config.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wayfarer_nav::HeuristicMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads. `None` means half the available cores, at least one.
    pub worker_count: Option<usize>,
    /// Maximum simultaneously live handles.
    pub max_instances: usize,
    /// How long an idle worker blocks on the job queues before rechecking
    /// for shutdown, and how long a path job waits on a navmesh build
    /// between attempts to help with queued builds.
    pub idle_wait_ms: u64,
    /// A* heuristic used for every path query.
    pub heuristic: HeuristicMode,
    /// Build adjacency lists on the rayon pool.
    pub parallel_adjacency: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            max_instances: 2048,
            idle_wait_ms: 5,
            heuristic: HeuristicMode::Admissible,
            parallel_adjacency: false,
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn resolved_worker_count(&self) -> usize {
        self.worker_count
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get() / 2)
                    .unwrap_or(1)
            })
            .max(1)
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms.max(1))
    }
}
